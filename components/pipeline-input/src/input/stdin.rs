// Local crates
use crate::{
    error::InputError,
    helpers::shutdown::Shutdown,
    input::{
        async_read::StopReadExt,
        stream::{StreamInput, frame_lines},
    },
};

// External crates
use serde::{Deserialize, Serialize};
use std::{future::Future, pin::Pin};
use tokio::io::BufReader;

/// Configuration of the `stdin` input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdinConfig {
    /// Treat blank line separated blocks as multipart messages
    #[serde(default)]
    pub multipart: bool,
}

/// Start reading lines from stdin, the input exhausts at EOF
pub fn new_stdin(conf: &StdinConfig) -> Result<StreamInput, InputError> {
    let shutdown = Shutdown::new();
    let stop: Pin<Box<dyn Future<Output = ()> + Send>> =
        Box::pin(shutdown.close_token().cancelled_owned());
    let reader = BufReader::new(tokio::io::stdin().read_until_future(stop));

    StreamInput::spawn("stdin", shutdown, frame_lines(reader, conf.multipart))
}
