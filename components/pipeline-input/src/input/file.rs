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
use std::{future::Future, path::PathBuf, pin::Pin};
use tokio::{fs::File, io::BufReader};
use tracing::instrument;

/// Configuration of the `file` input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// File to read
    pub path: PathBuf,
    /// Treat blank line separated blocks as multipart messages
    #[serde(default)]
    pub multipart: bool,
}

/// Open the configured file and start reading it. The file is opened here so
/// a missing file is reported to the caller instead of closing the input.
#[instrument(
    name = "pipeline_input::file::create",
    target = "input::file",
    skip_all,
    fields(path = %conf.path.display()),
    level = "debug"
)]
pub fn new_file(conf: &FileConfig) -> Result<StreamInput, InputError> {
    let file = std::fs::File::open(&conf.path).map_err(|source| {
        tracing::error!(error = %source, "Failed to open file input");
        InputError::Open {
            path: conf.path.clone(),
            source,
        }
    })?;

    let shutdown = Shutdown::new();
    let stop: Pin<Box<dyn Future<Output = ()> + Send>> =
        Box::pin(shutdown.close_token().cancelled_owned());
    let reader = BufReader::new(File::from_std(file).read_until_future(stop));

    StreamInput::spawn("file", shutdown, frame_lines(reader, conf.multipart))
}
