// Local crates
use crate::{
    error::InputError,
    helpers::shutdown::Shutdown,
    input::stream::StreamInput,
    types::message::Message,
};

// External crates
use futures::StreamExt;
use serde::{Deserialize, Serialize};

/// Configuration of the `memory` input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Messages to emit, in order, each as a single part message
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Emit the configured messages then exhaust. A fresh input built from the
/// same config emits them all again.
pub fn new_memory(conf: &MemoryConfig) -> Result<StreamInput, InputError> {
    let messages: Vec<std::io::Result<Message>> = conf
        .messages
        .iter()
        .cloned()
        .map(|m| Ok(Message::from(m)))
        .collect();

    StreamInput::spawn("memory", Shutdown::new(), futures::stream::iter(messages).boxed())
}
