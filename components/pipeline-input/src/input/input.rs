// Local crates
use crate::{
    condition::condition::new_condition,
    error::{InputError, TimeoutError},
    helpers::shutdown::Shutdown,
    input::{
        file::{FileConfig, new_file},
        memory::{MemoryConfig, new_memory},
        read_until::{ReadUntil, ReadUntilConfig},
        stdin::{StdinConfig, new_stdin},
    },
    types::transaction::Transaction,
};

// External crates
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use tokio::{runtime::Handle, sync::mpsc};

/// Lifecycle contract every input satisfies, and the only way other stages
/// interact with one.
///
/// - `recv` yields transactions until the input has no more data, then
/// yields `None` (exhaustion, not an error). Once close is requested it
/// yields `None` straight away and transactions still buffered are dropped
/// unanswered, so nothing is delivered after the input confirmed it closed.
/// - `close_async` asks the input to stop, it is idempotent and returns
/// immediately.
/// - `wait_for_close` waits for the input to confirm it stopped and only
/// fails when the deadline elapses first.
#[async_trait]
pub trait Input: Send + Sync + fmt::Debug {
    /// Next transaction, `None` once the input is exhausted or closing
    async fn recv(&mut self) -> Option<Transaction>;

    /// Request the input to close
    fn close_async(&self);

    /// Wait until the input confirmed it closed
    async fn wait_for_close(&self, timeout: Duration) -> Result<(), TimeoutError>;
}

/// Input configuration, selected by its `type` field.
///
/// ```toml
/// [input]
/// type = "file"
/// path = "/var/log/app.log"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputConfig {
    /// Read lines from a file
    File(FileConfig),
    /// Read lines from stdin
    Stdin(StdinConfig),
    /// Emit a fixed list of messages
    Memory(MemoryConfig),
    /// Wrap another input until a condition is met
    ReadUntil(ReadUntilConfig),
}

impl InputConfig {
    /// Type name as written in configuration
    pub fn kind(&self) -> &'static str {
        match self {
            InputConfig::File(_) => "file",
            InputConfig::Stdin(_) => "stdin",
            InputConfig::Memory(_) => "memory",
            InputConfig::ReadUntil(_) => "read_until",
        }
    }
}

/// Construct an input from its configuration. The input starts producing as
/// soon as it is returned.
pub fn new_input(conf: &InputConfig) -> Result<Box<dyn Input>, InputError> {
    let input: Box<dyn Input> = match conf {
        InputConfig::File(c) => Box::new(new_file(c)?),
        InputConfig::Stdin(c) => Box::new(new_stdin(c)?),
        InputConfig::Memory(c) => Box::new(new_memory(c)?),
        InputConfig::ReadUntil(c) => Box::new(ReadUntil::new(c)?),
    };
    Ok(input)
}

/// Check a configuration without starting anything: every `read_until`
/// has an input to wrap and every condition constructs. Files are not opened.
pub fn validate_input_config(conf: &InputConfig) -> Result<(), InputError> {
    let InputConfig::ReadUntil(c) = conf else {
        return Ok(());
    };
    let child = c.input.as_deref().ok_or(InputError::MissingChild)?;
    validate_input_config(child).map_err(|e| InputError::Child {
        kind: child.kind(),
        source: Box::new(e),
    })?;
    new_condition(&c.condition).map_err(|source| InputError::Condition {
        kind: c.condition.kind(),
        source,
    })?;
    Ok(())
}

/// Receive from an input's output channel unless close was requested. On
/// close the channel is shut and its buffer discarded.
pub(crate) async fn recv_until_close(
    transactions: &mut mpsc::Receiver<Transaction>,
    shutdown: &Shutdown,
) -> Option<Transaction> {
    if shutdown.is_running() {
        tokio::select! {
            biased;
            _ = shutdown.close_requested() => {},
            next = transactions.recv() => return next,
        }
    }

    transactions.close();
    while let Ok(tran) = transactions.try_recv() {
        tracing::debug!(
            message_size = tran.payload.size(),
            "Dropping transaction buffered before close"
        );
    }
    None
}

/// Handle of the runtime input workers are spawned on
pub(crate) fn runtime() -> Result<Handle, InputError> {
    Handle::try_current().map_err(|_| InputError::Runtime)
}
