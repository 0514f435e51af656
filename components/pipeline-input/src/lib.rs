//! Pipeline inputs and the `read_until` source decorator.
//!
//! An [`Input`](input::input::Input) produces [`Transaction`](types::transaction::Transaction)s
//! on a channel and is driven by `close_async` / `wait_for_close`. The
//! `read_until` input wraps another input and ends the stream once a message
//! satisfying its [`Condition`](condition::condition::Condition) has been
//! accepted downstream.

pub mod cli;
pub mod condition;
pub mod error;
pub mod helpers;
pub mod input;
pub mod instrumentation;
pub mod metrics;
pub mod runtime;
pub mod types;

pub use error::{ConditionError, InputError, TimeoutError};
pub use input::input::{Input, InputConfig, new_input};
pub use input::read_until::{ReadUntil, ReadUntilConfig};
pub use types::{message::Message, transaction::{Response, Transaction}};
