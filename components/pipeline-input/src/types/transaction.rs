//! Transaction/acknowledgement protocol.
//!
//! Every producer/consumer pair in the pipeline talks in `Transaction`s: a
//! payload paired with a one-shot acknowledgement channel.
//!
//! ```text
//! producer ──Transaction{payload, response}──► consumer
//!    ▲                                            │
//!    └──────────────── Response ◄─────────────────┘
//! ```
//!
//! ## Rules
//! - The producer creates the acknowledgement channel ([`Transaction::new`]).
//! - Whoever receives a transaction owes **exactly one** [`Response`]. A
//!   oneshot sender is consumed by `send`, so writing twice cannot compile.
//! - Dropping a transaction without responding closes the channel, the
//!   producer observes that as a `RecvError` and decides what to do with it.

// Local crates
use crate::types::message::Message;

// External crates
use tokio::sync::oneshot;

/// Sending half of a transaction's acknowledgement channel
pub type ResponseSender = oneshot::Sender<Response>;

/// Receiving half of a transaction's acknowledgement channel
pub type ResponseReceiver = oneshot::Receiver<Response>;

/// Outcome of a delivered transaction. No error means the message was
/// accepted, an error means it was rejected (nack) and carries the cause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    error: Option<String>,
}

impl Response {
    /// Accept the message
    pub fn ack() -> Self {
        Self { error: None }
    }

    /// Reject the message with a cause
    pub fn nack(cause: impl Into<String>) -> Self {
        Self {
            error: Some(cause.into()),
        }
    }

    /// The rejection cause, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the message was accepted
    pub fn is_ack(&self) -> bool {
        self.error.is_none()
    }
}

/// A message payload paired with the channel its single [`Response`] must be
/// written to.
#[derive(Debug)]
pub struct Transaction {
    /// The message being delivered
    pub payload: Message,
    /// Where the receiver writes its response
    pub response: ResponseSender,
}

impl Transaction {
    /// Create a transaction along with the receiver its producer awaits the
    /// response on.
    pub fn new(payload: Message) -> (Self, ResponseReceiver) {
        let (response, rx) = oneshot::channel();
        (Self { payload, response }, rx)
    }

    /// Split into payload and acknowledgement channel
    pub fn into_parts(self) -> (Message, ResponseSender) {
        (self.payload, self.response)
    }

    /// Write the response for this transaction. Returns the response back
    /// when the producer is no longer waiting for it.
    pub fn respond(self, response: Response) -> Result<(), Response> {
        self.response.send(response)
    }

    /// Shorthand for `respond(Response::ack())`
    pub fn ack(self) -> Result<(), Response> {
        self.respond(Response::ack())
    }

    /// Shorthand for `respond(Response::nack(cause))`
    pub fn nack(self, cause: impl Into<String>) -> Result<(), Response> {
        self.respond(Response::nack(cause))
    }
}
