//! # read_until: wrap an input until a condition is met.
//!
//! Reads from a wrapped input and checks a condition on each message. When the
//! condition is true the message is sent downstream and, once downstream
//! accepts it, the stream ends and the wrapped input is closed. Use this to
//! define inputs where the stream should end once a certain message appears.
//!
//! Some inputs close themselves, e.g. a `file` input reaching the end of its
//! file. By default `read_until` closes with it. With `restart_input = true`
//! the wrapped input is recreated every time it closes, until the condition
//! is met.
//!
//! ## State machine
//! ```text
//!                 ┌──────────── restart_input ────────────┐
//!                 ▼                                       │
//! new ──► Running ──── wrapped input closed ────► Exhausted ──► Closed
//!           │  ▲                                      (no restart / restart failed)
//!           │  └── condition false: forward unchanged
//!           │  └── condition true, final response rejected
//!           │
//!           ├── condition true, final response accepted ──► ShuttingDown ──► Closed
//!           └── close requested ──────────────────────────► ShuttingDown ──► Closed
//! ```
//!
//! ## Rules
//! - One worker task owns the wrapped input, no other code touches it.
//! - Transactions are forwarded in the order the wrapped input produced them.
//! - The condition is checked once per transaction read from the wrapped input.
//! - A candidate final message is forwarded with an intercepted response
//!   channel; its response is relayed verbatim to the wrapped input.
//! - A rejected final message is **not** resent here, the stream only ends
//!   cleanly if the wrapped input redelivers it.
//! - Every blocking point races the close signal.

// Local crates
use crate::{
    condition::condition::{Condition, ConditionConfig, new_condition},
    error::{InputError, TimeoutError},
    helpers::shutdown::Shutdown,
    input::input::{Input, InputConfig, new_input, recv_until_close, runtime},
    metrics::metrics::{
        READ_UNTIL_FINAL_PROPAGATED, READ_UNTIL_FINAL_RESPONSE_ERROR,
        READ_UNTIL_FINAL_RESPONSE_SENT, READ_UNTIL_INPUT_CLOSED, READ_UNTIL_PROPAGATED,
        READ_UNTIL_RECEIVED, READ_UNTIL_RESTART_ERROR, READ_UNTIL_RESTART_SUCCESS,
        READ_UNTIL_RUNNING,
    },
    types::transaction::{Response, Transaction},
};

// External crates
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::instrument;

/// How long each wait for the wrapped input's close confirmation lasts
/// before it is logged and retried.
const CLOSE_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Cause relayed upstream when downstream drops a final message unanswered.
const DROPPED_RESPONSE: &str = "transaction dropped without a response";

/// Configuration of the `read_until` input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadUntilConfig {
    /// Input to wrap, required
    #[serde(default, alias = "wrapped_input")]
    pub input: Option<Box<InputConfig>>,
    /// Recreate the wrapped input whenever it closes itself
    #[serde(default)]
    pub restart_input: bool,
    /// Condition that ends the stream
    pub condition: ConditionConfig,
}

/// Why the worker loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// The final message was accepted downstream
    ConditionMet,
    /// The wrapped input closed and restarts are disabled
    Exhausted,
    /// The wrapped input closed and could not be recreated
    RestartFailed,
    /// `close_async` was called
    CloseRequested,
    /// The `ReadUntil` handle, and with it the output receiver, was dropped
    OutputDropped,
}

/// Handle on a running `read_until` input.
///
/// Mirrors every other [`Input`] so it can itself be wrapped. Dropping the
/// handle requests close.
#[derive(Debug)]
pub struct ReadUntil {
    transactions: mpsc::Receiver<Transaction>,
    shutdown: Shutdown,
}

impl ReadUntil {
    /// Build the wrapped input and the condition, then spawn the worker.
    ///
    /// Fails when no input is configured, or when the wrapped input or the
    /// condition fail to construct. Nothing is left running on failure.
    #[instrument(
        name = "pipeline_input::read_until::create",
        target = "input::read_until",
        skip_all,
        level = "debug"
    )]
    pub fn new(conf: &ReadUntilConfig) -> Result<Self, InputError> {
        let Some(input_conf) = conf.input.as_deref() else {
            tracing::error!("read_until configured without an input to wrap");
            return Err(InputError::MissingChild);
        };
        let handle = runtime()?;

        let wrapped = new_input(input_conf).map_err(|e| InputError::Child {
            kind: input_conf.kind(),
            source: Box::new(e),
        })?;

        let cond = match new_condition(&conf.condition) {
            Ok(cond) => cond,
            Err(source) => {
                wrapped.close_async();
                return Err(InputError::Condition {
                    kind: conf.condition.kind(),
                    source,
                });
            }
        };

        let (output, transactions) = mpsc::channel(1);
        let shutdown = Shutdown::new();

        let worker = Worker {
            input_conf: input_conf.clone(),
            restart_input: conf.restart_input,
            wrapped: Some(wrapped),
            cond,
            output,
            shutdown: shutdown.clone(),
        };

        tracing::debug!(
            input = input_conf.kind(),
            condition = conf.condition.kind(),
            restart_input = conf.restart_input,
            "Spawning read_until worker"
        );
        handle.spawn(worker.run());

        Ok(Self {
            transactions,
            shutdown,
        })
    }
}

#[async_trait]
impl Input for ReadUntil {
    async fn recv(&mut self) -> Option<Transaction> {
        recv_until_close(&mut self.transactions, &self.shutdown).await
    }

    fn close_async(&self) {
        if self.shutdown.request_close() {
            tracing::debug!("Close requested for read_until input");
        }
    }

    async fn wait_for_close(&self, timeout: Duration) -> Result<(), TimeoutError> {
        self.shutdown.wait_for_close(timeout).await
    }
}

impl Drop for ReadUntil {
    fn drop(&mut self) {
        self.shutdown.request_close();
    }
}

/// State owned by the single worker task
#[derive(Debug)]
struct Worker {
    input_conf: InputConfig,
    restart_input: bool,
    wrapped: Option<Box<dyn Input>>,
    cond: Box<dyn Condition>,
    output: mpsc::Sender<Transaction>,
    shutdown: Shutdown,
}

impl Worker {
    #[instrument(
        name = "pipeline_input::read_until::worker",
        target = "input::read_until",
        skip_all,
        level = "debug"
    )]
    async fn run(mut self) {
        READ_UNTIL_RUNNING.inc();

        let exit = self.read_loop().await;
        match exit {
            Exit::RestartFailed => tracing::error!(exit = ?exit, "read_until stopping"),
            _ => tracing::debug!(exit = ?exit, "read_until stopping"),
        }

        self.cleanup().await;
    }

    async fn read_loop(&mut self) -> Exit {
        while self.shutdown.is_running() {
            let wrapped = match self.wrapped.take() {
                Some(wrapped) => wrapped,
                None => match self.restart() {
                    Ok(wrapped) => wrapped,
                    Err(exit) => return exit,
                },
            };
            let wrapped = self.wrapped.insert(wrapped);

            let next = tokio::select! {
                biased;
                _ = self.shutdown.close_requested() => return Exit::CloseRequested,
                next = wrapped.recv() => next,
            };

            let Some(tran) = next else {
                tracing::debug!("Wrapped input closed");
                READ_UNTIL_INPUT_CLOSED.inc();
                self.wrapped = None;
                continue;
            };
            READ_UNTIL_RECEIVED.inc();

            if !self.cond.check(&tran.payload) {
                if let Err(exit) = self.forward(tran).await {
                    return exit;
                }
                READ_UNTIL_PROPAGATED.inc();
                continue;
            }

            match self.intercept(tran).await {
                Ok(true) => return Exit::ConditionMet,
                Ok(false) => continue,
                Err(exit) => return exit,
            }
        }

        Exit::CloseRequested
    }

    /// Recreate the wrapped input after it exhausted itself
    fn restart(&self) -> Result<Box<dyn Input>, Exit> {
        if !self.restart_input {
            return Err(Exit::Exhausted);
        }

        match new_input(&self.input_conf) {
            Ok(wrapped) => {
                READ_UNTIL_RESTART_SUCCESS.inc();
                tracing::debug!("Recreated wrapped input");
                Ok(wrapped)
            }
            Err(e) => {
                READ_UNTIL_RESTART_ERROR.inc();
                tracing::error!(
                    error = %e,
                    error_label = e.as_label(),
                    "Failed to recreate wrapped input"
                );
                Err(Exit::RestartFailed)
            }
        }
    }

    async fn forward(&self, tran: Transaction) -> Result<(), Exit> {
        tokio::select! {
            biased;
            _ = self.shutdown.close_requested() => Err(Exit::CloseRequested),
            sent = self.output.send(tran) => sent.map_err(|_| Exit::OutputDropped),
        }
    }

    /// Forward a candidate final message with an intercepted response channel
    /// and relay the response. Returns whether downstream accepted it.
    async fn intercept(&self, tran: Transaction) -> Result<bool, Exit> {
        let (payload, original) = tran.into_parts();
        let (intercepted, response) = Transaction::new(payload);

        self.forward(intercepted).await?;
        READ_UNTIL_FINAL_PROPAGATED.inc();

        let res = tokio::select! {
            biased;
            _ = self.shutdown.close_requested() => return Err(Exit::CloseRequested),
            res = response => res.unwrap_or_else(|_| Response::nack(DROPPED_RESPONSE)),
        };
        let accepted = res.is_ack();

        // A oneshot send never blocks, there is nothing to race here.
        if original.send(res).is_err() {
            tracing::warn!("Wrapped input stopped waiting for the final response");
        }
        READ_UNTIL_FINAL_RESPONSE_SENT.inc();

        if !accepted {
            READ_UNTIL_FINAL_RESPONSE_ERROR.inc();
            tracing::debug!("Final message rejected downstream, continuing to read");
        }
        Ok(accepted)
    }

    #[instrument(
        name = "pipeline_input::read_until::cleanup",
        target = "input::read_until",
        skip_all,
        level = "debug"
    )]
    async fn cleanup(mut self) {
        if let Some(wrapped) = self.wrapped.take() {
            wrapped.close_async();

            // TODO: bound the retries, a wrapped input that never confirms
            // close stalls this worker forever.
            let mut attempt: u64 = 0;
            while let Err(e) = wrapped.wait_for_close(CLOSE_POLL_TIMEOUT).await {
                attempt += 1;
                tracing::warn!(
                    attempt,
                    error = %e,
                    "Wrapped input has not confirmed close yet, waiting again"
                );
            }
        }

        READ_UNTIL_RUNNING.dec();

        drop(self.output);
        self.shutdown.confirm_closed();
        tracing::debug!("read_until closed");
    }
}
