//! ======================================================================
//!                                 GOALS
//! ======================================================================
//!
//! 1. Asking a pipeline stage to stop never blocks the caller
//! 2. Stopping is requested once, no matter how many callers ask
//! 3. Any number of callers can wait for the stage to confirm it stopped
//! 4. Every blocking point inside a stage can race against the request
//!
//! ======================================================================
//!                             BUILDING BLOCKS
//! ======================================================================
//!
//! 1. Running flag
//! - An atomic flag flipped true -> false with compare-and-set, the caller
//! that wins the flip is the only one that fires the close signal.
//!
//! 2. Close signal
//! - A `CancellationToken` the stage's worker `select!`s against at every
//! suspension point.
//!
//! 3. Close confirmation
//! - A second `CancellationToken` the worker fires once, after its cleanup
//! has finished. `wait_for_close` waits on it with a deadline.

// Local crates
use crate::error::TimeoutError;

// External crates
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::instrument;

/// Two-phase shutdown controller owned by a pipeline stage.
///
/// - Clones share the same state, the stage's worker keeps one and the
/// handle returned to callers keeps another.
/// - `request_close` is the signal phase, `wait_for_close` the confirm phase.
#[derive(Debug, Clone)]
pub struct Shutdown {
    running: Arc<AtomicBool>,
    close: CancellationToken,
    closed: CancellationToken,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    /// Creates a new controller in the running state
    #[instrument(
        name = "pipeline_shutdown::create",
        target = "helpers::shutdown",
        level = "trace"
    )]
    pub fn new() -> Self {
        tracing::trace!("Creating new shutdown controller");
        Self {
            running: Arc::new(AtomicBool::new(true)),
            close: CancellationToken::new(),
            closed: CancellationToken::new(),
        }
    }

    /// Request the stage to close. Only the first call has an effect, it
    /// returns `true` when this call was the one that fired the signal.
    #[instrument(
        name = "pipeline_shutdown::request_close",
        target = "helpers::shutdown",
        skip_all,
        level = "trace"
    )]
    pub fn request_close(&self) -> bool {
        if self
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            tracing::trace!("Close requested, firing close signal");
            self.close.cancel();
            return true;
        }

        tracing::trace!("Close already requested, ignoring");
        false
    }

    /// Whether close has not been requested yet
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Future that resolves once close has been requested
    pub fn close_requested(&self) -> WaitForCancellationFuture<'_> {
        self.close.cancelled()
    }

    /// Owned handle on the close signal, for readers that outlive a borrow
    pub fn close_token(&self) -> CancellationToken {
        self.close.clone()
    }

    /// Confirm the stage has finished closing. Called by the stage's worker
    /// once its cleanup is done.
    #[instrument(
        name = "pipeline_shutdown::confirm_closed",
        target = "helpers::shutdown",
        skip_all,
        level = "trace"
    )]
    pub fn confirm_closed(&self) {
        tracing::trace!("Stage closed, notifying waiters");
        self.closed.cancel();
    }

    /// Whether the stage has confirmed it closed
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Wait for the stage to confirm it closed. Does not request close.
    pub async fn wait_for_close(&self, timeout: Duration) -> Result<(), TimeoutError> {
        tokio::time::timeout(timeout, self.closed.cancelled())
            .await
            .map_err(|_| TimeoutError { timeout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_close_only_fires_once() {
        let shutdown = Shutdown::new();
        assert!(shutdown.is_running());

        assert!(shutdown.request_close());
        assert!(!shutdown.request_close());
        assert!(!shutdown.clone().request_close());

        assert!(!shutdown.is_running());
        shutdown.close_requested().await;
    }

    #[tokio::test]
    async fn test_concurrent_request_close_single_winner() {
        let shutdown = Shutdown::new();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let shutdown = shutdown.clone();
                tokio::spawn(async move { shutdown.request_close() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_wait_for_close_times_out_without_confirmation() {
        let shutdown = Shutdown::new();
        shutdown.request_close();

        let err = shutdown
            .wait_for_close(Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err.timeout, Duration::from_millis(20));
        assert!(!shutdown.is_closed());
    }

    #[tokio::test]
    async fn test_many_waiters_before_and_after_confirmation() {
        let shutdown = Shutdown::new();

        let early: Vec<_> = (0..4)
            .map(|_| {
                let shutdown = shutdown.clone();
                tokio::spawn(async move { shutdown.wait_for_close(Duration::from_secs(1)).await })
            })
            .collect();

        shutdown.request_close();
        shutdown.confirm_closed();

        for waiter in early {
            assert!(waiter.await.unwrap().is_ok());
        }
        assert!(shutdown.wait_for_close(Duration::from_millis(1)).await.is_ok());
        assert!(shutdown.wait_for_close(Duration::from_millis(1)).await.is_ok());
    }
}
