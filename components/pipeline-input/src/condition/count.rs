// Local crates
use crate::{condition::condition::Condition, types::message::Message};

// External crates
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Configuration of the `count` condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountConfig {
    /// The condition is true on every `arg`-th check
    #[serde(default = "default_arg")]
    pub arg: usize,
}

fn default_arg() -> usize {
    100
}

/// Stateful condition that is false for `arg - 1` checks, true on the
/// `arg`-th one, then starts counting again.
#[derive(Debug)]
pub struct CountCondition {
    arg: usize,
    seen: AtomicUsize,
}

impl CountCondition {
    /// Build the condition, an `arg` of zero behaves like one
    pub fn new(conf: &CountConfig) -> Self {
        Self {
            arg: conf.arg.max(1),
            seen: AtomicUsize::new(0),
        }
    }
}

impl Condition for CountCondition {
    fn check(&self, _msg: &Message) -> bool {
        let arg = self.arg;
        let prev = self
            .seen
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |seen| {
                Some(if seen + 1 >= arg { 0 } else { seen + 1 })
            })
            .unwrap_or_else(|seen| seen);
        prev + 1 >= arg
    }
}
