// Local crates
use crate::{condition::condition::Condition, types::message::Message};

// External crates
use serde::{Deserialize, Serialize};

/// Configuration of the `static` condition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticConfig {
    /// Value returned for every message
    #[serde(default)]
    pub value: bool,
}

/// Returns the same value for every message
#[derive(Debug)]
pub struct StaticCondition {
    value: bool,
}

impl StaticCondition {
    /// Build the condition
    pub fn new(conf: &StaticConfig) -> Self {
        Self { value: conf.value }
    }
}

impl Condition for StaticCondition {
    fn check(&self, _msg: &Message) -> bool {
        self.value
    }
}
