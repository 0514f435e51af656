//! Predicates evaluated against messages, used by `read_until` to decide
//! when a stream ends.

pub mod condition;
pub mod constant;
pub mod content;
pub mod count;
pub mod logical;
