//! Message and transaction primitives shared by every pipeline stage.

pub mod message;
pub mod transaction;
