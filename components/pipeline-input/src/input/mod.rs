//! Pipeline inputs: producers of [`Transaction`](crate::types::transaction::Transaction)s.
//!
//! ```text
//! file/stdin/memory ──► stream pump ──► Input::recv()
//!                                            │
//!                                   read_until (wraps any Input)
//! ```

pub mod async_read;
pub mod file;
pub mod input;
pub mod memory;
pub mod read_until;
pub mod stdin;
pub mod stream;
