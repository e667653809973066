//! Persistence worker pool.
//!
//! Repository flushes are blocking file writes. They are handed to a fixed set
//! of worker tasks so request handlers never touch the filesystem directly.
//!
//! - [`manager`] - round-robin dispatch and coordinated shutdown.
//! - [`worker`] - the per-worker receive loop.
//! - [`request`] - messages exchanged between the two.

pub mod manager;
pub mod request;
pub mod worker;
