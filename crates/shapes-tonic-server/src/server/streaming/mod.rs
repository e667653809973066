//! Server-stream production.
//!
//! - [`coordinator`] - drives a spawned producer into a bounded response
//!   channel, with optional pacing between items.

pub mod coordinator;
