//! ## Structure
//!
//! - [`config`] - CLI arguments and validated client configuration.
//! - [`driver`] - `ShapeClient`, one wrapper per RPC.
//! - [`health`] - the health-check gate run before every call.
//! - [`output`] - console rendering of responses.
//! - [`telemetry`] - logging setup.

pub mod config;
pub mod driver;
pub mod health;
pub mod output;
pub mod telemetry;
