//! Server-side components of the shape service.
//!
//! ## Submodules
//!
//! - [`config`] - CLI/environment configuration.
//! - [`auth`] - shared-secret interceptor guarding the shape service.
//! - [`context`] - per-call correlation context.
//! - [`health`] - background health toggler.
//! - [`pool`] - persistence worker pool.
//! - [`repository`] - in-memory shape store and its JSON snapshot.
//! - [`service`] - the `ShapeService` implementation.
//! - [`streaming`] - server-stream producers.
//! - [`telemetry`] - logging and optional OpenTelemetry export.

pub mod auth;
pub mod config;
pub mod context;
pub mod health;
pub mod pool;
pub mod repository;
pub mod service;
pub mod streaming;
pub mod telemetry;
