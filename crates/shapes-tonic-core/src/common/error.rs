//! Error types for the shape service.
//!
//! This module defines the central `Error` enum shared by the server and the
//! client. It implements `From<Error>` for `tonic::Status` so server-side
//! failures propagate to callers with an appropriate gRPC status code.
//!
//! ## Error Cases
//! - `ChannelError`: An internal communication failure between tasks or
//!   workers.
//! - `Persistence`: The shape repository could not be read or written.
//! - `InvalidShapeId` / `InvalidPerimeter`: Client input rejected before any
//!   call is made.
//! - `MissingMetadata` / `InvalidMetadata` / `UnknownCallShape`: A call
//!   arrived without the metadata the interceptor needs to classify it.
//! - `ServerUnreachable` / `HealthCheck`: The client health gate gave up.
//! - `Transport`: A gRPC call failed after it was issued.
//! - `ServiceShutdown`: Work arrived while the service was shutting down.

use tonic::{Code, Status};

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the shape service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// Internal channel send/receive failure (e.g., closed or full channel).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// Reading or flushing the repository failed.
    #[error("Persistence error: {reason}")]
    Persistence { reason: String },

    /// A shape identifier does not follow `<letter>-<ordinal>`.
    #[error("{input} is not a valid shape_id: {reason}")]
    InvalidShapeId { input: String, reason: &'static str },

    /// A minimum perimeter could not be parsed as a finite number.
    #[error("{input} is not a valid min_perimeter")]
    InvalidPerimeter { input: String },

    /// A required metadata entry was absent from the call.
    #[error("Missing `{key}` metadata")]
    MissingMetadata { key: &'static str },

    /// A metadata key or value is not valid ASCII metadata.
    #[error("Invalid metadata `{key}`: {reason}")]
    InvalidMetadata { key: String, reason: String },

    /// The declared call shape is not one of the four known shapes.
    #[error("Invalid method type provided: {value}")]
    UnknownCallShape { value: String },

    /// The health gate exhausted its attempts.
    #[error("Server unreachable after {attempts} health check attempt(s)")]
    ServerUnreachable { attempts: u32 },

    /// The health check failed with a non-retryable status.
    #[error("Health check failed: {code:?} - {message}")]
    HealthCheck { code: Code, message: String },

    /// A call failed at the transport level.
    #[error("{code:?} - {message}")]
    Transport { code: Code, message: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        Error::Transport {
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {}", context))
            }
            Error::Persistence { reason } => {
                Status::internal(format!("Persistence error: {}", reason))
            }
            e @ (Error::InvalidShapeId { .. } | Error::InvalidPerimeter { .. }) => {
                Status::invalid_argument(e.to_string())
            }
            e @ (Error::MissingMetadata { .. }
            | Error::InvalidMetadata { .. }
            | Error::UnknownCallShape { .. }) => Status::internal(e.to_string()),
            e @ Error::ServerUnreachable { .. } => Status::unavailable(e.to_string()),
            Error::HealthCheck { code, message } | Error::Transport { code, message } => {
                Status::new(code, message)
            }
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}
