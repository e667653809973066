//! gRPC service implementation.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`ShapeHandler`).
//! - [`responses`] - typed responses and status codes per operation.

pub mod handler;
pub mod responses;


use crate::server::auth::SignatureInterceptor;
use handler::ShapeHandler;
use shapes_tonic_core::proto::shape_service_server::ShapeServiceServer;
use tonic::{codec::CompressionEncoding, service::interceptor::InterceptedService};

pub type ShapeServer = InterceptedService<ShapeServiceServer<ShapeHandler>, SignatureInterceptor>;

/// Wraps the handler with compression support and the signature check.
pub fn build_shape_service(handler: ShapeHandler, interceptor: SignatureInterceptor) -> ShapeServer {
    let server = ShapeServiceServer::new(handler)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip);

    InterceptedService::new(server, interceptor)
}
