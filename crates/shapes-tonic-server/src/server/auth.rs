//! Shared-secret authentication for the shape service.
//!
//! [`SignatureInterceptor`] runs before the handler on every `ShapeService`
//! call. It first classifies the call by its declared [`CallShape`]; a call
//! that does not declare a known shape is a caller bug and fails with
//! `INTERNAL`. It then compares the configured signature pair against the
//! call metadata and rejects mismatches with `UNAUTHENTICATED`.
//!
//! The health service is not wrapped and stays reachable without a secret.

use crate::server::{
    config::Signature,
    context::{correlation_id, declared_call_shape},
    telemetry::increment_auth_rejections,
};
use shapes_tonic_core::types::CallShape;
use std::sync::Arc;
use tonic::{Request, Status, service::Interceptor};

pub const INVALID_SIGNATURE: &str = "Invalid signature";

#[derive(Clone, Debug)]
pub struct SignatureInterceptor {
    signature: Arc<Signature>,
}

impl SignatureInterceptor {
    pub fn new(signature: Signature) -> Self {
        Self {
            signature: Arc::new(signature),
        }
    }

    fn is_signed<T>(&self, request: &Request<T>) -> bool {
        request
            .metadata()
            .get_all(self.signature.header.as_str())
            .iter()
            .any(|presented| *presented == self.signature.value)
    }
}

impl Interceptor for SignatureInterceptor {
    fn call(&mut self, request: Request<()>) -> Result<Request<()>, Status> {
        let call_shape = declared_call_shape(request.metadata()).map_err(|e| {
            tracing::error!(
                correlation_id = correlation_id(request.metadata()).as_deref(),
                "Rejecting call without a usable call shape: {e}"
            );
            Status::from(e)
        })?;

        if self.is_signed(&request) {
            return Ok(request);
        }

        increment_auth_rejections(call_shape);
        let correlation_id = correlation_id(request.metadata());
        Err(reject(call_shape, correlation_id.as_deref()))
    }
}

/// Builds the abort for an unsigned call of the given shape.
///
/// The status is the same for every shape; what differs is when the caller
/// observes it.
fn reject(call_shape: CallShape, correlation_id: Option<&str>) -> Status {
    match call_shape {
        CallShape::UnaryUnary => {
            tracing::warn!(correlation_id, "Unary call rejected: {INVALID_SIGNATURE}");
        }
        CallShape::UnaryStream => {
            tracing::warn!(
                correlation_id,
                "Response stream rejected before its first item: {INVALID_SIGNATURE}"
            );
        }
        CallShape::StreamUnary => {
            tracing::warn!(
                correlation_id,
                "Request stream rejected before it was read: {INVALID_SIGNATURE}"
            );
        }
        CallShape::StreamStream => {
            tracing::warn!(
                correlation_id,
                "Bidirectional stream rejected before it opened: {INVALID_SIGNATURE}"
            );
        }
    }
    Status::unauthenticated(INVALID_SIGNATURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapes_tonic_core::types::METHOD_TYPE_HEADER;
    use tonic::{
        Code,
        metadata::{AsciiMetadataKey, AsciiMetadataValue},
    };

    fn interceptor() -> SignatureInterceptor {
        SignatureInterceptor::new(Signature {
            header: AsciiMetadataKey::from_static("x-signature"),
            value: AsciiMetadataValue::from_static("open-sesame"),
        })
    }

    fn request(call_shape: Option<&'static str>, signature: Option<(&'static str, &'static str)>) -> Request<()> {
        let mut request = Request::new(());
        let metadata = request.metadata_mut();
        if let Some(shape) = call_shape {
            metadata.insert(METHOD_TYPE_HEADER, AsciiMetadataValue::from_static(shape));
        }
        if let Some((key, value)) = signature {
            metadata.insert(key, AsciiMetadataValue::from_static(value));
        }
        request
    }

    #[test]
    fn admits_the_configured_pair_for_every_shape() {
        for shape in CallShape::ALL {
            let req = request(Some(shape.as_str()), Some(("x-signature", "open-sesame")));
            assert!(interceptor().call(req).is_ok(), "{shape}");
        }
    }

    #[test]
    fn rejects_a_missing_signature_for_every_shape() {
        for shape in CallShape::ALL {
            let status = interceptor()
                .call(request(Some(shape.as_str()), None))
                .unwrap_err();
            assert_eq!(status.code(), Code::Unauthenticated, "{shape}");
            assert_eq!(status.message(), INVALID_SIGNATURE);
        }
    }

    #[test]
    fn rejects_a_wrong_value_for_every_shape() {
        for shape in CallShape::ALL {
            let req = request(Some(shape.as_str()), Some(("x-signature", "open-sesame!")));
            let status = interceptor().call(req).unwrap_err();
            assert_eq!(status.code(), Code::Unauthenticated, "{shape}");
        }
    }

    #[test]
    fn rejects_the_secret_under_another_header() {
        for shape in CallShape::ALL {
            let req = request(Some(shape.as_str()), Some(("x-token", "open-sesame")));
            let status = interceptor().call(req).unwrap_err();
            assert_eq!(status.code(), Code::Unauthenticated, "{shape}");
        }
    }

    #[test]
    fn finds_the_signature_among_repeated_entries() {
        for shape in CallShape::ALL {
            let mut req = request(Some(shape.as_str()), Some(("x-signature", "stale")));
            req.metadata_mut()
                .append("x-signature", AsciiMetadataValue::from_static("open-sesame"));
            assert!(interceptor().call(req).is_ok(), "{shape}");
        }
    }

    #[test]
    fn unknown_or_missing_call_shape_is_internal() {
        let signed = Some(("x-signature", "open-sesame"));
        for req in [request(Some("unary-sideways"), signed), request(None, signed)] {
            let status = interceptor().call(req).unwrap_err();
            assert_eq!(status.code(), Code::Internal);
        }
    }
}
