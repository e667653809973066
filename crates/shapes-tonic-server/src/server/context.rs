//! Per-call correlation context.
//!
//! Every shape call carries a client-generated correlation identifier in the
//! `x-correlation-id` metadata entry. The handler turns it into a
//! [`CallContext`] and runs the call (including any spawned stream producer)
//! inside the context's span, so every log line of that call carries the
//! identifier and concurrent calls never see each other's.

use shapes_tonic_core::{
    Error, Result,
    types::{CORRELATION_ID_HEADER, CallShape, METHOD_TYPE_HEADER},
};
use tonic::{Request, metadata::MetadataMap};
use tracing::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub correlation_id: String,
    pub method: &'static str,
    pub call_shape: CallShape,
}

impl CallContext {
    /// Builds the context for `method` from the request metadata.
    ///
    /// Calls without a (readable) correlation identifier get a fresh one so
    /// their logs can still be grouped.
    pub fn from_request<T>(request: &Request<T>, method: &'static str, call_shape: CallShape) -> Self {
        let correlation_id = correlation_id(request.metadata())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Self {
            correlation_id,
            method,
            call_shape,
        }
    }

    pub fn span(&self) -> Span {
        tracing::info_span!(
            "rpc",
            correlation_id = %self.correlation_id,
            method = self.method,
            call_shape = %self.call_shape,
        )
    }
}

/// The correlation identifier attached by the client, if any.
pub fn correlation_id(metadata: &MetadataMap) -> Option<String> {
    metadata
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// The call shape declared in the `x-method-type` metadata entry.
pub fn declared_call_shape(metadata: &MetadataMap) -> Result<CallShape> {
    let value = metadata
        .get(METHOD_TYPE_HEADER)
        .ok_or(Error::MissingMetadata {
            key: METHOD_TYPE_HEADER,
        })?;

    value
        .to_str()
        .map_err(|e| Error::InvalidMetadata {
            key: METHOD_TYPE_HEADER.to_string(),
            reason: e.to_string(),
        })?
        .parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(entries: &[(&'static str, &'static str)]) -> Request<()> {
        let mut request = Request::new(());
        for &(key, value) in entries {
            request
                .metadata_mut()
                .insert(key, value.parse().unwrap());
        }
        request
    }

    #[test]
    fn uses_client_correlation_id() {
        let req = request(&[(CORRELATION_ID_HEADER, "abc-123")]);
        let ctx = CallContext::from_request(&req, "GetShape", CallShape::UnaryUnary);
        assert_eq!(ctx.correlation_id, "abc-123");
        assert_eq!(ctx.method, "GetShape");
    }

    #[test]
    fn generates_missing_correlation_id() {
        let req = request(&[]);
        let a = CallContext::from_request(&req, "GetShape", CallShape::UnaryUnary);
        let b = CallContext::from_request(&req, "GetShape", CallShape::UnaryUnary);
        assert!(uuid::Uuid::parse_str(&a.correlation_id).is_ok());
        assert_ne!(a.correlation_id, b.correlation_id);
    }

    #[test]
    fn parses_declared_call_shape() {
        let req = request(&[(METHOD_TYPE_HEADER, "stream-unary")]);
        assert_eq!(
            declared_call_shape(req.metadata()).ok(),
            Some(CallShape::StreamUnary)
        );
    }

    #[test]
    fn missing_or_unknown_call_shape_is_an_error() {
        assert!(matches!(
            declared_call_shape(request(&[]).metadata()),
            Err(Error::MissingMetadata { .. })
        ));
        assert!(matches!(
            declared_call_shape(request(&[(METHOD_TYPE_HEADER, "unary")]).metadata()),
            Err(Error::UnknownCallShape { .. })
        ));
    }
}
