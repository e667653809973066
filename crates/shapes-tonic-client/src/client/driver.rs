//! Call wrappers for every shape operation.
//!
//! [`ShapeClient`] owns a lazily connected channel. Each call is gated on the
//! health check, tagged with a fresh correlation id, signed, and bounded by
//! the configured deadline. Failed calls are never retried.

use super::{
    config::{ClientConfig, HealthPolicy, Signature},
    health::{HealthGate, await_serving},
};
use core::{future::Future, time::Duration};
use futures::{Stream, StreamExt};
use shapes_tonic_core::{
    Result,
    proto::{
        CreateShapeResponse, GetAreasResponse, GetPerimetersGreaterThanResponse,
        GetShapeResponse, GetTotalAreaResponse, MinPerimeter, ShapeId, ShapeType,
        shape_service_client::ShapeServiceClient,
    },
    types::{CORRELATION_ID_HEADER, CallShape, METHOD_TYPE_HEADER, ShapeKind},
};
use tonic::{
    Request, Status, Streaming,
    codec::CompressionEncoding,
    metadata::AsciiMetadataValue,
    transport::{Certificate, Channel, ClientTlsConfig, Endpoint},
};
use tonic_health::pb::{
    HealthCheckRequest, health_check_response::ServingStatus, health_client::HealthClient,
};
use tokio::time::Instant;
use tracing::{Instrument, Span};

pub struct ShapeClient {
    endpoint: Endpoint,
    stub: ShapeServiceClient<Channel>,
    health: HealthClient<Channel>,
    signature: Signature,
    rpc_timeout: Duration,
    health_policy: HealthPolicy,
    send_interval: Duration,
}

impl ShapeClient {
    /// Builds the endpoint, loading the CA bundle when TLS is configured. No
    /// connection is made until the first call.
    pub async fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let mut endpoint = Endpoint::from_shared(config.server_url.clone())?
            .connect_timeout(config.health.timeout);

        if let Some(tls) = &config.tls {
            let ca = tokio::fs::read(&tls.ca).await?;
            let mut tls_config = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(ca));
            if let Some(domain) = &tls.domain {
                tls_config = tls_config.domain_name(domain.clone());
            }
            endpoint = endpoint.tls_config(tls_config)?;
        }

        Ok(Self::from_endpoint(endpoint, config))
    }

    pub fn from_endpoint(endpoint: Endpoint, config: &ClientConfig) -> Self {
        let channel = endpoint.connect_lazy();
        Self {
            stub: Self::stub(channel.clone()),
            health: HealthClient::new(channel),
            endpoint,
            signature: config.signature.clone(),
            rpc_timeout: config.rpc_timeout,
            health_policy: config.health.clone(),
            send_interval: config.send_interval,
        }
    }

    fn stub(channel: Channel) -> ShapeServiceClient<Channel> {
        ShapeServiceClient::new(channel)
            .send_compressed(CompressionEncoding::Zstd)
            .accept_compressed(CompressionEncoding::Zstd)
            .accept_compressed(CompressionEncoding::Gzip)
    }

    /// Runs the health gate and opens the span for one call.
    async fn begin(&mut self, method: &'static str, call_shape: CallShape) -> Result<Call> {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "call",
            %correlation_id,
            method,
            call_shape = call_shape.as_str()
        );

        let policy = self.health_policy.clone();
        await_serving(self, &policy).instrument(span.clone()).await?;

        Ok(Call {
            correlation_id,
            call_shape,
            deadline: Instant::now() + self.rpc_timeout,
            span,
        })
    }

    fn request<T>(&self, message: T, call: &Call) -> Request<T> {
        let mut request = Request::new(message);
        request.set_timeout(self.rpc_timeout);

        let metadata = request.metadata_mut();
        if let Ok(value) = AsciiMetadataValue::try_from(call.correlation_id.as_str()) {
            metadata.insert(CORRELATION_ID_HEADER, value);
        }
        metadata.insert(
            METHOD_TYPE_HEADER,
            AsciiMetadataValue::from_static(call.call_shape.as_str()),
        );
        metadata.insert(self.signature.header.clone(), self.signature.value.clone());
        request
    }

    /// Yields one `ShapeId` per id, pausing `send_interval` between items.
    fn paced(&self, shape_ids: Vec<String>) -> impl Stream<Item = ShapeId> + Send + 'static {
        let interval = self.send_interval;
        futures::stream::iter(shape_ids.into_iter().enumerate()).then(move |(i, shape_id)| async move {
            if i > 0 && !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
            tracing::debug!("Sending {shape_id}");
            ShapeId { shape_id }
        })
    }

    pub async fn create_shape(&mut self, kind: ShapeKind) -> Result<CreateShapeResponse> {
        let call = self.begin("CreateShape", CallShape::UnaryUnary).await?;
        let request = self.request(
            ShapeType {
                shape_type: kind.type_name().to_string(),
            },
            &call,
        );
        let response = bounded(call.deadline, self.stub.create_shape(request))
            .instrument(call.span)
            .await?;
        Ok(response.into_inner())
    }

    pub async fn get_shape(&mut self, shape_id: String) -> Result<GetShapeResponse> {
        let call = self.begin("GetShape", CallShape::UnaryUnary).await?;
        let request = self.request(ShapeId { shape_id }, &call);
        let response = bounded(call.deadline, self.stub.get_shape(request))
            .instrument(call.span)
            .await?;
        Ok(response.into_inner())
    }

    pub async fn get_perimeters_greater_than(
        &mut self,
        min_perimeter: f64,
    ) -> Result<DeadlineStream<GetPerimetersGreaterThanResponse>> {
        let call = self
            .begin("GetPerimetersGreaterThan", CallShape::UnaryStream)
            .await?;
        let request = self.request(MinPerimeter { min_perimeter }, &call);
        let response = bounded(call.deadline, self.stub.get_perimeters_greater_than(request))
            .instrument(call.span)
            .await?;
        Ok(DeadlineStream::new(response.into_inner(), call.deadline))
    }

    pub async fn get_total_area(&mut self, shape_ids: Vec<String>) -> Result<GetTotalAreaResponse> {
        let call = self.begin("GetTotalArea", CallShape::StreamUnary).await?;
        let request = self.request(self.paced(shape_ids), &call);
        let response = bounded(call.deadline, self.stub.get_total_area(request))
            .instrument(call.span)
            .await?;
        Ok(response.into_inner())
    }

    pub async fn get_areas(&mut self, shape_ids: Vec<String>) -> Result<DeadlineStream<GetAreasResponse>> {
        let call = self.begin("GetAreas", CallShape::StreamStream).await?;
        let request = self.request(self.paced(shape_ids), &call);
        let response = bounded(call.deadline, self.stub.get_areas(request))
            .instrument(call.span)
            .await?;
        Ok(DeadlineStream::new(response.into_inner(), call.deadline))
    }
}

struct Call {
    correlation_id: String,
    call_shape: CallShape,
    deadline: Instant,
    span: Span,
}

fn deadline_exceeded() -> Status {
    Status::deadline_exceeded("Deadline exceeded before the call completed")
}

/// Fails the call with `DEADLINE_EXCEEDED` once `deadline` passes.
async fn bounded<F, T>(deadline: Instant, call: F) -> Result<T>
where
    F: Future<Output = core::result::Result<T, Status>>,
{
    match tokio::time::timeout_at(deadline, call).await {
        Ok(response) => Ok(response?),
        Err(_) => Err(deadline_exceeded().into()),
    }
}

/// A server stream whose items must all arrive before the call's deadline.
///
/// The `grpc-timeout` header only bounds the response headers on the server
/// side, so the remaining items are bounded here.
pub struct DeadlineStream<T> {
    inner: Streaming<T>,
    deadline: Instant,
}

impl<T> DeadlineStream<T> {
    const fn new(inner: Streaming<T>, deadline: Instant) -> Self {
        Self { inner, deadline }
    }

    /// The next item, `None` once the server closes the stream.
    pub async fn message(&mut self) -> Result<Option<T>> {
        match tokio::time::timeout_at(self.deadline, self.inner.message()).await {
            Ok(item) => Ok(item?),
            Err(_) => Err(deadline_exceeded().into()),
        }
    }
}

#[tonic::async_trait]
impl HealthGate for ShapeClient {
    async fn check(&mut self, policy: &HealthPolicy) -> core::result::Result<ServingStatus, Status> {
        let mut request = Request::new(HealthCheckRequest {
            service: policy.service_name.clone(),
        });
        request.set_timeout(policy.timeout);

        let response = self.health.check(request).await?;
        Ok(response.into_inner().status())
    }

    fn reset(&mut self) {
        let channel = self.endpoint.connect_lazy();
        self.stub = Self::stub(channel.clone());
        self.health = HealthClient::new(channel);
    }
}
