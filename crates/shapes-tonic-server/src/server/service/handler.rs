//! gRPC service implementation for the shape service.
//!
//! This module defines [`ShapeHandler`], the concrete implementation of the
//! generated [`ShapeService`] trait. It owns the in-memory repository and the
//! persistence worker pool, and runs every call inside its correlation span.
//!
//! ## Responsibilities
//!
//! - Resolve, scan and mutate the [`Repository`] behind a `parking_lot` lock
//!   that is never held across an `.await`.
//! - Hand repository flushes to the [`WorkerPool`].
//! - Drive server streams from spawned producers via [`feed_responses`].

use crate::server::{
    config::ServerConfig,
    context::CallContext,
    pool::manager::WorkerPool,
    repository::{
        Repository,
        generate::{Bounds, generate},
        persist::SnapshotWriter,
    },
    service::responses::{self, AreaTotal},
    streaming::coordinator::feed_responses,
    telemetry::{increment_rpc_requests, increment_shapes_created},
};
use core::{pin::Pin, time::Duration};
use futures::Stream;
use parking_lot::RwLock;
use shapes_tonic_core::{
    Error,
    proto::{
        CreateShapeResponse, GetAreasResponse, GetPerimetersGreaterThanResponse, GetShapeResponse,
        GetTotalAreaResponse, MinPerimeter, ShapeId, ShapeType,
        shape_service_server::ShapeService,
    },
    types::{CallShape, ShapeKind},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::{Instrument, Span};

pub type ResponseStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;

/// The shape service.
///
/// Cloning is cheap: clones share the repository and the worker pool.
#[derive(Clone)]
pub struct ShapeHandler {
    repository: Arc<RwLock<Repository>>,
    worker_pool: Arc<WorkerPool>,
    bounds: Bounds,
    stream_buffer_size: usize,
    stream_delay: Duration,
}

impl ShapeHandler {
    /// Creates the handler around `repository` and spawns the persistence
    /// workers that flush it to `config.db_path`.
    pub fn new(config: &ServerConfig, repository: Repository) -> Self {
        let writer = Arc::new(SnapshotWriter::new(
            config.db_path.clone(),
            repository.version(),
        ));
        let worker_pool = WorkerPool::spawn(config.num_workers, writer, config.shutdown_timeout);

        Self {
            repository: Arc::new(RwLock::new(repository)),
            worker_pool: Arc::new(worker_pool),
            bounds: Bounds {
                max_width: config.max_width,
                max_height: config.max_height,
            },
            stream_buffer_size: config.stream_buffer_size,
            stream_delay: config.stream_delay,
        }
    }

    /// Stops the persistence workers after their queued flushes.
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.worker_pool.shutdown().await
    }

    /// Spawns a producer that answers each inbound item and returns the
    /// receiving half as the response stream.
    fn spawn_stream<S, I, T, F>(
        &self,
        inbound: S,
        respond: F,
        method: &'static str,
        span: Span,
    ) -> ResponseStream<T>
    where
        S: Stream<Item = Result<I, Status>> + Unpin + Send + 'static,
        I: Send + 'static,
        T: Send + 'static,
        F: FnMut(I) -> T + Send + 'static,
    {
        let (resp_tx, resp_rx) = mpsc::channel(self.stream_buffer_size);
        let delay = self.stream_delay;

        let fut = async move {
            match feed_responses(inbound, respond, resp_tx, delay, method).await {
                Ok(()) => tracing::info!("Stream complete"),
                Err(e) => tracing::warn!("Stream ended early: {e}"),
            }
        };
        tokio::spawn(fut.instrument(span));

        Box::pin(ReceiverStream::new(resp_rx))
    }

    async fn create(&self, shape_type: String) -> CreateShapeResponse {
        tracing::info!("CreateShape called with shape_type={shape_type:?}");

        let Ok(kind) = shape_type.parse::<ShapeKind>() else {
            tracing::warn!("Unsupported shape_type {shape_type:?}");
            return responses::unsupported_shape_type(&shape_type);
        };

        let (response, snapshot) = {
            let mut repository = self.repository.write();
            let shape = repository.insert_with(kind, |ordinal| {
                generate(&mut rand::rng(), kind, ordinal, self.bounds)
            });
            tracing::info!(shape_id = %shape.shape_id, coords = ?shape.coords, "Generated {kind}");
            (responses::created(shape), repository.snapshot())
        };
        increment_shapes_created(kind.type_name());

        // The shape stays created in memory even if the flush fails.
        let flushed = match snapshot {
            Ok(snapshot) => self.worker_pool.persist(snapshot).await,
            Err(e) => Err(e),
        };
        match flushed {
            Ok(flush) => tracing::debug!(?flush, "Repository flushed"),
            Err(e) => tracing::error!("Failed to persist repository: {e}"),
        }

        response
    }
}

#[tonic::async_trait]
impl ShapeService for ShapeHandler {
    type GetPerimetersGreaterThanStream = ResponseStream<GetPerimetersGreaterThanResponse>;
    type GetAreasStream = ResponseStream<GetAreasResponse>;

    async fn create_shape(
        &self,
        req: Request<ShapeType>,
    ) -> Result<Response<CreateShapeResponse>, Status> {
        let ctx = CallContext::from_request(&req, "CreateShape", CallShape::UnaryUnary);
        increment_rpc_requests(ctx.method);

        let response = self
            .create(req.into_inner().shape_type)
            .instrument(ctx.span())
            .await;
        Ok(Response::new(response))
    }

    async fn get_shape(&self, req: Request<ShapeId>) -> Result<Response<GetShapeResponse>, Status> {
        let ctx = CallContext::from_request(&req, "GetShape", CallShape::UnaryUnary);
        increment_rpc_requests(ctx.method);

        let shape_id = req.into_inner().shape_id;
        let response = ctx.span().in_scope(|| {
            tracing::info!("GetShape called with shape_id={shape_id:?}");
            let repository = self.repository.read();
            let response = responses::get_shape(&shape_id, repository.resolve(&shape_id));
            tracing::info!(status_code = ?response.status_code(), "{}", response.message);
            response
        });

        Ok(Response::new(response))
    }

    async fn get_perimeters_greater_than(
        &self,
        req: Request<MinPerimeter>,
    ) -> Result<Response<Self::GetPerimetersGreaterThanStream>, Status> {
        let ctx = CallContext::from_request(
            &req,
            "GetPerimetersGreaterThan",
            CallShape::UnaryStream,
        );
        increment_rpc_requests(ctx.method);
        let span = ctx.span();

        let min_perimeter = req.into_inner().min_perimeter;
        let items = span.in_scope(|| {
            tracing::info!("GetPerimetersGreaterThan called with min_perimeter={min_perimeter}");
            let repository = self.repository.read();
            responses::perimeters_greater_than(&repository, min_perimeter)
        });

        let inbound = futures::stream::iter(items.into_iter().map(Ok));
        let stream = self.spawn_stream(inbound, core::convert::identity, ctx.method, span);
        Ok(Response::new(stream))
    }

    async fn get_total_area(
        &self,
        req: Request<Streaming<ShapeId>>,
    ) -> Result<Response<GetTotalAreaResponse>, Status> {
        let ctx = CallContext::from_request(&req, "GetTotalArea", CallShape::StreamUnary);
        increment_rpc_requests(ctx.method);

        let mut inbound = req.into_inner();
        let fut = async move {
            tracing::info!("GetTotalArea called");
            let mut total = AreaTotal::default();

            while let Some(ShapeId { shape_id }) = inbound.message().await? {
                let repository = self.repository.read();
                let lookup = repository.resolve(&shape_id);
                total.add(shape_id, lookup);
            }

            let response = total.finish();
            tracing::info!(status_code = ?response.status_code(), "{}", response.message);
            Ok::<_, Status>(Response::new(response))
        };

        fut.instrument(ctx.span()).await
    }

    async fn get_areas(
        &self,
        req: Request<Streaming<ShapeId>>,
    ) -> Result<Response<Self::GetAreasStream>, Status> {
        let ctx = CallContext::from_request(&req, "GetAreas", CallShape::StreamStream);
        increment_rpc_requests(ctx.method);
        let span = ctx.span();
        span.in_scope(|| tracing::info!("GetAreas called"));

        let repository = Arc::clone(&self.repository);
        let respond = move |ShapeId { shape_id }: ShapeId| {
            let repository = repository.read();
            let response = responses::area_of(&shape_id, repository.resolve(&shape_id));
            tracing::info!(status_code = ?response.status_code(), "{}", response.message);
            response
        };

        let inbound = Box::pin(req.into_inner());
        let stream = self.spawn_stream(inbound, respond, ctx.method, span);
        Ok(Response::new(stream))
    }
}
