#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use futures::Stream;
use server::{
    auth::SignatureInterceptor,
    config::{CliArgs, ServerConfig, TlsPaths},
    health::{stop_toggle, toggle_health},
    repository::Repository,
    service::{build_shape_service, handler::ShapeHandler},
    telemetry::{TelemetryProviders, init_telemetry},
};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpListener,
    signal,
    task::JoinHandle,
};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::{Identity, Server, ServerTlsConfig, server::Connected};
use tonic_health::{ServingStatus, server::HealthReporter};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let tcp = TcpListener::bind(&config.server_addr).await?;
    let incoming = TcpListenerStream::new(tcp);
    log_startup_info(&config);
    run_server_with_incoming(providers, incoming, config).await
}

async fn run_server_with_incoming<I, IO, IE>(
    providers: TelemetryProviders,
    incoming: I,
    config: ServerConfig,
) -> anyhow::Result<()>
where
    I: Stream<Item = Result<IO, IE>>,
    IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
    IE: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let repository = Repository::load(&config.db_path)?;
    tracing::info!(
        shapes = repository.len(),
        path = %config.db_path.display(),
        "Repository loaded"
    );

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_service_status(&config.health_service_name, ServingStatus::Serving)
        .await;

    let toggler_token = CancellationToken::new();
    let toggler = tokio::spawn(toggle_health(
        health_reporter.clone(),
        config.health_service_name.clone(),
        config.health_interval,
        toggler_token.clone(),
    ));

    let handler = ShapeHandler::new(&config, repository);
    let interceptor = SignatureInterceptor::new(config.signature.clone());

    let mut builder = Server::builder();
    if let Some(tls) = &config.tls {
        builder = builder.tls_config(load_tls(tls).await?)?;
        tracing::info!("TLS enabled");
    }

    builder
        .add_service(health_service)
        .add_service(build_shape_service(handler.clone(), interceptor))
        .serve_with_incoming_shutdown(
            incoming,
            shutdown_signal(
                handler,
                health_reporter,
                config.health_service_name.clone(),
                toggler_token,
                toggler,
                providers,
            ),
        )
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

async fn load_tls(paths: &TlsPaths) -> anyhow::Result<ServerTlsConfig> {
    let cert = tokio::fs::read(&paths.cert).await?;
    let key = tokio::fs::read(&paths.key).await?;
    Ok(ServerTlsConfig::new().identity(Identity::from_pem(cert, key)))
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting shape service on {} with full config: {:#?}",
            config.server_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting shape service on {} with {} workers",
            config.server_addr,
            config.num_workers
        );
    }
}

async fn shutdown_signal(
    handler: ShapeHandler,
    health_reporter: HealthReporter,
    health_service_name: String,
    toggler_token: CancellationToken,
    toggler: JoinHandle<()>,
    providers: TelemetryProviders,
) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");

    // 1. Stop re-asserting SERVING, then publish the status
    stop_toggle(toggler_token, toggler).await;
    health_reporter
        .set_service_status(&health_service_name, ServingStatus::NotServing)
        .await;

    // 2. Drain the persistence workers
    if let Err(e) = handler.shutdown().await {
        tracing::error!("Error during service shutdown: {e}");
    }

    // 3. Flush telemetry
    providers.shutdown();
}
