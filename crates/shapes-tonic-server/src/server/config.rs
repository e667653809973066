use anyhow::{Context, bail};
use clap::Parser;
use core::time::Duration;
use std::path::PathBuf;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue};

/// Runtime configuration for the `shapes-tonic-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first), with defaults suitable for local use. Only
/// the shared signature secret has no default.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "shapes-tonic-server",
    version,
    about = "A gRPC service for creating and querying geometric shapes"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub server_addr: String,

    /// Path of the JSON document backing the shape repository.
    ///
    /// A missing file starts an empty repository; it is created on the first
    /// successful `CreateShape`.
    ///
    /// Environment variable: `DB_PATH`
    #[arg(long, env = "DB_PATH", default_value = "shapes.json")]
    pub db_path: PathBuf,

    /// Upper bound for the randomized width parameter of generated shapes.
    ///
    /// Triangles and pentagons double this value so their apex lands on an
    /// integer coordinate.
    ///
    /// Environment variable: `MAX_WIDTH`
    #[arg(long, env = "MAX_WIDTH", default_value_t = 10)]
    pub max_width: u32,

    /// Upper bound for the randomized height parameter of generated shapes.
    ///
    /// Environment variable: `MAX_HEIGHT`
    #[arg(long, env = "MAX_HEIGHT", default_value_t = 10)]
    pub max_height: u32,

    /// Number of persistence worker tasks flushing the repository to disk.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = 2)]
    pub num_workers: usize,

    /// Capacity of the channel between a stream producer and the gRPC
    /// response stream.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 8)]
    pub stream_buffer_size: usize,

    /// Delay between successive items of a server stream, in milliseconds.
    /// `0` disables pacing.
    ///
    /// Environment variable: `STREAM_DELAY_MS`
    #[arg(long, env = "STREAM_DELAY_MS", default_value_t = 1000)]
    pub stream_delay_ms: u64,

    /// How often the health toggler re-asserts `SERVING`, in seconds.
    ///
    /// Environment variable: `HEALTH_INTERVAL_SECS`
    #[arg(long, env = "HEALTH_INTERVAL_SECS", default_value_t = 5)]
    pub health_interval_secs: u64,

    /// Service name reported through `grpc.health.v1.Health`.
    ///
    /// Environment variable: `HEALTH_SERVICE_NAME`
    #[arg(long, env = "HEALTH_SERVICE_NAME", default_value_t = String::from("shapes.ShapeService"))]
    pub health_service_name: String,

    /// Metadata key carrying the shared secret.
    ///
    /// Environment variable: `SIGNATURE_HEADER`
    #[arg(long, env = "SIGNATURE_HEADER", default_value_t = String::from("x-signature"))]
    pub signature_header: String,

    /// Shared secret every shape call must present.
    ///
    /// Environment variable: `SIGNATURE_VALUE`
    #[arg(long, env = "SIGNATURE_VALUE", hide_env_values = true)]
    pub signature_value: String,

    /// PEM certificate chain. Enables TLS together with `TLS_KEY`.
    ///
    /// Environment variable: `TLS_CERT`
    #[arg(long, env = "TLS_CERT")]
    pub tls_cert: Option<PathBuf>,

    /// PEM private key matching `TLS_CERT`.
    ///
    /// Environment variable: `TLS_KEY`
    #[arg(long, env = "TLS_KEY")]
    pub tls_key: Option<PathBuf>,

    /// Upper bound on waiting for persistence workers during shutdown, in
    /// seconds.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT_SECS`
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 3)]
    pub shutdown_timeout_secs: u64,
}

/// Certificate and key paths, loaded as opaque PEM blobs at startup.
#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// The shared-secret pair checked by the authentication interceptor.
#[derive(Clone)]
pub struct Signature {
    pub header: AsciiMetadataKey,
    pub value: AsciiMetadataValue,
}

impl core::fmt::Debug for Signature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Signature")
            .field("header", &self.header)
            .field("value", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub db_path: PathBuf,
    pub max_width: u32,
    pub max_height: u32,
    pub num_workers: usize,
    pub stream_buffer_size: usize,
    pub stream_delay: Duration,
    pub health_interval: Duration,
    pub health_service_name: String,
    pub signature: Signature,
    pub tls: Option<TlsPaths>,
    pub shutdown_timeout: Duration,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max_width == 0 || args.max_height == 0 {
            bail!("MAX_WIDTH and MAX_HEIGHT must be greater than 0");
        }
        // Doubled widths/heights must still fit an i32 coordinate.
        if args.max_width > i32::MAX as u32 / 2 || args.max_height > i32::MAX as u32 / 2 {
            bail!("MAX_WIDTH and MAX_HEIGHT must be at most {}", i32::MAX / 2);
        }
        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }
        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }
        if args.health_interval_secs == 0 {
            bail!("HEALTH_INTERVAL_SECS must be greater than 0");
        }

        let header = AsciiMetadataKey::from_bytes(args.signature_header.as_bytes())
            .with_context(|| {
                format!(
                    "SIGNATURE_HEADER `{}` is not a valid metadata key",
                    args.signature_header
                )
            })?;
        let value = AsciiMetadataValue::try_from(args.signature_value.as_str())
            .context("SIGNATURE_VALUE is not a valid ASCII metadata value")?;
        if value.is_empty() {
            bail!("SIGNATURE_VALUE must not be empty");
        }

        let tls = match (args.tls_cert, args.tls_key) {
            (Some(cert), Some(key)) => Some(TlsPaths { cert, key }),
            (None, None) => None,
            _ => bail!("TLS_CERT and TLS_KEY must be provided together"),
        };

        Ok(Self {
            server_addr: args.server_addr,
            db_path: args.db_path,
            max_width: args.max_width,
            max_height: args.max_height,
            num_workers: args.num_workers,
            stream_buffer_size: args.stream_buffer_size,
            stream_delay: Duration::from_millis(args.stream_delay_ms),
            health_interval: Duration::from_secs(args.health_interval_secs),
            health_service_name: args.health_service_name,
            signature: Signature { header, value },
            tls,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> anyhow::Result<ServerConfig> {
        let mut argv = vec!["shapes-tonic-server", "--signature-value", "s3cret"];
        argv.extend_from_slice(extra);
        ServerConfig::try_from(CliArgs::try_parse_from(argv)?)
    }

    #[test]
    fn defaults_are_valid() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.stream_delay, Duration::from_secs(1));
        assert_eq!(config.health_interval, Duration::from_secs(5));
        assert_eq!(config.signature.header.as_str(), "x-signature");
        assert!(config.tls.is_none());
    }

    #[test]
    fn rejects_zero_bounds() {
        assert!(parse(&["--max-width", "0"]).is_err());
        assert!(parse(&["--num-workers", "0"]).is_err());
        assert!(parse(&["--stream-buffer-size", "0"]).is_err());
    }

    #[test]
    fn rejects_bad_signature_header() {
        assert!(parse(&["--signature-header", "Not A Header"]).is_err());
        assert!(parse(&["--signature-header", "x-token-bin"]).is_err());
    }

    #[test]
    fn tls_paths_come_in_pairs() {
        assert!(parse(&["--tls-cert", "cert.pem"]).is_err());
        let config = parse(&["--tls-cert", "cert.pem", "--tls-key", "key.pem"]).unwrap();
        assert!(config.tls.is_some());
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let config = parse(&[]).unwrap();
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
