use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use core::time::Duration;
use shapes_tonic_core::{
    shape_id::{normalize_shape_id, parse_min_perimeter},
    types::ShapeKind,
};
use std::path::PathBuf;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue};

/// Upper bound for the delay between two health check attempts.
pub const MAX_HEALTH_BACKOFF: Duration = Duration::from_secs(5);

/// Command-line client for the shape service.
///
/// Connection settings come from CLI arguments or environment variables (a
/// `.env` file is loaded first). Every call is preceded by a health check and
/// carries the shared signature.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Server URL, `http://` or `https://`
    #[arg(long, env = "SERVER_URL", default_value = "http://127.0.0.1:50051")]
    pub server_url: String,

    /// Metadata key that carries the shared signature
    #[arg(long, env = "SIGNATURE_HEADER", default_value = "x-signature")]
    pub signature_header: String,

    /// Shared signature expected by the server
    #[arg(long, env = "SIGNATURE_VALUE", hide_env_values = true)]
    pub signature_value: String,

    /// PEM bundle used to verify the server certificate
    #[arg(long, env = "TLS_CA")]
    pub tls_ca: Option<PathBuf>,

    /// Domain name expected in the server certificate
    #[arg(long, env = "TLS_DOMAIN")]
    pub tls_domain: Option<String>,

    /// Deadline of each shape call, in seconds
    #[arg(long, env = "RPC_TIMEOUT_SECS", default_value_t = 30)]
    pub rpc_timeout_secs: u64,

    /// Deadline of each health check, in seconds
    #[arg(long, env = "HEALTH_TIMEOUT_SECS", default_value_t = 5)]
    pub health_timeout_secs: u64,

    /// Health checks attempted before the server is declared unreachable
    #[arg(long, env = "MAX_HEALTH_ATTEMPTS", default_value_t = 5)]
    pub max_health_attempts: u32,

    /// Base of the exponential backoff between health checks; 0 disables it
    #[arg(long, env = "HEALTH_BACKOFF_MS", default_value_t = 200)]
    pub health_backoff_ms: u64,

    /// Service name queried on the health endpoint
    #[arg(long, env = "HEALTH_SERVICE_NAME", default_value = "shapes.ShapeService")]
    pub health_service_name: String,

    /// Pause between two shape ids of a client stream, in milliseconds
    #[arg(long, env = "SEND_INTERVAL_MS", default_value_t = 500)]
    pub send_interval_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a randomized shape (Triangle, Rectangle or Pentagon, or T/R/P)
    Create {
        #[arg(value_parser = parse_shape_kind)]
        shape_type: ShapeKind,
    },
    /// Retrieve one shape, e.g. `T-2`
    Get {
        #[arg(value_parser = normalize_shape_id)]
        shape_id: String,
    },
    /// Stream every shape whose perimeter is greater than the minimum
    Perimeters {
        #[arg(allow_negative_numbers = true, value_parser = parse_min_perimeter)]
        min_perimeter: f64,
    },
    /// Sum the areas of the given shapes
    TotalArea {
        #[arg(required = true, value_parser = normalize_shape_id)]
        shape_ids: Vec<String>,
    },
    /// Retrieve the area of each of the given shapes
    Areas {
        #[arg(required = true, value_parser = normalize_shape_id)]
        shape_ids: Vec<String>,
    },
}

/// Accepts a full type name or its letter, in any case.
fn parse_shape_kind(input: &str) -> Result<ShapeKind, String> {
    let input = input.trim();
    let mut chars = input.chars();
    if let (Some(letter), None) = (chars.next(), chars.next()) {
        if let Some(kind) = ShapeKind::from_letter(letter.to_ascii_uppercase()) {
            return Ok(kind);
        }
    }
    ShapeKind::ALL
        .into_iter()
        .find(|kind| kind.type_name().eq_ignore_ascii_case(input))
        .ok_or_else(|| format!("{input} is an invalid shape. Please choose a valid shape."))
}

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
pub struct ClientTls {
    pub ca: PathBuf,
    pub domain: Option<String>,
}

/// How the client waits for the server to report `SERVING`.
#[derive(Debug, Clone)]
pub struct HealthPolicy {
    pub service_name: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl HealthPolicy {
    /// Delay slept after the `attempt`-th failure: `base * 2^(attempt - 1)`,
    /// capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.backoff_base
            .saturating_mul(factor)
            .min(self.backoff_cap)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub signature: Signature,
    pub tls: Option<ClientTls>,
    pub rpc_timeout: Duration,
    pub health: HealthPolicy,
    pub send_interval: Duration,
}

impl TryFrom<CliArgs> for ClientConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max_health_attempts == 0 {
            bail!("MAX_HEALTH_ATTEMPTS must be greater than 0");
        }
        if args.rpc_timeout_secs == 0 || args.health_timeout_secs == 0 {
            bail!("RPC_TIMEOUT_SECS and HEALTH_TIMEOUT_SECS must be greater than 0");
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

        let tls = match (args.tls_ca, args.tls_domain) {
            (Some(ca), domain) => Some(ClientTls { ca, domain }),
            (None, None) => None,
            (None, Some(_)) => bail!("TLS_DOMAIN requires TLS_CA"),
        };
        if tls.is_some() && !args.server_url.starts_with("https://") {
            bail!("TLS_CA requires an https:// SERVER_URL");
        }

        Ok(Self {
            server_url: args.server_url,
            signature: Signature { header, value },
            tls,
            rpc_timeout: Duration::from_secs(args.rpc_timeout_secs),
            health: HealthPolicy {
                service_name: args.health_service_name,
                timeout: Duration::from_secs(args.health_timeout_secs),
                max_attempts: args.max_health_attempts,
                backoff_base: Duration::from_millis(args.health_backoff_ms),
                backoff_cap: MAX_HEALTH_BACKOFF,
            },
            send_interval: Duration::from_millis(args.send_interval_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Result<CliArgs, clap::Error> {
        let mut full = vec!["shapes-tonic-client", "--signature-value", "s3cret"];
        full.extend_from_slice(argv);
        CliArgs::try_parse_from(full)
    }

    #[test]
    fn shape_ids_are_normalized_while_parsing() {
        let parsed = args(&["total-area", "t-03", "R-1", "p-0"]).unwrap();
        assert_eq!(
            parsed.command,
            Command::TotalArea {
                shape_ids: vec!["T-3".to_string(), "R-1".to_string(), "P-0".to_string()]
            }
        );
    }

    #[test]
    fn malformed_shape_ids_never_reach_the_server() {
        assert!(args(&["get", "T3"]).is_err());
        assert!(args(&["get", "T--3"]).is_err());
        assert!(args(&["areas", "T-1", "TR-2"]).is_err());
    }

    #[test]
    fn shape_kinds_accept_letters_and_names() {
        for (input, kind) in [
            ("t", ShapeKind::Triangle),
            ("RECTANGLE", ShapeKind::Rectangle),
            ("Pentagon", ShapeKind::Pentagon),
        ] {
            let parsed = args(&["create", input]).unwrap();
            assert_eq!(parsed.command, Command::Create { shape_type: kind });
        }
        assert!(args(&["create", "hexagon"]).is_err());
    }

    #[test]
    fn perimeters_accept_negative_and_round() {
        let parsed = args(&["perimeters", "-1"]).unwrap();
        assert_eq!(parsed.command, Command::Perimeters { min_perimeter: -1.0 });

        let parsed = args(&["perimeters", "12.346"]).unwrap();
        assert_eq!(parsed.command, Command::Perimeters { min_perimeter: 12.35 });

        assert!(args(&["perimeters", "lots"]).is_err());
    }

    #[test]
    fn defaults_are_valid() {
        let config = ClientConfig::try_from(args(&["get", "T-0"]).unwrap()).unwrap();
        assert_eq!(config.health.max_attempts, 5);
        assert_eq!(config.send_interval, Duration::from_millis(500));
        assert!(config.tls.is_none());
    }

    #[test]
    fn rejects_zero_attempts() {
        let parsed = args(&["--max-health-attempts", "0", "get", "T-0"]).unwrap();
        assert!(ClientConfig::try_from(parsed).is_err());
    }

    #[test]
    fn tls_requires_https() {
        let parsed = args(&["--tls-ca", "ca.pem", "get", "T-0"]).unwrap();
        assert!(ClientConfig::try_from(parsed).is_err());

        let parsed = args(&[
            "--server-url",
            "https://shapes.local:50051",
            "--tls-ca",
            "ca.pem",
            "get",
            "T-0",
        ])
        .unwrap();
        let config = ClientConfig::try_from(parsed).unwrap();
        assert_eq!(config.tls.unwrap().ca, PathBuf::from("ca.pem"));
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let policy = HealthPolicy {
            service_name: String::new(),
            timeout: Duration::from_secs(1),
            max_attempts: 10,
            backoff_base: Duration::from_millis(100),
            backoff_cap: Duration::from_millis(700),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(4), Duration::from_millis(700));
        assert_eq!(policy.backoff(40), Duration::from_millis(700));
    }
}
