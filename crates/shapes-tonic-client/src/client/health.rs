//! Health-check gate run before every call.
//!
//! [`await_serving`] polls a [`HealthGate`] until it reports `SERVING`.
//! Transient failures (`UNAVAILABLE`, `DEADLINE_EXCEEDED`, `UNKNOWN`) and any
//! non-serving status count as failed attempts; every second failed attempt
//! resets the gate's connection before the next try. Once `max_attempts`
//! attempts have failed the server is declared unreachable. Any other gRPC
//! status fails immediately.

use super::config::HealthPolicy;
use shapes_tonic_core::{Error, Result};
use tonic::{Code, Status};
use tonic_health::pb::health_check_response::ServingStatus;

/// Something that can be asked whether the server is serving.
#[tonic::async_trait]
pub trait HealthGate: Send {
    async fn check(&mut self, policy: &HealthPolicy) -> core::result::Result<ServingStatus, Status>;

    /// Tears down and recreates the underlying connection.
    fn reset(&mut self);
}

fn is_transient(code: Code) -> bool {
    matches!(
        code,
        Code::Unavailable | Code::DeadlineExceeded | Code::Unknown
    )
}

/// Returns the number of failed attempts that preceded `SERVING`.
pub async fn await_serving<P>(gate: &mut P, policy: &HealthPolicy) -> Result<u32>
where
    P: HealthGate + ?Sized,
{
    let mut attempts = 0;

    loop {
        let reason = match gate.check(policy).await {
            Ok(ServingStatus::Serving) => {
                tracing::debug!(attempts, "Server is serving");
                return Ok(attempts);
            }
            Ok(status) => format!("{status:?}"),
            Err(status) if is_transient(status.code()) => {
                format!("{:?} - {}", status.code(), status.message())
            }
            Err(status) => {
                tracing::error!("Health check failed: {status}");
                return Err(Error::HealthCheck {
                    code: status.code(),
                    message: status.message().to_string(),
                });
            }
        };

        attempts += 1;
        tracing::warn!(
            attempts,
            max_attempts = policy.max_attempts,
            "Health check not serving: {reason}"
        );

        if attempts >= policy.max_attempts {
            return Err(Error::ServerUnreachable { attempts });
        }
        if attempts % 2 == 0 {
            tracing::info!("Resetting channel");
            gate.reset();
        }

        let delay = policy.backoff(attempts);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use std::collections::VecDeque;

    /// Replays canned outcomes, then reports `SERVING` forever.
    struct ScriptedGate {
        outcomes: VecDeque<core::result::Result<ServingStatus, Status>>,
        checks: u32,
        resets_after: Vec<u32>,
    }

    impl ScriptedGate {
        fn new(outcomes: Vec<core::result::Result<ServingStatus, Status>>) -> Self {
            Self {
                outcomes: outcomes.into(),
                checks: 0,
                resets_after: Vec::new(),
            }
        }

        fn failing_forever() -> Self {
            Self::new((0..64).map(|_| Err(Status::unavailable("down"))).collect())
        }
    }

    #[tonic::async_trait]
    impl HealthGate for ScriptedGate {
        async fn check(
            &mut self,
            _policy: &HealthPolicy,
        ) -> core::result::Result<ServingStatus, Status> {
            self.checks += 1;
            self.outcomes.pop_front().unwrap_or(Ok(ServingStatus::Serving))
        }

        fn reset(&mut self) {
            self.resets_after.push(self.checks);
        }
    }

    fn policy(max_attempts: u32, backoff_ms: u64) -> HealthPolicy {
        HealthPolicy {
            service_name: "shapes.ShapeService".to_string(),
            timeout: Duration::from_secs(1),
            max_attempts,
            backoff_base: Duration::from_millis(backoff_ms),
            backoff_cap: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn serving_on_first_check() {
        let mut gate = ScriptedGate::new(vec![]);
        assert_eq!(await_serving(&mut gate, &policy(3, 0)).await.unwrap(), 0);
        assert_eq!(gate.checks, 1);
        assert!(gate.resets_after.is_empty());
    }

    #[tokio::test]
    async fn recovers_before_max_attempts() {
        let mut gate = ScriptedGate::new(vec![
            Err(Status::unavailable("connecting")),
            Ok(ServingStatus::NotServing),
            Err(Status::deadline_exceeded("slow")),
            Err(Status::unknown("reset by peer")),
        ]);

        let attempts = await_serving(&mut gate, &policy(5, 0)).await.unwrap();
        assert_eq!(attempts, 4);
        assert_eq!(gate.checks, 5);
        // Reset after the 2nd and 4th failed attempts only.
        assert_eq!(gate.resets_after, [2, 4]);
    }

    #[tokio::test]
    async fn gives_up_after_exactly_max_attempts() {
        let mut gate = ScriptedGate::failing_forever();

        let err = await_serving(&mut gate, &policy(4, 0)).await.unwrap_err();
        assert!(matches!(err, Error::ServerUnreachable { attempts: 4 }));
        assert_eq!(gate.checks, 4);
        assert_eq!(gate.resets_after, [2]);
    }

    #[tokio::test]
    async fn single_attempt_never_resets() {
        let mut gate = ScriptedGate::failing_forever();

        let err = await_serving(&mut gate, &policy(1, 0)).await.unwrap_err();
        assert!(matches!(err, Error::ServerUnreachable { attempts: 1 }));
        assert!(gate.resets_after.is_empty());
    }

    #[tokio::test]
    async fn unexpected_status_fails_immediately() {
        let mut gate = ScriptedGate::new(vec![Err(Status::not_found("unknown service"))]);

        let err = await_serving(&mut gate, &policy(5, 0)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::HealthCheck {
                code: Code::NotFound,
                ..
            }
        ));
        assert_eq!(gate.checks, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backs_off_exponentially_between_attempts() {
        let mut gate = ScriptedGate::new(vec![
            Err(Status::unavailable("down")),
            Err(Status::unavailable("down")),
            Err(Status::unavailable("down")),
        ]);

        let start = tokio::time::Instant::now();
        await_serving(&mut gate, &policy(5, 100)).await.unwrap();
        // 100 + 200 + 400 ms
        assert_eq!(start.elapsed(), Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_base_disables_backoff() {
        let mut gate = ScriptedGate::new(vec![
            Err(Status::unavailable("down")),
            Ok(ServingStatus::ServiceUnknown),
        ]);

        let start = tokio::time::Instant::now();
        await_serving(&mut gate, &policy(5, 0)).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
