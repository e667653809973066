use core::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic_health::{ServingStatus, server::HealthReporter};

/// Periodically re-asserts `SERVING` for `service_name` until `token` is
/// cancelled.
///
/// This is the hook for real dependency checks; today the service has no
/// external dependencies, so it always reports `SERVING`. The first tick fires
/// immediately.
pub async fn toggle_health(
    reporter: HealthReporter,
    service_name: String,
    interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = token.cancelled() => break,
            _ = ticker.tick() => {
                let status = ServingStatus::Serving;
                reporter.set_service_status(&service_name, status).await;
                tracing::info!(service = %service_name, "Health Status: {status:?}");
            }
        }
    }

    tracing::debug!(service = %service_name, "Health toggler stopped");
}

/// Cancels the toggler and waits for it to stop. A panicked or aborted
/// toggler is logged rather than propagated.
pub async fn stop_toggle(token: CancellationToken, toggler: JoinHandle<()>) {
    token.cancel();
    if let Err(e) = toggler.await {
        tracing::error!("Health toggler failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::{Code, Request};
    use tonic_health::{
        pb::{HealthCheckRequest, health_check_response, health_server::Health},
        server::HealthService,
    };

    async fn check(service: &HealthService, name: &str) -> Result<health_check_response::ServingStatus, Code> {
        service
            .check(Request::new(HealthCheckRequest {
                service: name.to_string(),
            }))
            .await
            .map(|r| r.into_inner().status())
            .map_err(|s| s.code())
    }

    #[tokio::test(start_paused = true)]
    async fn reasserts_serving_until_cancelled() {
        let reporter = HealthReporter::new();
        let service = HealthService::from_health_reporter(reporter.clone());
        let token = CancellationToken::new();

        assert_eq!(check(&service, "shapes.ShapeService").await, Err(Code::NotFound));

        let handle = tokio::spawn(toggle_health(
            reporter.clone(),
            "shapes.ShapeService".to_string(),
            Duration::from_secs(5),
            token.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(
            check(&service, "shapes.ShapeService").await,
            Ok(health_check_response::ServingStatus::Serving)
        );

        // Something else flips the status; the next tick restores it.
        reporter
            .set_service_status("shapes.ShapeService", ServingStatus::NotServing)
            .await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(
            check(&service, "shapes.ShapeService").await,
            Ok(health_check_response::ServingStatus::Serving)
        );

        token.cancel();
        handle.await.unwrap();

        reporter
            .set_service_status("shapes.ShapeService", ServingStatus::NotServing)
            .await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(
            check(&service, "shapes.ShapeService").await,
            Ok(health_check_response::ServingStatus::NotServing)
        );
    }

    #[tokio::test]
    async fn stopping_a_crashed_toggler_returns() {
        let crashed: JoinHandle<()> = tokio::spawn(async { panic!("toggler crashed") });
        tokio::task::yield_now().await;
        stop_toggle(CancellationToken::new(), crashed).await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_toggle_ends_a_running_toggler() {
        let reporter = HealthReporter::new();
        let token = CancellationToken::new();
        let toggler = tokio::spawn(toggle_health(
            reporter,
            "shapes.ShapeService".to_string(),
            Duration::from_secs(5),
            token.clone(),
        ));
        stop_toggle(token.clone(), toggler).await;
        assert!(token.is_cancelled());
    }
}
