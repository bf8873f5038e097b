//! Reachability stage (HTTP/HTTPS)

use std::time::Duration;

use super::StageReport;
use crate::models::ProbeOutcome;
use crate::services::traits::{PROBE_TIMEOUT_ROUNDS, ReachabilityClient};
use crate::utils::{is_status_acceptable, is_transient_status};

pub async fn probe(
    client: &dyn ReachabilityClient,
    url: &str,
    timeout: Duration,
    acceptable_status: &[String],
) -> StageReport {
    // The client may spend the per-request timeout on each of its requests
    let budget = timeout * PROBE_TIMEOUT_ROUNDS;
    let response = match tokio::time::timeout(budget, client.probe(url, timeout)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) if e.is_transient() => return StageReport::from(ProbeOutcome::transient(e.to_string())),
        Ok(Err(e)) => return StageReport::from(ProbeOutcome::rejected(e.to_string())),
        Err(_) => {
            return StageReport::from(ProbeOutcome::transient(format!(
                "reachability probe timed out after {budget:?}"
            )));
        }
    };

    let status = response.status;
    if is_status_acceptable(status, acceptable_status) {
        StageReport::with_response(ProbeOutcome::pass(format!("HTTP {status}")), response)
    } else if is_transient_status(status) {
        StageReport::from(ProbeOutcome::transient(format!("HTTP {status}")))
    } else {
        StageReport::from(ProbeOutcome::rejected(format!(
            "HTTP {status} not acceptable"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ReachabilityError;
    use crate::models::FailureKind;
    use crate::services::traits::HttpProbeResponse;
    use async_trait::async_trait;

    struct FixedClient(Result<HttpProbeResponse, ReachabilityError>);

    #[async_trait]
    impl ReachabilityClient for FixedClient {
        async fn probe(
            &self,
            _url: &str,
            _timeout: Duration,
        ) -> Result<HttpProbeResponse, ReachabilityError> {
            self.0.clone()
        }
    }

    struct HangingClient;

    #[async_trait]
    impl ReachabilityClient for HangingClient {
        async fn probe(
            &self,
            _url: &str,
            _timeout: Duration,
        ) -> Result<HttpProbeResponse, ReachabilityError> {
            std::future::pending().await
        }
    }

    fn two_xx() -> Vec<String> {
        vec!["2xx".to_string()]
    }

    async fn run(client: FixedClient) -> StageReport {
        probe(&client, "http://a.example/x", Duration::from_secs(5), &two_xx()).await
    }

    #[tokio::test]
    async fn test_acceptable_status_passes_and_keeps_response() {
        let report = run(FixedClient(Ok(HttpProbeResponse::new(
            206,
            Some("video/mp2t"),
            b"",
        ))))
        .await;

        assert!(report.outcome.passed);
        assert_eq!(report.response.map(|r| r.status), Some(206));
    }

    #[tokio::test]
    async fn test_not_found_is_rejected() {
        let report = run(FixedClient(Ok(HttpProbeResponse::new(404, None, b"")))).await;
        assert_eq!(report.outcome.failure, Some(FailureKind::Rejected));
        assert!(report.outcome.reason.contains("404"));
        assert!(report.response.is_none());
    }

    #[tokio::test]
    async fn test_rate_limited_is_transient() {
        let report = run(FixedClient(Ok(HttpProbeResponse::new(429, None, b"")))).await;
        assert!(report.outcome.is_transient());
    }

    #[tokio::test]
    async fn test_transport_errors_are_classified() {
        let reset = run(FixedClient(Err(ReachabilityError::ConnectionReset(
            "reset by peer".into(),
        ))))
        .await;
        assert!(reset.outcome.is_transient());

        let refused = run(FixedClient(Err(ReachabilityError::Connect(
            "connection refused".into(),
        ))))
        .await;
        assert_eq!(refused.outcome.failure, Some(FailureKind::Rejected));

        let looped = run(FixedClient(Err(ReachabilityError::TooManyRedirects(
            "redirect loop".into(),
        ))))
        .await;
        assert_eq!(looped.outcome.failure, Some(FailureKind::Rejected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_client_times_out_transiently() {
        let report = probe(
            &HangingClient,
            "http://a.example/x",
            Duration::from_secs(5),
            &two_xx(),
        )
        .await;
        assert!(report.outcome.is_transient());
        assert!(report.outcome.reason.contains("timed out"));
    }

    #[tokio::test]
    async fn test_slow_head_refusal_then_slow_get_passes() {
        use crate::config::HttpConfig;
        use crate::utils::StandardHttpClient;
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(405).set_delay(Duration::from_millis(700)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(206)
                    .set_body_string("#EXTM3U\n")
                    .set_delay(Duration::from_millis(700)),
            )
            .mount(&server)
            .await;

        let client = StandardHttpClient::new(&HttpConfig::default()).unwrap();
        let report = probe(
            &client,
            &format!("{}/index.m3u8", server.uri()),
            Duration::from_secs(1),
            &two_xx(),
        )
        .await;

        assert!(report.outcome.passed, "{}", report.outcome.reason);
        assert_eq!(report.response.map(|r| r.status), Some(206));
    }
}
