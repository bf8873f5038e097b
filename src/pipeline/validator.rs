//! Per-source validation
//!
//! Walks a source through its stage plan, retrying transient stage failures
//! and stopping at the first stage that does not pass. Exactly one
//! [`SourceResult`] comes out for every source.

use tokio::time::Instant;
use tracing::debug;

use crate::config::{Config, RetryConfig};
use crate::models::{FailureKind, Source, SourceResult, ValidationMode};
use crate::pipeline::dispatcher::stage_plan;
use crate::pipeline::retry::with_retry;
use crate::pipeline::stages::{StageRunner, StageSettings};
use crate::services::traits::{Capabilities, HttpProbeResponse};
use crate::utils::url::UrlUtils;

pub const UNSUPPORTED_PROTOCOL: &str = "unsupported protocol";

pub struct SourceValidator {
    runner: StageRunner,
    retry: RetryConfig,
    mode: ValidationMode,
}

impl SourceValidator {
    pub fn new(runner: StageRunner, retry: RetryConfig, mode: ValidationMode) -> Self {
        Self {
            runner,
            retry,
            mode,
        }
    }

    pub fn from_config(capabilities: Capabilities, config: &Config) -> Self {
        Self::new(
            StageRunner::new(capabilities, StageSettings::from_config(config)),
            config.retry.clone(),
            config.validation.mode,
        )
    }

    pub async fn validate(&self, source: &Source) -> SourceResult {
        let plan = stage_plan(source.protocol, self.mode);
        if plan.is_empty() {
            debug!(
                "Skipping {}: {:?}",
                UrlUtils::obfuscate_credentials(&source.url),
                FailureKind::Unsupported
            );
            return SourceResult::invalid(&source.url, UNSUPPORTED_PROTOCOL);
        }

        let started = Instant::now();
        let mut captured: Option<HttpProbeResponse> = None;
        let mut last_reason = String::new();

        for &stage in plan {
            let previous = captured.as_ref();
            let report = with_retry(
                &self.retry,
                move || self.runner.run(stage, source, previous),
                stage.as_str(),
            )
            .await;

            if !report.outcome.passed {
                debug!(
                    "Source {} failed at {}: {}",
                    UrlUtils::obfuscate_credentials(&source.url),
                    stage,
                    report.outcome.reason
                );
                return SourceResult::invalid(&source.url, report.outcome.reason)
                    .with_failed_stage(stage);
            }

            last_reason = report.outcome.reason;
            if report.response.is_some() {
                captured = report.response;
            }
        }

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        SourceResult::valid(&source.url, last_reason, latency_ms)
    }
}
