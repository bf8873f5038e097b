//! Stage probe implementations
//!
//! Each stage is a free function over the capability it needs. The
//! [`StageRunner`] owns the capabilities and settings and dispatches a
//! [`Stage`] variant to its function, timing the invocation.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::config::Config;
use crate::models::{ProbeOutcome, Source, Stage};
use crate::pipeline::retry::Retryable;
use crate::services::traits::{Capabilities, HttpProbeResponse};
use crate::utils::url::UrlUtils;

pub mod behavioral;
pub mod reachability;
pub mod signature;
pub mod structure;

pub use behavioral::{PlaybackVerdict, Vocabulary, classify_output};
pub use signature::{MediaSignature, sniff};

/// Outcome of one stage plus whatever it captured for later stages
#[derive(Debug, Clone)]
pub struct StageReport {
    pub outcome: ProbeOutcome,
    pub response: Option<HttpProbeResponse>,
}

impl StageReport {
    pub fn with_response(outcome: ProbeOutcome, response: HttpProbeResponse) -> Self {
        Self {
            outcome,
            response: Some(response),
        }
    }
}

impl From<ProbeOutcome> for StageReport {
    fn from(outcome: ProbeOutcome) -> Self {
        Self {
            outcome,
            response: None,
        }
    }
}

impl Retryable for StageReport {
    fn is_retryable(&self) -> bool {
        self.outcome.is_retryable()
    }

    fn reason(&self) -> &str {
        self.outcome.reason()
    }

    fn exhausted(mut self, attempts: u32) -> Self {
        self.outcome = self.outcome.exhausted(attempts);
        self
    }
}

/// Per-stage limits and parameters
#[derive(Debug, Clone)]
pub struct StageSettings {
    pub http_timeout: Duration,
    pub acceptable_status: Vec<String>,
    pub inspect_timeout: Duration,
    /// Wall-clock limit for a playback session: run time plus grace
    pub playback_timeout: Duration,
    pub client_signature: String,
    pub vocabulary: Vocabulary,
}

impl StageSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http_timeout: config.http.timeout,
            acceptable_status: config.http.acceptable_status.clone(),
            inspect_timeout: config.tools.inspect_timeout,
            playback_timeout: config.tools.playback_run_time + config.tools.playback_grace,
            client_signature: config.tools.client_signature.clone(),
            vocabulary: Vocabulary::from(&config.vocabulary),
        }
    }
}

impl Default for StageSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Dispatches stages to their probes
pub struct StageRunner {
    capabilities: Capabilities,
    settings: StageSettings,
}

impl StageRunner {
    pub fn new(capabilities: Capabilities, settings: StageSettings) -> Self {
        Self {
            capabilities,
            settings,
        }
    }

    /// Run one stage for a source
    ///
    /// `response` is the reachability capture from an earlier stage, if any.
    pub async fn run(
        &self,
        stage: Stage,
        source: &Source,
        response: Option<&HttpProbeResponse>,
    ) -> StageReport {
        let started = Instant::now();

        let report = match stage {
            Stage::Reachability => {
                reachability::probe(
                    self.capabilities.reachability.as_ref(),
                    &source.url,
                    self.settings.http_timeout,
                    &self.settings.acceptable_status,
                )
                .await
            }
            Stage::ContentSignature => StageReport::from(signature::check(response)),
            Stage::MediaStructure => StageReport::from(
                structure::probe(
                    self.capabilities.inspector.as_ref(),
                    source,
                    self.settings.inspect_timeout,
                )
                .await,
            ),
            Stage::Behavioral => StageReport::from(
                behavioral::probe(
                    self.capabilities.playback.as_ref(),
                    source,
                    self.settings.playback_timeout,
                    &self.settings.client_signature,
                    &self.settings.vocabulary,
                )
                .await,
            ),
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "Stage {} for {}: passed={} ({:.1}ms) {}",
            stage,
            UrlUtils::obfuscate_credentials(&source.url),
            report.outcome.passed,
            elapsed_ms,
            report.outcome.reason
        );

        StageReport {
            outcome: report.outcome.with_elapsed_ms(elapsed_ms),
            response: report.response,
        }
    }
}
