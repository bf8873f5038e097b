//! Core data model for a validation run
//!
//! Sources and channels are read-only inputs for one run. Probe outcomes and
//! source results are created during the run and dropped after aggregation.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

pub mod catalog;

pub use catalog::{Catalog, CheckSummary};

/// Transport protocol of a source, derived from its URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
    Rtmp,
    Unsupported,
}

impl Protocol {
    /// Classify a URL by scheme. Unparseable URLs are unsupported.
    pub fn from_url(url: &str) -> Self {
        match Url::parse(url.trim()) {
            Ok(parsed) => match parsed.scheme() {
                "http" => Self::Http,
                "https" => Self::Https,
                "rtmp" | "rtmps" | "rtmpe" | "rtmpt" => Self::Rtmp,
                _ => Self::Unsupported,
            },
            Err(_) => Self::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Rtmp => "rtmp",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stage sequence a run applies
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Reachability, content signature and stream inspection
    #[default]
    Structural,
    /// Reachability followed by a bounded playback session
    Behavioral,
}

/// The closed set of stage probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Reachability,
    ContentSignature,
    MediaStructure,
    Behavioral,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reachability => "reachability",
            Self::ContentSignature => "content_signature",
            Self::MediaStructure => "media_structure",
            Self::Behavioral => "behavioral",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a probe did not pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The scheme has no stage sequence
    Unsupported,
    /// Timeouts, connection resets, rate limiting. Retryable.
    Transient,
    /// Bad status, format mismatch, decoder or player rejection
    Rejected,
    /// Playback output matched neither vocabulary
    Indeterminate,
}

/// Result of one stage invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub passed: bool,
    pub reason: String,
    pub elapsed_ms: f64,
    pub failure: Option<FailureKind>,
}

impl ProbeOutcome {
    pub fn pass<S: Into<String>>(reason: S) -> Self {
        Self {
            passed: true,
            reason: reason.into(),
            elapsed_ms: 0.0,
            failure: None,
        }
    }

    pub fn fail<S: Into<String>>(kind: FailureKind, reason: S) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
            elapsed_ms: 0.0,
            failure: Some(kind),
        }
    }

    pub fn transient<S: Into<String>>(reason: S) -> Self {
        Self::fail(FailureKind::Transient, reason)
    }

    pub fn rejected<S: Into<String>>(reason: S) -> Self {
        Self::fail(FailureKind::Rejected, reason)
    }

    pub fn indeterminate<S: Into<String>>(reason: S) -> Self {
        Self::fail(FailureKind::Indeterminate, reason)
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: f64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    pub fn is_transient(&self) -> bool {
        self.failure == Some(FailureKind::Transient)
    }
}

/// One candidate stream URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    pub url: String,
    pub protocol: Protocol,
}

impl Source {
    pub fn new<S: Into<String>>(url: S) -> Self {
        let url = url.into();
        let protocol = Protocol::from_url(&url);
        Self { url, protocol }
    }
}

/// A named collection of candidate sources for the same program
#[derive(Debug, Clone)]
pub struct Channel {
    pub name: String,
    pub sources: Vec<Source>,
}

impl Channel {
    pub fn new<S: Into<String>>(name: S, urls: impl IntoIterator<Item = String>) -> Self {
        Self {
            name: name.into(),
            sources: urls.into_iter().map(Source::new).collect(),
        }
    }
}

/// Final verdict for one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceResult {
    pub url: String,
    pub valid: bool,
    pub message: String,
    /// Wall-clock time of the whole stage chain; infinite when invalid
    pub latency_ms: f64,
    /// Stage that rejected the source, if a stage did
    pub failed_stage: Option<Stage>,
}

impl SourceResult {
    pub fn valid<U: Into<String>, M: Into<String>>(url: U, message: M, latency_ms: f64) -> Self {
        Self {
            url: url.into(),
            valid: true,
            message: message.into(),
            latency_ms,
            failed_stage: None,
        }
    }

    pub fn invalid<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self {
            url: url.into(),
            valid: false,
            message: message.into(),
            latency_ms: f64::INFINITY,
            failed_stage: None,
        }
    }

    pub fn with_failed_stage(mut self, stage: Stage) -> Self {
        self.failed_stage = Some(stage);
        self
    }
}

/// Surviving sources of one channel, fastest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelResult {
    pub name: String,
    pub ordered_valid_urls: Vec<String>,
}
