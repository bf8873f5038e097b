//! Capability trait definitions
//!
//! Every external collaborator the validation pipeline depends on sits behind
//! one of these traits: the HTTP reachability client, the stream inspector
//! (ffprobe) and the playback prober (ffmpeg). Production implementations
//! live next to this module; tests substitute their own.
//!
//! # Examples
//!
//! ```rust
//! use async_trait::async_trait;
//! use std::time::Duration;
//! use iptv_checker::errors::CapabilityResult;
//! use iptv_checker::models::Protocol;
//! use iptv_checker::services::traits::{InspectionReport, StreamInspector};
//!
//! struct AlwaysH264;
//!
//! #[async_trait]
//! impl StreamInspector for AlwaysH264 {
//!     async fn inspect(
//!         &self,
//!         _url: &str,
//!         _timeout: Duration,
//!         _protocol: Protocol,
//!     ) -> CapabilityResult<InspectionReport> {
//!         Ok(InspectionReport::video("h264", None))
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{CapabilityResult, ReachabilityError};
use crate::models::Protocol;

/// How the reachability client obtained its response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Head,
    RangedGet,
}

/// Response captured by the reachability client
#[derive(Debug, Clone, PartialEq)]
pub struct HttpProbeResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// At most the first KiB of the body; empty for HEAD responses
    pub body_prefix: Vec<u8>,
    pub method: ProbeMethod,
}

impl HttpProbeResponse {
    pub fn new(status: u16, content_type: Option<&str>, body_prefix: &[u8]) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            headers: Vec::new(),
            body_prefix: body_prefix.to_vec(),
            method: if body_prefix.is_empty() {
                ProbeMethod::Head
            } else {
                ProbeMethod::RangedGet
            },
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the advertised content type is audio, video or an HLS playlist
    pub fn has_media_content_type(&self) -> bool {
        self.content_type.as_deref().is_some_and(|ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("video") || ct.contains("audio") || ct.contains("mpegurl")
        })
    }
}

/// Per-request timeouts one reachability probe may use: the HEAD, the
/// ranged GET and the GET body read
pub const PROBE_TIMEOUT_ROUNDS: u32 = 3;

/// Lightweight HTTP probe of a source
///
/// `timeout` bounds each request the client issues, not the probe as a whole.
#[async_trait]
pub trait ReachabilityClient: Send + Sync {
    async fn probe(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<HttpProbeResponse, ReachabilityError>;
}

/// What the stream inspector reported about a source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectionReport {
    /// Process exited successfully and reported no error section
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Codec of the first video stream
    pub codec_name: Option<String>,
    /// Container duration in seconds, when the inspector reports one
    pub duration_seconds: Option<f64>,
    pub format_name: Option<String>,
    /// Error text from the inspector, if any
    pub error_text: Option<String>,
}

impl InspectionReport {
    pub fn video(codec: &str, duration_seconds: Option<f64>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            codec_name: Some(codec.to_string()),
            duration_seconds,
            format_name: None,
            error_text: None,
        }
    }

    pub fn failed(exit_code: i32, error_text: &str) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            error_text: Some(error_text.to_string()),
            ..Self::default()
        }
    }
}

/// Codec-level inspection of a source, bounded by a hard timeout
#[async_trait]
pub trait StreamInspector: Send + Sync {
    async fn inspect(
        &self,
        url: &str,
        timeout: Duration,
        protocol: Protocol,
    ) -> CapabilityResult<InspectionReport>;
}

/// Output of a bounded playback session
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackCapture {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// stdout and stderr, combined
    pub output: String,
}

/// Opens a source headless for a bounded run
#[async_trait]
pub trait PlaybackProber: Send + Sync {
    async fn probe(
        &self,
        url: &str,
        timeout: Duration,
        client_signature: &str,
        protocol: Protocol,
    ) -> CapabilityResult<PlaybackCapture>;
}

/// The set of capabilities a validation run uses
#[derive(Clone)]
pub struct Capabilities {
    pub reachability: Arc<dyn ReachabilityClient>,
    pub inspector: Arc<dyn StreamInspector>,
    pub playback: Arc<dyn PlaybackProber>,
}

impl Capabilities {
    pub fn new(
        reachability: Arc<dyn ReachabilityClient>,
        inspector: Arc<dyn StreamInspector>,
        playback: Arc<dyn PlaybackProber>,
    ) -> Self {
        Self {
            reachability,
            inspector,
            playback,
        }
    }
}
