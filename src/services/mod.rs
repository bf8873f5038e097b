//! Capability services
//!
//! The validation pipeline reaches the outside world only through the traits
//! in [`traits`]. This module holds their production implementations: ffprobe
//! for stream inspection, ffmpeg for playback probing, plus the `-version`
//! pre-flight check for both tools. The HTTP reachability client lives in
//! [`crate::utils::http_client`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use iptv_checker::config::Config;
//! use iptv_checker::services::{Capabilities, FfmpegPlaybackProber, StreamProber};
//! use iptv_checker::utils::StandardHttpClient;
//!
//! # fn build() -> iptv_checker::errors::AppResult<Capabilities> {
//! let config = Config::default();
//! Ok(Capabilities::new(
//!     Arc::new(StandardHttpClient::new(&config.http)?),
//!     Arc::new(StreamProber::new(Some(config.tools.ffprobe_command.clone()))),
//!     Arc::new(FfmpegPlaybackProber::new(
//!         config.tools.ffmpeg_command.clone(),
//!         config.tools.playback_run_time,
//!     )),
//! ))
//! # }
//! ```

pub mod playback_prober;
pub mod stream_prober;
pub mod tool_check;
pub mod traits;

pub use playback_prober::FfmpegPlaybackProber;
pub use stream_prober::StreamProber;
pub use tool_check::{ToolInfo, check_tool_availability, ensure_required_tools};
pub use traits::{
    Capabilities, HttpProbeResponse, InspectionReport, PlaybackCapture, PlaybackProber,
    ProbeMethod, ReachabilityClient, StreamInspector,
};
