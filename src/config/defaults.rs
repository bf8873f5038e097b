/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
use std::time::Duration;

// Validation defaults
pub const DEFAULT_MAX_WORKERS: usize = 20;
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(60);

// Retry defaults
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

// HTTP defaults
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_USER_AGENT: &str = "AptvPlayer/1.4.6";
pub const DEFAULT_ACCEPTABLE_STATUS: &[&str] = &["2xx"];
pub const DEFAULT_MAX_REDIRECTS: usize = 10;
pub const DEFAULT_BODY_PREFIX_BYTES: usize = 1024;

// External tool defaults
pub const DEFAULT_FFPROBE_COMMAND: &str = "ffprobe";
pub const DEFAULT_FFMPEG_COMMAND: &str = "ffmpeg";
pub const DEFAULT_INSPECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PLAYBACK_RUN_TIME: Duration = Duration::from_secs(8);
pub const DEFAULT_PLAYBACK_GRACE: Duration = Duration::from_secs(5);
pub const DEFAULT_CLIENT_SIGNATURE: &str = "AptvPlayer/1.4.6";

// Behavioral probe vocabularies (matched case-insensitively)
pub const DEFAULT_SUCCESS_VOCABULARY: &[&str] = &[
    "Stream #0:",
    "Output #0",
    "Opening 'http",
    "frame=",
    "size=",
    "video:",
];
pub const DEFAULT_FAILURE_VOCABULARY: &[&str] = &[
    "Connection refused",
    "Connection timed out",
    "Server returned 4",
    "Server returned 5",
    "403 Forbidden",
    "404 Not Found",
    "Invalid data found",
    "No such file or directory",
    "Input/output error",
    "Error opening input",
    "Failed to resolve hostname",
    "Unable to open resource",
    "could not find codec parameters",
];

// Catalog defaults
pub const DEFAULT_INPUT_PATH: &str = "iptv_sources.json";
pub const DEFAULT_OUTPUT_PATH: &str = "data/iptv_data.json";
pub const DEFAULT_CONFIG_PATH: &str = "iptv-checker.toml";
