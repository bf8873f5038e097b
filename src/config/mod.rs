use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

use crate::errors::{AppError, AppResult};
use crate::models::ValidationMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
}

/// Orchestration settings for a validation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Maximum number of validations in flight at once, across all channels
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Upper bound for one source's whole stage chain
    #[serde(default = "default_check_timeout", with = "duration_serde::duration")]
    pub check_timeout: Duration,
    /// Optional deadline for a whole channel batch
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "duration_serde::option_duration"
    )]
    pub batch_deadline: Option<Duration>,
    /// Which stage sequence HTTP and RTMP sources go through
    #[serde(default)]
    pub mode: ValidationMode,
}

/// Retry behaviour for transient stage failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per stage, first try included
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,
    /// Fixed pause between attempts
    #[serde(default = "default_retry_delay", with = "duration_serde::duration")]
    pub delay: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout", with = "duration_serde::duration")]
    pub timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Status patterns such as "2xx" or "206"
    #[serde(default = "default_acceptable_status")]
    pub acceptable_status: Vec<String>,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// FFprobe command to use for stream inspection.
    /// Can be a full path (/usr/bin/ffprobe) or command name (ffprobe)
    #[serde(default = "default_ffprobe_command")]
    pub ffprobe_command: String,
    /// FFmpeg command to use for playback probing
    #[serde(default = "default_ffmpeg_command")]
    pub ffmpeg_command: String,
    #[serde(default = "default_inspect_timeout", with = "duration_serde::duration")]
    pub inspect_timeout: Duration,
    /// How long the playback probe decodes before stopping on its own
    #[serde(default = "default_playback_run_time", with = "duration_serde::duration")]
    pub playback_run_time: Duration,
    /// Extra wall-clock time granted on top of the run time before the player is killed
    #[serde(default = "default_playback_grace", with = "duration_serde::duration")]
    pub playback_grace: Duration,
    #[serde(default = "default_client_signature")]
    pub client_signature: String,
}

/// Terms used to classify playback output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    #[serde(default = "default_success_vocabulary")]
    pub success: Vec<String>,
    #[serde(default = "default_failure_vocabulary")]
    pub failure: Vec<String>,
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_check_timeout() -> Duration {
    DEFAULT_CHECK_TIMEOUT
}

fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

fn default_retry_delay() -> Duration {
    DEFAULT_RETRY_DELAY
}

fn default_http_timeout() -> Duration {
    DEFAULT_HTTP_TIMEOUT
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_acceptable_status() -> Vec<String> {
    DEFAULT_ACCEPTABLE_STATUS.iter().map(|s| s.to_string()).collect()
}

fn default_max_redirects() -> usize {
    DEFAULT_MAX_REDIRECTS
}

fn default_ffprobe_command() -> String {
    DEFAULT_FFPROBE_COMMAND.to_string()
}

fn default_ffmpeg_command() -> String {
    DEFAULT_FFMPEG_COMMAND.to_string()
}

fn default_inspect_timeout() -> Duration {
    DEFAULT_INSPECT_TIMEOUT
}

fn default_playback_run_time() -> Duration {
    DEFAULT_PLAYBACK_RUN_TIME
}

fn default_playback_grace() -> Duration {
    DEFAULT_PLAYBACK_GRACE
}

fn default_client_signature() -> String {
    DEFAULT_CLIENT_SIGNATURE.to_string()
}

fn default_success_vocabulary() -> Vec<String> {
    DEFAULT_SUCCESS_VOCABULARY.iter().map(|s| s.to_string()).collect()
}

fn default_failure_vocabulary() -> Vec<String> {
    DEFAULT_FAILURE_VOCABULARY.iter().map(|s| s.to_string()).collect()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            check_timeout: default_check_timeout(),
            batch_deadline: None,
            mode: ValidationMode::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            delay: default_retry_delay(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_http_timeout(),
            user_agent: default_user_agent(),
            acceptable_status: default_acceptable_status(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffprobe_command: default_ffprobe_command(),
            ffmpeg_command: default_ffmpeg_command(),
            inspect_timeout: default_inspect_timeout(),
            playback_run_time: default_playback_run_time(),
            playback_grace: default_playback_grace(),
            client_signature: default_client_signature(),
        }
    }
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            success: default_success_vocabulary(),
            failure: default_failure_vocabulary(),
        }
    }
}

impl Config {
    /// Load the config file, writing the defaults out if it does not exist
    ///
    /// Values are not validated here; command-line overrides still apply.
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            let config: Self = toml::from_str(&contents)?;
            Ok(config)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }

    /// Apply command-line values over the file's
    pub fn apply_overrides(&mut self, workers: Option<usize>, mode: Option<ValidationMode>) {
        if let Some(workers) = workers {
            self.validation.max_workers = workers;
        }
        if let Some(mode) = mode {
            self.validation.mode = mode;
        }
    }

    /// Reject values that would make a run meaningless or unbounded
    pub fn validate(&self) -> AppResult<()> {
        if self.validation.max_workers == 0 {
            return Err(AppError::configuration(
                "validation.max_workers must be at least 1",
            ));
        }
        if self.validation.check_timeout.is_zero() {
            return Err(AppError::configuration(
                "validation.check_timeout must be greater than zero",
            ));
        }
        if self.http.timeout.is_zero() || self.tools.inspect_timeout.is_zero() {
            return Err(AppError::configuration(
                "http.timeout and tools.inspect_timeout must be greater than zero",
            ));
        }
        if self.http.acceptable_status.is_empty() {
            return Err(AppError::configuration(
                "http.acceptable_status must list at least one pattern",
            ));
        }
        Ok(())
    }
}
