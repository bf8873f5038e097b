//! Stream Inspection Service
//!
//! Runs ffprobe against a source and reduces its JSON report to what the
//! media structure stage needs: the first video codec, the container
//! duration and any structured error ffprobe emitted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::{CapabilityError, CapabilityResult};
use crate::models::Protocol;
use crate::services::traits::{InspectionReport, StreamInspector};
use crate::utils::url::UrlUtils;

/// Error information from ffprobe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeError {
    pub code: Option<i32>,
    pub string: Option<String>,
}

/// ffprobe-backed stream inspector
pub struct StreamProber {
    ffprobe_command: String,
}

impl StreamProber {
    pub fn new(ffprobe_command: Option<String>) -> Self {
        Self {
            ffprobe_command: ffprobe_command.unwrap_or_else(|| "ffprobe".to_string()),
        }
    }

    fn build_command(&self, url: &str, timeout: Duration) -> Command {
        let mut cmd = Command::new(&self.ffprobe_command);
        cmd.args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_type,codec_name,duration:format=format_name,duration",
            "-rw_timeout",
        ]);
        cmd.arg(timeout.as_micros().to_string());
        cmd.arg(url);

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // Dropping the output future on timeout must not leave ffprobe running
        cmd.kill_on_drop(true);
        cmd
    }

    /// Parse ffprobe JSON output into an inspection report
    fn parse_probe_result(
        &self,
        data: &serde_json::Value,
        exit_success: bool,
        exit_code: Option<i32>,
        stderr: &str,
    ) -> InspectionReport {
        let error = data.get("error").map(|error_obj| ProbeError {
            code: error_obj
                .get("code")
                .and_then(|v| v.as_i64())
                .map(|v| v as i32),
            string: error_obj
                .get("string")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        });

        let video_stream = data
            .get("streams")
            .and_then(|v| v.as_array())
            .and_then(|streams| {
                streams.iter().find(|stream| {
                    stream
                        .get("codec_type")
                        .and_then(|v| v.as_str())
                        .is_none_or(|t| t == "video")
                })
            });
        let codec_name = video_stream
            .and_then(|s| s.get("codec_name"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let format = data.get("format").and_then(|v| v.as_object());
        let format_name = format
            .and_then(|f| f.get("format_name"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let duration_seconds = format
            .and_then(|f| f.get("duration"))
            .or_else(|| video_stream.and_then(|s| s.get("duration")))
            .and_then(parse_duration_field);

        let error_text = error
            .as_ref()
            .and_then(|e| e.string.clone())
            .or_else(|| {
                let trimmed = stderr.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            });

        InspectionReport {
            success: exit_success && error.is_none(),
            exit_code,
            codec_name,
            duration_seconds,
            format_name,
            error_text,
        }
    }
}

/// ffprobe prints durations as strings ("10.000000", "N/A")
fn parse_duration_field(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[async_trait]
impl StreamInspector for StreamProber {
    async fn inspect(
        &self,
        url: &str,
        timeout: Duration,
        protocol: Protocol,
    ) -> CapabilityResult<InspectionReport> {
        let safe_url = UrlUtils::obfuscate_credentials(url);
        debug!("Inspecting {} stream: {}", protocol, safe_url);

        let output = tokio::time::timeout(timeout, self.build_command(url, timeout).output())
            .await
            .map_err(|_| CapabilityError::Timeout {
                tool: self.ffprobe_command.clone(),
                timeout,
            })?
            .map_err(|e| CapabilityError::from_process_error(self.ffprobe_command.clone(), e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Parse JSON output even if the command failed; ffprobe may still provide structured error info
        let probe_data: serde_json::Value = if stdout.trim().is_empty() {
            if output.status.success() {
                return Err(CapabilityError::MalformedOutput {
                    tool: self.ffprobe_command.clone(),
                    message: "empty output".to_string(),
                });
            }
            serde_json::json!({
                "error": {
                    "code": output.status.code().unwrap_or(-1),
                    "string": stderr.trim().to_string()
                }
            })
        } else {
            serde_json::from_str(&stdout).map_err(|e| CapabilityError::MalformedOutput {
                tool: self.ffprobe_command.clone(),
                message: e.to_string(),
            })?
        };

        let report = self.parse_probe_result(
            &probe_data,
            output.status.success(),
            output.status.code(),
            &stderr,
        );

        if report.success {
            debug!(
                "Inspected {}: codec={:?}, format={:?}, duration={:?}",
                safe_url, report.codec_name, report.format_name, report.duration_seconds
            );
        } else {
            warn!(
                "ffprobe reported error for {}: {} (code: {:?})",
                safe_url,
                report.error_text.as_deref().unwrap_or("unknown ffprobe error"),
                report.exit_code
            );
        }

        Ok(report)
    }
}
