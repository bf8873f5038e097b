//! Playback probing
//!
//! Opens a source with ffmpeg for a bounded run, decoding into the null muxer,
//! and hands back everything the player printed for vocabulary matching.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::errors::{CapabilityError, CapabilityResult};
use crate::models::Protocol;
use crate::services::traits::{PlaybackCapture, PlaybackProber};
use crate::utils::url::UrlUtils;

/// ffmpeg-backed headless player
pub struct FfmpegPlaybackProber {
    ffmpeg_command: String,
    run_time: Duration,
}

impl FfmpegPlaybackProber {
    pub fn new(ffmpeg_command: impl Into<String>, run_time: Duration) -> Self {
        Self {
            ffmpeg_command: ffmpeg_command.into(),
            run_time,
        }
    }

    fn build_args(
        &self,
        url: &str,
        timeout: Duration,
        client_signature: &str,
        protocol: Protocol,
    ) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-loglevel", "info"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        // Present the configured client identity in the protocol's own terms
        if !client_signature.is_empty() {
            match protocol {
                Protocol::Rtmp => {
                    args.push("-rtmp_flashver".to_string());
                    args.push(client_signature.to_string());
                }
                _ => {
                    args.push("-user_agent".to_string());
                    args.push(client_signature.to_string());
                }
            }
        }

        args.push("-rw_timeout".to_string());
        args.push(timeout.as_micros().to_string());
        args.push("-i".to_string());
        args.push(url.to_string());
        args.push("-t".to_string());
        args.push(format!("{:.3}", self.run_time.as_secs_f64()));
        args.extend(["-f", "null", "-"].iter().map(|s| s.to_string()));
        args
    }
}

#[async_trait]
impl PlaybackProber for FfmpegPlaybackProber {
    async fn probe(
        &self,
        url: &str,
        timeout: Duration,
        client_signature: &str,
        protocol: Protocol,
    ) -> CapabilityResult<PlaybackCapture> {
        debug!(
            "Playback probe of {} for {:?} (hard limit {:?})",
            UrlUtils::obfuscate_credentials(url),
            self.run_time,
            timeout
        );

        let mut cmd = Command::new(&self.ffmpeg_command);
        cmd.args(self.build_args(url, timeout, client_signature, protocol));
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| CapabilityError::Timeout {
                tool: self.ffmpeg_command.clone(),
                timeout,
            })?
            .map_err(|e| CapabilityError::from_process_error(self.ffmpeg_command.clone(), e))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(PlaybackCapture {
            success: output.status.success(),
            exit_code: output.status.code(),
            output: combined,
        })
    }
}
