//! External tool detection
//!
//! Runs `<tool> -version` before any catalog work so a missing ffprobe or
//! ffmpeg fails the run up front instead of invalidating every source.

use tokio::process::Command;
use tracing::{info, warn};

use crate::config::ToolsConfig;
use crate::errors::{AppError, AppResult};
use crate::models::ValidationMode;

/// A tool that answered `-version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub command: String,
    pub version: Option<String>,
}

/// Check that `command` runs and extract its version string
pub async fn check_tool_availability(command: &str) -> AppResult<ToolInfo> {
    let output = Command::new(command)
        .arg("-version")
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            warn!("Failed to execute command '{}': {}", command, e);
            AppError::tool_unavailable(command, e.to_string())
        })?;

    if !output.status.success() {
        warn!("Command '{}' failed with status: {}", command, output.status);
        return Err(AppError::tool_unavailable(
            command,
            format!("-version exited with {}", output.status),
        ));
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    Ok(ToolInfo {
        command: command.to_string(),
        version: parse_version_line(&version_output),
    })
}

/// Extract the version from the first line (e.g. "ffprobe version 6.1.1-3ubuntu5 Copyright ...")
fn parse_version_line(output: &str) -> Option<String> {
    output.lines().next().and_then(|line| {
        let mut parts = line.split_whitespace();
        let _tool = parts.next()?;
        if parts.next()? != "version" {
            return None;
        }
        parts.next().map(|v| v.to_string())
    })
}

/// Verify the tools the selected mode needs
pub async fn ensure_required_tools(
    tools: &ToolsConfig,
    mode: ValidationMode,
) -> AppResult<Vec<ToolInfo>> {
    let required = match mode {
        ValidationMode::Structural => vec![tools.ffprobe_command.as_str()],
        ValidationMode::Behavioral => vec![tools.ffmpeg_command.as_str()],
    };

    let mut found = Vec::with_capacity(required.len());
    for command in required {
        let info = check_tool_availability(command).await?;
        info!(
            "Tool available: command={}, version={:?}",
            info.command, info.version
        );
        found.push(info);
    }
    Ok(found)
}
