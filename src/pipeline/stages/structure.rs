//! Media structure stage
//!
//! Hands the source to the stream inspector under a hard timeout and judges
//! the report: HTTP sources need a video codec, RTMP sources a positive,
//! finite duration.

use std::time::Duration;

use crate::models::{ProbeOutcome, Protocol, Source};
use crate::services::traits::{InspectionReport, StreamInspector};

/// Inspector error text that points at a passing network condition
const TRANSIENT_HINTS: &[&str] = &["connection reset", "timed out", "temporarily unavailable"];

pub async fn probe(
    inspector: &dyn StreamInspector,
    source: &Source,
    timeout: Duration,
) -> ProbeOutcome {
    let inspection = tokio::time::timeout(
        timeout,
        inspector.inspect(&source.url, timeout, source.protocol),
    )
    .await;

    match inspection {
        Ok(Ok(report)) => evaluate(&report, source.protocol),
        Ok(Err(e)) if e.is_timeout() => ProbeOutcome::transient(e.to_string()),
        Ok(Err(e)) => ProbeOutcome::rejected(e.to_string()),
        Err(_) => ProbeOutcome::transient(format!("stream inspection timed out after {timeout:?}")),
    }
}

/// Judge an inspection report for the source's protocol
pub fn evaluate(report: &InspectionReport, protocol: Protocol) -> ProbeOutcome {
    if !report.success {
        let detail = report
            .error_text
            .clone()
            .unwrap_or_else(|| match report.exit_code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            });
        return if is_transient_error_text(&detail) {
            ProbeOutcome::transient(detail)
        } else {
            ProbeOutcome::rejected(format!("inspection failed: {detail}"))
        };
    }

    match protocol {
        Protocol::Rtmp => match report.duration_seconds {
            Some(duration) if duration.is_finite() && duration > 0.0 => {
                ProbeOutcome::pass(format!("duration {duration:.2}s"))
            }
            Some(duration) => ProbeOutcome::rejected(format!("invalid duration: {duration}")),
            None => ProbeOutcome::rejected("invalid duration: N/A"),
        },
        _ => match report.codec_name.as_deref() {
            Some(codec) if !codec.is_empty() => ProbeOutcome::pass(format!("video codec {codec}")),
            _ => ProbeOutcome::rejected("no video stream found"),
        },
    }
}

fn is_transient_error_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    TRANSIENT_HINTS.iter().any(|hint| lower.contains(hint))
}
