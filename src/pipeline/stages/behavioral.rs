//! Behavioral stage
//!
//! Runs a bounded playback session and classifies what the player printed.
//! Failure terms win over success terms; output matching neither is
//! indeterminate and logged so the vocabularies can be tuned.

use std::time::Duration;
use tracing::warn;

use crate::config::VocabularyConfig;
use crate::models::{ProbeOutcome, Source};
use crate::services::traits::PlaybackProber;
use crate::utils::url::UrlUtils;

/// Case-insensitive term lists for playback output
#[derive(Debug, Clone)]
pub struct Vocabulary {
    success: Vec<String>,
    failure: Vec<String>,
}

impl Vocabulary {
    pub fn new(success: &[String], failure: &[String]) -> Self {
        let lower = |terms: &[String]| -> Vec<String> {
            terms
                .iter()
                .filter(|t| !t.trim().is_empty())
                .map(|t| t.to_lowercase())
                .collect()
        };
        Self {
            success: lower(success),
            failure: lower(failure),
        }
    }
}

impl From<&VocabularyConfig> for Vocabulary {
    fn from(config: &VocabularyConfig) -> Self {
        Self::new(&config.success, &config.failure)
    }
}

/// Three-way verdict on playback output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackVerdict {
    Success(String),
    Failure(String),
    Indeterminate,
}

pub fn classify_output(output: &str, vocabulary: &Vocabulary) -> PlaybackVerdict {
    let haystack = output.to_lowercase();

    if let Some(term) = vocabulary.failure.iter().find(|t| haystack.contains(t.as_str())) {
        return PlaybackVerdict::Failure(term.clone());
    }
    if let Some(term) = vocabulary.success.iter().find(|t| haystack.contains(t.as_str())) {
        return PlaybackVerdict::Success(term.clone());
    }
    PlaybackVerdict::Indeterminate
}

pub async fn probe(
    prober: &dyn PlaybackProber,
    source: &Source,
    timeout: Duration,
    client_signature: &str,
    vocabulary: &Vocabulary,
) -> ProbeOutcome {
    let session = tokio::time::timeout(
        timeout,
        prober.probe(&source.url, timeout, client_signature, source.protocol),
    )
    .await;

    let capture = match session {
        Ok(Ok(capture)) => capture,
        Ok(Err(e)) if e.is_timeout() => return ProbeOutcome::transient(e.to_string()),
        Ok(Err(e)) => return ProbeOutcome::rejected(e.to_string()),
        Err(_) => {
            return ProbeOutcome::transient(format!("playback probe timed out after {timeout:?}"));
        }
    };

    let exit = match capture.exit_code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    };

    match classify_output(&capture.output, vocabulary) {
        PlaybackVerdict::Failure(term) => ProbeOutcome::rejected(format!(
            "playback failed: matched failure term '{term}' ({exit})"
        )),
        PlaybackVerdict::Success(term) if capture.success => ProbeOutcome::pass(format!(
            "playback ok: matched success term '{term}' ({exit})"
        )),
        PlaybackVerdict::Success(term) => {
            warn!(
                "Playback of {} printed success term '{}' but ended with {}",
                UrlUtils::obfuscate_credentials(&source.url),
                term,
                exit
            );
            ProbeOutcome::indeterminate(format!(
                "playback matched success term '{term}' but ended with {exit}"
            ))
        }
        PlaybackVerdict::Indeterminate => {
            warn!(
                "Indeterminate playback output for {} ({}); no vocabulary term matched",
                UrlUtils::obfuscate_credentials(&source.url),
                exit
            );
            ProbeOutcome::indeterminate(format!("playback output matched no known term ({exit})"))
        }
    }
}
