//! Concurrency orchestration
//!
//! Every validation in a run, whatever channel it belongs to, queues on one
//! fair semaphore, so at most `max_workers` are in flight at once. Each
//! validation runs under its own check timeout; an optional batch deadline,
//! fixed when the orchestrator is built, cuts off whatever is still pending.

use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, warn};

use crate::config::ValidationConfig;
use crate::models::{Source, SourceResult};
use crate::pipeline::validator::SourceValidator;
use crate::utils::url::UrlUtils;

pub const CHECK_TIMED_OUT: &str = "validation timed out";
pub const BATCH_DEADLINE_EXCEEDED: &str = "batch deadline exceeded";
pub const VALIDATION_PANICKED: &str = "validation panicked";

pub struct Orchestrator {
    validator: Arc<SourceValidator>,
    permits: Arc<Semaphore>,
    check_timeout: Duration,
    deadline: Option<Instant>,
}

impl Orchestrator {
    pub fn new(
        validator: Arc<SourceValidator>,
        max_workers: usize,
        check_timeout: Duration,
        batch_deadline: Option<Duration>,
    ) -> Self {
        Self {
            validator,
            permits: Arc::new(Semaphore::new(max_workers.max(1))),
            check_timeout,
            deadline: batch_deadline.map(|d| Instant::now() + d),
        }
    }

    pub fn from_config(validator: Arc<SourceValidator>, config: &ValidationConfig) -> Self {
        Self::new(
            validator,
            config.max_workers,
            config.check_timeout,
            config.batch_deadline,
        )
    }

    /// Validate every source, returning one result per distinct URL
    pub async fn validate_all(&self, sources: Vec<Source>) -> HashMap<String, SourceResult> {
        let mut results = HashMap::with_capacity(sources.len());
        let mut pending: HashSet<String> = HashSet::with_capacity(sources.len());
        let mut tasks = JoinSet::new();

        for source in sources {
            if !pending.insert(source.url.clone()) {
                continue;
            }
            let validator = Arc::clone(&self.validator);
            let permits = Arc::clone(&self.permits);
            let check_timeout = self.check_timeout;

            tasks.spawn(async move {
                let url = source.url.clone();
                let run = AssertUnwindSafe(run_check(validator, permits, source, check_timeout))
                    .catch_unwind()
                    .await;
                let result = match run {
                    Ok(result) => result,
                    Err(_) => {
                        error!(
                            "Validation of {} panicked",
                            UrlUtils::obfuscate_credentials(&url)
                        );
                        SourceResult::invalid(&url, VALIDATION_PANICKED)
                    }
                };
                (url, result)
            });
        }

        let mut deadline_hit = false;
        loop {
            let next = match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        deadline_hit = true;
                        tasks.abort_all();
                        break;
                    }
                },
                None => tasks.join_next().await,
            };

            match next {
                Some(Ok((url, result))) => {
                    pending.remove(&url);
                    results.insert(url, result);
                }
                Some(Err(e)) => warn!("Validation task ended abnormally: {}", e),
                None => break,
            }
        }

        if !pending.is_empty() {
            let reason = if deadline_hit {
                warn!(
                    "Batch deadline passed with {} validations unfinished",
                    pending.len()
                );
                BATCH_DEADLINE_EXCEEDED
            } else {
                VALIDATION_PANICKED
            };
            for url in pending {
                results.insert(url.clone(), SourceResult::invalid(url, reason));
            }
        }

        results
    }
}

async fn run_check(
    validator: Arc<SourceValidator>,
    permits: Arc<Semaphore>,
    source: Source,
    check_timeout: Duration,
) -> SourceResult {
    // Held until the check finishes; the semaphore queues waiters in FIFO order
    let _permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return SourceResult::invalid(&source.url, "validation cancelled"),
    };

    match tokio::time::timeout(check_timeout, validator.validate(&source)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "Validation of {} exceeded {:?}",
                UrlUtils::obfuscate_credentials(&source.url),
                check_timeout
            );
            SourceResult::invalid(&source.url, CHECK_TIMED_OUT)
        }
    }
}
