//! Catalog walking
//!
//! Applies the channel processor to every channel of every category and
//! rewrites each channel's `childItems` to its surviving descriptors, fastest
//! first. Descriptor objects are kept as they are; only membership and order
//! change.

use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::AppResult;
use crate::models::catalog::{CHILD_ITEMS_KEY, channel_name, descriptor_url};
use crate::models::{Catalog, Channel, CheckSummary};
use crate::pipeline::channel_processor::{ChannelProcessor, ChannelReport};
use crate::pipeline::orchestrator::Orchestrator;
use crate::pipeline::validator::SourceValidator;
use crate::services::traits::Capabilities;

pub const LAST_UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CatalogWalker {
    processor: ChannelProcessor,
    channel_concurrency: usize,
}

impl CatalogWalker {
    /// `channel_concurrency` bounds how many channels are in progress at
    /// once; the orchestrator's permits still bound the validations.
    pub fn new(processor: ChannelProcessor, channel_concurrency: usize) -> Self {
        Self {
            processor,
            channel_concurrency: channel_concurrency.max(1),
        }
    }

    /// Wire validator, orchestrator and channel processor from configuration
    ///
    /// The batch deadline, if configured, starts counting here.
    pub fn from_config(capabilities: Capabilities, config: &Config) -> Self {
        let validator = Arc::new(SourceValidator::from_config(capabilities, config));
        let orchestrator = Arc::new(Orchestrator::from_config(validator, &config.validation));
        Self::new(
            ChannelProcessor::new(orchestrator),
            config.validation.max_workers,
        )
    }

    /// Filter and reorder every channel in place, then stamp run metadata
    pub async fn walk(&self, catalog: &mut Catalog) -> AppResult<CheckSummary> {
        let started = Instant::now();
        let mut summary = CheckSummary::default();

        for category in catalog.category_names() {
            let Some(channels) = catalog.category(&category) else {
                continue;
            };

            let jobs: Vec<(usize, Channel)> = channels
                .iter()
                .enumerate()
                .filter_map(|(position, value)| {
                    channel_from_value(value, position).map(|channel| (position, channel))
                })
                .collect();
            debug!(
                "Category '{}': {} channels to check",
                category,
                jobs.len()
            );

            let reports: Vec<(usize, ChannelReport)> = stream::iter(jobs)
                .map(|(position, channel)| async move {
                    (position, self.processor.process_detailed(&channel).await)
                })
                .buffered(self.channel_concurrency)
                .collect()
                .await;

            let (checked, valid) = reports.iter().fold((0, 0), |(c, v), (_, report)| {
                (c + report.checked(), v + report.valid())
            });
            summary.categories += 1;
            summary.channels += reports.len();
            summary.checked_sources += checked;
            summary.valid_sources += valid;

            if let Some(channels) = catalog.category_mut(&category) {
                for (position, report) in &reports {
                    if let Some(channel) = channels.get_mut(*position) {
                        rewrite_child_items(channel, &report.result.ordered_valid_urls);
                    }
                }
            }

            info!(
                "Category '{}': {} channels, {}/{} sources valid",
                category,
                reports.len(),
                valid,
                checked
            );
        }

        summary.invalid_sources = summary.checked_sources - summary.valid_sources;
        summary.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let last_updated = chrono::Local::now().format(LAST_UPDATED_FORMAT).to_string();
        catalog.set_metadata(last_updated, &summary)?;

        info!(
            "Checked {} sources across {} channels in {} categories: {} valid, {} invalid ({}ms)",
            summary.checked_sources,
            summary.channels,
            summary.categories,
            summary.valid_sources,
            summary.invalid_sources,
            summary.elapsed_ms
        );

        Ok(summary)
    }
}

/// Build a channel from a catalog entry that carries a `childItems` array
fn channel_from_value(value: &Value, position: usize) -> Option<Channel> {
    let items = value.get(CHILD_ITEMS_KEY)?.as_array()?;
    let urls: Vec<String> = items
        .iter()
        .filter_map(|item| descriptor_url(item).map(str::to_string))
        .collect();
    Some(Channel::new(channel_name(value, position), urls))
}

/// Replace `childItems` with the descriptors for `ordered_urls`, in that order
fn rewrite_child_items(channel: &mut Value, ordered_urls: &[String]) {
    let Some(items) = channel.get_mut(CHILD_ITEMS_KEY).and_then(Value::as_array_mut) else {
        return;
    };

    let mut by_url: HashMap<String, Value> = HashMap::with_capacity(items.len());
    for item in items.drain(..) {
        if let Some(url) = descriptor_url(&item).map(str::to_string) {
            by_url.entry(url).or_insert(item);
        }
    }

    items.extend(ordered_urls.iter().filter_map(|url| by_url.remove(url)));
}
