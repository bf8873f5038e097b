//! Channel aggregation
//!
//! Fans a channel's distinct sources into the orchestrator, keeps the valid
//! ones and orders them fastest first. Equal latencies keep input order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

use crate::models::{Channel, ChannelResult, Source, SourceResult};
use crate::pipeline::orchestrator::Orchestrator;

/// A channel's ordered survivors plus every per-source verdict
#[derive(Debug, Clone)]
pub struct ChannelReport {
    pub result: ChannelResult,
    /// One entry per distinct URL, in input order
    pub source_results: Vec<SourceResult>,
}

impl ChannelReport {
    pub fn checked(&self) -> usize {
        self.source_results.len()
    }

    pub fn valid(&self) -> usize {
        self.result.ordered_valid_urls.len()
    }
}

#[derive(Clone)]
pub struct ChannelProcessor {
    orchestrator: Arc<Orchestrator>,
}

impl ChannelProcessor {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn process(&self, channel: &Channel) -> ChannelResult {
        self.process_detailed(channel).await.result
    }

    pub async fn process_detailed(&self, channel: &Channel) -> ChannelReport {
        let sources = dedup_sources(&channel.sources);
        if sources.is_empty() {
            return ChannelReport {
                result: ChannelResult {
                    name: channel.name.clone(),
                    ordered_valid_urls: Vec::new(),
                },
                source_results: Vec::new(),
            };
        }

        let urls: Vec<String> = sources.iter().map(|s| s.url.clone()).collect();
        let mut results = self.orchestrator.validate_all(sources).await;
        let ordered_valid_urls = order_valid(&urls, &results);

        info!(
            "Channel '{}': {}/{} sources valid",
            channel.name,
            ordered_valid_urls.len(),
            urls.len()
        );

        let source_results = urls
            .iter()
            .filter_map(|url| results.remove(url))
            .collect();

        ChannelReport {
            result: ChannelResult {
                name: channel.name.clone(),
                ordered_valid_urls,
            },
            source_results,
        }
    }
}

/// First occurrence of each URL wins
pub fn dedup_sources(sources: &[Source]) -> Vec<Source> {
    let mut seen = HashSet::with_capacity(sources.len());
    sources
        .iter()
        .filter(|s| seen.insert(s.url.as_str()))
        .cloned()
        .collect()
}

/// Valid URLs from `urls`, stable-sorted by ascending latency
pub fn order_valid(urls: &[String], results: &HashMap<String, SourceResult>) -> Vec<String> {
    let mut survivors: Vec<(&str, f64)> = urls
        .iter()
        .filter_map(|url| {
            results
                .get(url)
                .filter(|r| r.valid)
                .map(|r| (url.as_str(), r.latency_ms))
        })
        .collect();

    survivors.sort_by(|a, b| a.1.total_cmp(&b.1));
    survivors.into_iter().map(|(url, _)| url.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn results(entries: &[(&str, Option<f64>)]) -> HashMap<String, SourceResult> {
        entries
            .iter()
            .map(|(url, latency)| {
                let result = match latency {
                    Some(ms) => SourceResult::valid(*url, "ok", *ms),
                    None => SourceResult::invalid(*url, "HTTP 404 not acceptable"),
                };
                (url.to_string(), result)
            })
            .collect()
    }

    #[test]
    fn test_faster_source_first() {
        let urls = vec!["http://a/1".to_string(), "http://b/2".to_string()];
        let map = results(&[("http://a/1", Some(120.0)), ("http://b/2", Some(45.0))]);
        assert_eq!(order_valid(&urls, &map), vec!["http://b/2", "http://a/1"]);
    }

    #[test]
    fn test_invalid_and_missing_are_dropped() {
        let urls = vec![
            "http://dead/x".to_string(),
            "http://good/y".to_string(),
            "http://unknown/z".to_string(),
        ];
        let map = results(&[("http://dead/x", None), ("http://good/y", Some(10.0))]);
        assert_eq!(order_valid(&urls, &map), vec!["http://good/y"]);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let sources = vec![
            Source::new("http://a/1"),
            Source::new("http://b/2"),
            Source::new("http://a/1"),
        ];
        let deduped: Vec<_> = dedup_sources(&sources).into_iter().map(|s| s.url).collect();
        assert_eq!(deduped, vec!["http://a/1", "http://b/2"]);
    }

    proptest! {
        #[test]
        fn prop_order_is_subset_sorted_and_stable(
            entries in prop::collection::vec(prop::option::of(0u16..50), 0..40)
        ) {
            let urls: Vec<String> = (0..entries.len()).map(|i| format!("http://s/{i}")).collect();
            let map: HashMap<String, SourceResult> = urls
                .iter()
                .zip(&entries)
                .map(|(url, latency)| {
                    let result = match latency {
                        Some(ms) => SourceResult::valid(url, "ok", f64::from(*ms)),
                        None => SourceResult::invalid(url, "rejected"),
                    };
                    (url.clone(), result)
                })
                .collect();

            let ordered = order_valid(&urls, &map);

            let expected_len = entries.iter().filter(|e| e.is_some()).count();
            prop_assert_eq!(ordered.len(), expected_len);

            for url in &ordered {
                prop_assert!(urls.contains(url));
                prop_assert!(map[url].valid);
            }

            for pair in ordered.windows(2) {
                let (a, b) = (&map[&pair[0]], &map[&pair[1]]);
                prop_assert!(a.latency_ms <= b.latency_ms);
                if a.latency_ms == b.latency_ms {
                    let ia = urls.iter().position(|u| u == &pair[0]).unwrap();
                    let ib = urls.iter().position(|u| u == &pair[1]).unwrap();
                    prop_assert!(ia < ib);
                }
            }
        }
    }
}
