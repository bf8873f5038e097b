//! Hand-written capability mocks shared by the integration tests
//!
//! Each mock is driven by a script closure receiving the URL and the 1-based
//! call number for that URL, counts its calls, and can sleep per URL so
//! paused-clock tests observe exact latencies.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use iptv_checker::config::RetryConfig;
use iptv_checker::errors::{CapabilityResult, ReachabilityError};
use iptv_checker::models::{Protocol, ValidationMode};
use iptv_checker::pipeline::{SourceValidator, StageRunner, StageSettings};
use iptv_checker::services::{
    Capabilities, HttpProbeResponse, InspectionReport, PlaybackCapture, PlaybackProber,
    ReachabilityClient, StreamInspector,
};

type Script<T> = Box<dyn Fn(&str, usize) -> T + Send + Sync>;

/// Tracks how many calls are in progress and the highest value seen
#[derive(Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Per-URL call accounting and delays
#[derive(Default)]
struct Calls {
    total: AtomicUsize,
    by_url: Mutex<HashMap<String, usize>>,
    delays: HashMap<String, Duration>,
    gauge: Arc<Gauge>,
}

impl Calls {
    /// Record a call, wait out any configured delay, and return the call number for `url`
    async fn record(&self, url: &str) -> usize {
        self.total.fetch_add(1, Ordering::SeqCst);
        let attempt = {
            let mut by_url = self.by_url.lock().unwrap();
            let count = by_url.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        self.gauge.enter();
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        self.gauge.leave();
        attempt
    }

    fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    fn for_url(&self, url: &str) -> usize {
        self.by_url.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

pub struct MockReachability {
    script: Script<Result<HttpProbeResponse, ReachabilityError>>,
    calls: Calls,
}

impl MockReachability {
    pub fn new(
        script: impl Fn(&str, usize) -> Result<HttpProbeResponse, ReachabilityError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            calls: Calls::default(),
        }
    }

    /// Every URL answers 200 with an HLS content type
    pub fn always_ok() -> Self {
        Self::new(|_, _| Ok(HttpProbeResponse::new(200, Some("application/vnd.apple.mpegurl"), b"")))
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.calls.delays.insert(url.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.total()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.for_url(url)
    }
}

#[async_trait]
impl ReachabilityClient for MockReachability {
    async fn probe(
        &self,
        url: &str,
        _timeout: Duration,
    ) -> Result<HttpProbeResponse, ReachabilityError> {
        let attempt = self.calls.record(url).await;
        (self.script)(url, attempt)
    }
}

pub struct MockInspector {
    script: Script<CapabilityResult<InspectionReport>>,
    calls: Calls,
}

impl MockInspector {
    pub fn new(
        script: impl Fn(&str, usize) -> CapabilityResult<InspectionReport> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            calls: Calls::default(),
        }
    }

    /// Reports an h264 video stream with a 10 s duration for every URL
    pub fn always_ok() -> Self {
        Self::new(|_, _| Ok(InspectionReport::video("h264", Some(10.0))))
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.calls.delays.insert(url.to_string(), delay);
        self
    }

    pub fn with_gauge(mut self, gauge: Arc<Gauge>) -> Self {
        self.calls.gauge = gauge;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.total()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.for_url(url)
    }
}

#[async_trait]
impl StreamInspector for MockInspector {
    async fn inspect(
        &self,
        url: &str,
        _timeout: Duration,
        _protocol: Protocol,
    ) -> CapabilityResult<InspectionReport> {
        let attempt = self.calls.record(url).await;
        (self.script)(url, attempt)
    }
}

pub struct MockPlayer {
    script: Script<CapabilityResult<PlaybackCapture>>,
    calls: Calls,
    signatures: Mutex<Vec<(Protocol, String)>>,
}

impl MockPlayer {
    pub fn new(
        script: impl Fn(&str, usize) -> CapabilityResult<PlaybackCapture> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            calls: Calls::default(),
            signatures: Mutex::new(Vec::new()),
        }
    }

    /// Prints the given output and exits cleanly for every URL
    pub fn printing(output: &'static str) -> Self {
        Self::new(move |_, _| {
            Ok(PlaybackCapture {
                success: true,
                exit_code: Some(0),
                output: output.to_string(),
            })
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.total()
    }

    pub fn signatures(&self) -> Vec<(Protocol, String)> {
        self.signatures.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaybackProber for MockPlayer {
    async fn probe(
        &self,
        url: &str,
        _timeout: Duration,
        client_signature: &str,
        protocol: Protocol,
    ) -> CapabilityResult<PlaybackCapture> {
        self.signatures
            .lock()
            .unwrap()
            .push((protocol, client_signature.to_string()));
        let attempt = self.calls.record(url).await;
        (self.script)(url, attempt)
    }
}

/// The three mocks plus the capability bundle pointing at them
pub struct Harness {
    pub reachability: Arc<MockReachability>,
    pub inspector: Arc<MockInspector>,
    pub player: Arc<MockPlayer>,
}

impl Harness {
    pub fn new(reachability: MockReachability, inspector: MockInspector, player: MockPlayer) -> Self {
        Self {
            reachability: Arc::new(reachability),
            inspector: Arc::new(inspector),
            player: Arc::new(player),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::new(
            self.reachability.clone(),
            self.inspector.clone(),
            self.player.clone(),
        )
    }

    pub fn validator(&self, mode: ValidationMode, retry: RetryConfig) -> SourceValidator {
        SourceValidator::new(
            StageRunner::new(self.capabilities(), StageSettings::default()),
            retry,
            mode,
        )
    }
}

pub fn no_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 1,
        delay: Duration::from_millis(0),
    }
}

pub fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        delay: Duration::from_millis(10),
    }
}
