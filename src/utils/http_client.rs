use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, RANGE};
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response};
use std::error::Error as StdError;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::HttpConfig;
use crate::config::defaults::DEFAULT_BODY_PREFIX_BYTES;
use crate::errors::{AppResult, ReachabilityError};
use crate::services::traits::{HttpProbeResponse, ProbeMethod, ReachabilityClient};
use crate::utils::url::UrlUtils;

/// Reachability client backed by reqwest
///
/// Sends a HEAD request first. When HEAD is refused, fails definitively or
/// does not advertise a media content type, a ranged GET for the first KiB
/// follows so the content signature stage has bytes to sniff.
pub struct StandardHttpClient {
    client: Client,
    body_prefix_bytes: usize,
}

impl StandardHttpClient {
    pub fn new(config: &HttpConfig) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.timeout)
            .redirect(Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            body_prefix_bytes: DEFAULT_BODY_PREFIX_BYTES,
        })
    }

    async fn send(
        &self,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<Response, ReachabilityError> {
        request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(&e, timeout))
    }

    async fn ranged_get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<HttpProbeResponse, ReachabilityError> {
        let range = format!("bytes=0-{}", self.body_prefix_bytes.saturating_sub(1));
        let mut response = self
            .send(self.client.get(url).header(RANGE, range), timeout)
            .await?;

        let mut captured = capture_head(&response, ProbeMethod::RangedGet);
        let read = tokio::time::timeout(timeout, async {
            while captured.body_prefix.len() < self.body_prefix_bytes {
                match response.chunk().await {
                    Ok(Some(chunk)) => captured.body_prefix.extend_from_slice(&chunk),
                    Ok(None) => break,
                    Err(e) => return Err(classify_error(&e, timeout)),
                }
            }
            Ok(())
        })
        .await;

        match read {
            Ok(Ok(())) => {}
            // A live stream that stalls after its first bytes still gave us a prefix
            _ if !captured.body_prefix.is_empty() => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(ReachabilityError::Timeout(timeout)),
        }
        captured.body_prefix.truncate(self.body_prefix_bytes);

        trace!(
            "Ranged GET {} returned {} with {} bytes",
            UrlUtils::obfuscate_credentials(url),
            captured.status,
            captured.body_prefix.len()
        );
        Ok(captured)
    }
}

#[async_trait]
impl ReachabilityClient for StandardHttpClient {
    async fn probe(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<HttpProbeResponse, ReachabilityError> {
        match self.send(self.client.head(url), timeout).await {
            Ok(response) => {
                let head = capture_head(&response, ProbeMethod::Head);
                if response.status().is_success() && head.has_media_content_type() {
                    return Ok(head);
                }
                debug!(
                    "HEAD {} returned {} ({:?}), falling back to ranged GET",
                    UrlUtils::obfuscate_credentials(url),
                    head.status,
                    head.content_type
                );
            }
            Err(e) if e.is_transient() => return Err(e),
            Err(e) => {
                debug!(
                    "HEAD {} failed ({}), falling back to ranged GET",
                    UrlUtils::obfuscate_credentials(url),
                    e
                );
            }
        }

        self.ranged_get(url, timeout).await
    }
}

fn capture_head(response: &Response, method: ProbeMethod) -> HttpProbeResponse {
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    HttpProbeResponse {
        status: response.status().as_u16(),
        content_type: response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        headers,
        body_prefix: Vec::new(),
        method,
    }
}

/// Map a reqwest failure onto the transport classes the retry policy knows
fn classify_error(error: &reqwest::Error, timeout: Duration) -> ReachabilityError {
    let message = UrlUtils::obfuscate_credentials(&error.to_string());

    if error.is_timeout() {
        return ReachabilityError::Timeout(timeout);
    }
    if error.is_redirect() {
        return ReachabilityError::TooManyRedirects(message);
    }
    if has_connection_reset(error) {
        return ReachabilityError::ConnectionReset(message);
    }
    if error.is_connect() {
        return ReachabilityError::Connect(message);
    }
    ReachabilityError::Other(message)
}

fn has_connection_reset(error: &reqwest::Error) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
