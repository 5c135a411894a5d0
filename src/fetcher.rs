use crate::parser;
use crate::traits::FeedSource;
use crate::types::{Candidate, FetchConfig, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTTP retrieval of feed documents with a bounded per-request timeout and
/// exponential-backoff retries. A fetch that exhausts its retries fails that
/// single poll only; the caller tries again on the next tick.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching feed: {}", url);

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 16),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            match self.try_fetch(url).await {
                Ok(body) => {
                    info!("Fetched feed {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        return Err(e);
                    }
                    match backoff.next_backoff() {
                        Some(delay) => {
                            warn!("Attempt {} failed for {}, retrying in {:?}", attempt, url, delay);
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(e),
                    }
                }
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// The live `FeedSource`: HTTP fetch plus feed parsing.
pub struct HttpFeedSource {
    fetcher: Fetcher,
}

impl HttpFeedSource {
    pub fn new(config: FetchConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(config)?,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<Candidate>> {
        let body = self.fetcher.fetch(url).await?;
        parser::parse_feed(&body)
    }
}
