use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::errors::AppError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(16);
const FETCH_RETRIES: u32 = 8;
const FETCH_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Declared retry policy: how many retries may follow a failed attempt and how
/// long to pause between them. `max_retries: None` means retry forever.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: Option<u32>,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn bounded(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries: Some(max_retries),
            delay,
        }
    }

    pub const fn unbounded(delay: Duration) -> Self {
        Self {
            max_retries: None,
            delay,
        }
    }

    /// Whether another retry may run after `done` retries have already failed.
    pub fn allows(&self, done: u32) -> bool {
        self.max_retries.map_or(true, |max| done < max)
    }

    /// Records one more failure and pauses for the policy delay. Returns false
    /// once the retry budget is spent, without sleeping.
    pub async fn backoff(&self, done: &mut u32) -> bool {
        if !self.allows(*done) {
            return false;
        }
        *done += 1;
        sleep(self.delay).await;
        true
    }
}

/// Source of raw page bodies for the crawl engine.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, AppError>;
}

pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            retry: RetryPolicy::bounded(FETCH_RETRIES, FETCH_RETRY_DELAY),
        })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    /// GET with a fixed timeout. Transport and body-read failures are retried
    /// per the policy; exhausting it escalates and aborts the running cycle.
    /// Response status codes are not inspected: an error page simply fails to
    /// parse downstream.
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let mut retries = 0u32;
        loop {
            info!("get {}", url);
            let result = match self.client.get(url).send().await {
                Ok(response) => response.text().await,
                Err(err) => Err(err),
            };
            match result {
                Ok(body) => return Ok(body),
                Err(err) => {
                    warn!(url = url, error = %err, retries, "fetch failed");
                    if !self.retry.backoff(&mut retries).await {
                        return Err(err.into());
                    }
                }
            }
        }
    }
}
