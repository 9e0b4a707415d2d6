//! Mock paginated data source.
//!
//! Waits a bit, fails a configurable share of requests, and otherwise answers
//! with consecutive ids. Used in-process by the loader and behind the HTTP
//! server.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::api::page::{DEFAULT_TOTAL_COUNT, Page, PageRequest};
use crate::error::{FeedError, Result};
use crate::loader::PageSource;

/// Configuration for the mock API
#[derive(Debug, Clone, PartialEq)]
pub struct MockApiConfig {
    /// Artificial latency before each answer
    pub delay: Duration,
    /// Share of requests that fail, 0.0 to 1.0
    pub failure_rate: f64,
    /// Size of the whole feed reported in every page
    pub total_count: u64,
    /// Largest `limit` accepted
    pub max_limit: u32,
}

impl Default for MockApiConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            failure_rate: 0.1,
            total_count: DEFAULT_TOTAL_COUNT,
            max_limit: 1000,
        }
    }
}

impl MockApiConfig {
    /// Config with no delay and no failures
    pub fn instant() -> Self {
        Self {
            delay: Duration::ZERO,
            failure_rate: 0.0,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate;
        self
    }

    pub fn with_total_count(mut self, total_count: u64) -> Self {
        self.total_count = total_count;
        self
    }
}

/// Mock paginated API
#[derive(Debug, Clone, Default)]
pub struct MockApi {
    config: MockApiConfig,
}

impl MockApi {
    pub fn new(config: MockApiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MockApiConfig {
        &self.config
    }

    /// Check request parameters without waiting or rolling for failure
    pub fn validate(&self, request: &PageRequest) -> Result<()> {
        if request.limit > self.config.max_limit {
            return Err(FeedError::InvalidRequest(format!(
                "limit {} exceeds maximum of {}",
                request.limit, self.config.max_limit
            )));
        }
        Ok(())
    }

    /// Serve one page
    pub async fn fetch(&self, request: PageRequest) -> Result<Page> {
        self.validate(&request)?;

        if !self.config.delay.is_zero() {
            tokio::time::sleep(self.config.delay).await;
        }

        if self.roll_failure() {
            log::warn!("Simulated failure for limit={} skip={}", request.limit, request.skip);
            return Err(FeedError::SimulatedFailure);
        }

        log::debug!("Serving limit={} skip={}", request.limit, request.skip);
        Ok(Page::for_request(&request, self.config.total_count))
    }

    fn roll_failure(&self) -> bool {
        // random() is in [0, 1): a rate of 1.0 always fails, 0.0 never does
        rand::rng().random::<f64>() < self.config.failure_rate
    }
}

#[async_trait]
impl PageSource for MockApi {
    async fn fetch_page(&self, request: PageRequest) -> Result<Page> {
        self.fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = MockApiConfig::default();
        assert_eq!(config.delay, Duration::from_millis(1000));
        assert_eq!(config.failure_rate, 0.1);
        assert_eq!(config.total_count, 200);
        assert_eq!(config.max_limit, 1000);
    }

    #[tokio::test]
    async fn test_fetch_returns_consecutive_items() {
        let api = MockApi::new(MockApiConfig::instant());
        let page = api.fetch(PageRequest::new(3, 7)).await.unwrap();
        assert_eq!(page.items, vec![7, 8, 9]);
        assert_eq!(page.total_count, 200);
    }

    #[tokio::test]
    async fn test_failure_rate_one_always_fails() {
        let api = MockApi::new(MockApiConfig::instant().with_failure_rate(1.0));
        for _ in 0..20 {
            let err = api.fetch(PageRequest::default()).await.unwrap_err();
            assert!(matches!(err, FeedError::SimulatedFailure));
        }
    }

    #[tokio::test]
    async fn test_failure_rate_zero_never_fails() {
        let api = MockApi::new(MockApiConfig::instant());
        for _ in 0..50 {
            assert!(api.fetch(PageRequest::default()).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_limit_over_maximum_rejected() {
        let api = MockApi::new(MockApiConfig::instant());
        let err = api.fetch(PageRequest::new(5000, 0)).await.unwrap_err();
        assert!(matches!(err, FeedError::InvalidRequest(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_waits_for_delay() {
        let api = MockApi::new(MockApiConfig::instant().with_delay(Duration::from_millis(1000)));
        let start = tokio::time::Instant::now();
        api.fetch(PageRequest::default()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_total_count_is_configurable() {
        let api = MockApi::new(MockApiConfig::instant().with_total_count(45));
        let page = api.fetch_page(PageRequest::new(20, 40)).await.unwrap();
        assert_eq!(page.total_count, 45);
    }
}
