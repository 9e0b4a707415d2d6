//! HTTP page source that talks to a running mock API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::api::page::{Page, PageRequest};
use crate::error::{FeedError, Result};
use crate::loader::PageSource;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches pages with `POST {base_url}/api/data`
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    base_url: String,
}

impl HttpPageSource {
    /// Create a source with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn data_url(&self) -> String {
        format!("{}/api/data", self.base_url)
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, request: PageRequest) -> Result<Page> {
        let response = self.client.post(self.data_url()).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or(body);
            return Err(FeedError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<Page>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockApi, MockApiConfig};
    use crate::api::server::spawn_local;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    async fn spawn_server(config: MockApiConfig) -> (String, oneshot::Sender<()>) {
        spawn_local(MockApi::new(config)).await.unwrap()
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let source = HttpPageSource::new("http://localhost:5173/").unwrap();
        assert_eq!(source.base_url(), "http://localhost:5173");
        assert_eq!(source.data_url(), "http://localhost:5173/api/data");
    }

    #[tokio::test]
    async fn test_fetch_page_over_http() {
        let (url, _shutdown) = spawn_server(MockApiConfig::instant()).await;
        let source = HttpPageSource::new(url).unwrap();

        let page = source.fetch_page(PageRequest::new(3, 100)).await.unwrap();
        assert_eq!(page.items, vec![100, 101, 102]);
        assert_eq!(page.total_count, 200);
    }

    #[tokio::test]
    async fn test_server_failure_maps_to_api_error() {
        let (url, _shutdown) = spawn_server(MockApiConfig::instant().with_failure_rate(1.0)).await;
        let source = HttpPageSource::new(url).unwrap();

        match source.fetch_page(PageRequest::default()).await {
            Err(FeedError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert!(message.contains("Simulated failure"));
            }
            other => panic!("Expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let source = HttpPageSource::with_timeout(url, Duration::from_secs(2)).unwrap();
        let err = source.fetch_page(PageRequest::default()).await.unwrap_err();
        assert!(matches!(err, FeedError::Http(_)));
    }
}
