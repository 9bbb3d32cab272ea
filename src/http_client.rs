//! HTTP seam for talking to a completion server.
//!
//! The completion backend only ever needs "POST this JSON, give me JSON back",
//! so that is the whole trait. Tests swap in a canned client instead of
//! reaching a live server.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Trait for JSON request/response exchanges.
///
/// # Example
///
/// ```ignore
/// use shell_commander::http_client::{HttpClient, ReqwestHttpClient};
///
/// let client = ReqwestHttpClient::new(std::time::Duration::from_secs(30))?;
/// let reply = client
///     .post_json("http://localhost:11434/api/generate", &serde_json::json!({"model": "phi4"}))
///     .await?;
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends `body` as JSON and decodes the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent, the server answers
    /// with a non-success status, or the body is not valid JSON.
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value>;
}

/// Production client backed by reqwest.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(anyhow!("{} returned {}: {}", url, status, text));
        }

        serde_json::from_str(&text)
            .with_context(|| format!("response from {} is not JSON: {}", url, text))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Canned client that records every request body it receives.
    pub struct MockHttpClient {
        response: Result<serde_json::Value, String>,
        pub requests: Mutex<Vec<(String, serde_json::Value)>>,
    }

    impl MockHttpClient {
        pub fn replying(response: serde_json::Value) -> Self {
            Self {
                response: Ok(response),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), body.clone()));
            self.response.clone().map_err(|e| anyhow!(e))
        }
    }

    #[tokio::test]
    async fn test_mock_http_client_records_requests() {
        let client = MockHttpClient::replying(serde_json::json!({"response": "ls"}));

        let reply = client
            .post_json("http://localhost/api", &serde_json::json!({"prompt": "hi"}))
            .await
            .unwrap();

        assert_eq!(reply["response"], "ls");
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "http://localhost/api");
    }

    #[test]
    fn test_reqwest_client_builds_with_timeout() {
        assert!(ReqwestHttpClient::new(Duration::from_secs(5)).is_ok());
    }
}
