//! Minefleet HTTP Client
//!
//! Typed async clients used by the runner and the CLI:
//! - [`PoolClient`] talks to the mining pool API (auth, tasks, solutions)
//! - [`ControlClient`] talks to a runner's local stats/control server
//!
//! # Example
//!
//! ```no_run
//! use minefleet_client::PoolClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PoolClient::new("https://ninja.tonlens.com", "my-pool-token");
//!
//!     let tasks = client.fetch_tasks().await?;
//!     println!("{} task(s) issued", tasks.len());
//!     Ok(())
//! }
//! ```

mod auth;
mod control;
pub mod error;
mod tasks;

// Re-export commonly used types
pub use control::ControlClient;
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the mining pool API
///
/// Every request is authenticated with the pool token the client was
/// created with.
#[derive(Debug, Clone)]
pub struct PoolClient {
    /// Base URL of the pool (e.g., "https://ninja.tonlens.com")
    base_url: String,
    /// Pool access token
    token: String,
    /// HTTP client instance
    client: Client,
}

impl PoolClient {
    /// Create a new pool client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the pool API
    /// * `token` - The pool access token (`POOL_ID`)
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(base_url, token, Client::new())
    }

    /// Create a new pool client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use minefleet_client::PoolClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(10))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = PoolClient::with_client("https://ninja.tonlens.com", "token", http_client);
    /// ```
    pub fn with_client(
        base_url: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        }
    }

    /// Get the base URL of the pool
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Handle an API response and deserialize JSON
///
/// Checks the status code and returns an error if the request failed,
/// otherwise deserializes the body.
pub(crate) async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        tracing::debug!("Unparseable response body: {}", body);
        ClientError::ParseError(format!("Failed to parse JSON response: {}", e))
    })
}

/// Handle an API response that returns no content
pub(crate) async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PoolClient::new("https://ninja.tonlens.com", "token");
        assert_eq!(client.base_url(), "https://ninja.tonlens.com");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = PoolClient::new("https://ninja.tonlens.com/", "token");
        assert_eq!(client.base_url(), "https://ninja.tonlens.com");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = PoolClient::with_client("http://localhost:8080", "token", http_client);
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
