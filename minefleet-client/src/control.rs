//! Client for a runner's local control server

use minefleet_core::domain::stats::{FleetStats, SlotStats};
use reqwest::Client;

use crate::error::Result;
use crate::{handle_empty_response, handle_response};

/// HTTP client for the runner's stats/control endpoints
#[derive(Debug, Clone)]
pub struct ControlClient {
    base_url: String,
    client: Client,
}

impl ControlClient {
    /// Create a new control client
    ///
    /// # Arguments
    /// * `base_url` - Address of the runner's control server (e.g., "http://127.0.0.1:8787")
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Get the base URL of the runner
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the current fleet statistics
    pub async fn stats(&self) -> Result<FleetStats> {
        let url = format!("{}/stats", self.base_url);
        let response = self.client.get(&url).send().await?;

        handle_response(response).await
    }

    /// Stop a slot from picking up new tasks once its current cycle ends
    pub async fn pause_slot(&self, index: usize) -> Result<SlotStats> {
        let url = format!("{}/slots/{}/pause", self.base_url, index);
        let response = self.client.post(&url).send().await?;

        handle_response(response).await
    }

    /// Resume task pickup on a slot, re-arming it if idle
    pub async fn resume_slot(&self, index: usize) -> Result<SlotStats> {
        let url = format!("{}/slots/{}/resume", self.base_url, index);
        let response = self.client.post(&url).send().await?;

        handle_response(response).await
    }

    /// Ask the runner to terminate
    pub async fn kill(&self) -> Result<()> {
        let url = format!("{}/kill", self.base_url);
        let response = self.client.post(&url).send().await?;

        handle_empty_response(response).await
    }
}
