//! Data Transfer Objects
//!
//! Request and response bodies exchanged with the mining pool API.

pub mod auth;
pub mod solution;
pub mod task;

use serde::{Deserialize, Serialize};

/// Status envelope carried by every pool API response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: String,
}
