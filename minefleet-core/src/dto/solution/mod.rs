//! Solution submission DTOs

use serde::{Deserialize, Serialize};

use crate::dto::ServerResponse;

/// Request body for `POST /boc`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSolution {
    #[serde(rename = "hexData")]
    pub hex_data: String,
    #[serde(rename = "dataSource")]
    pub data_source: String,
    pub token: String,
    pub speed: String,
    pub seed: String,
    /// Task id, sent as a string
    pub id: String,
}

/// Response of `POST /boc`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSolutionResponse {
    #[serde(flatten)]
    pub response: ServerResponse,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub complexity: String,
}

impl SubmitSolutionResponse {
    /// A share counts as accepted only for `{status: "ok", data: "Found"}`
    pub fn is_accepted(&self) -> bool {
        self.response.status == "ok" && self.response.data == "Found"
    }
}
