//! Authentication DTOs

use serde::{Deserialize, Serialize};

use crate::dto::ServerResponse;

/// Request body for `POST /token`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

/// Pool account bound to a token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub balance: i64,
}

/// Response of `POST /token`
///
/// A zero user id means the token was not recognised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub pool_address: String,
    #[serde(flatten)]
    pub response: ServerResponse,
}

impl AuthResponse {
    /// Whether the pool recognised the token
    pub fn is_authorized(&self) -> bool {
        self.user.id != 0
    }
}
