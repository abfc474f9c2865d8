//! Authentication endpoint

use crate::error::{ClientError, Result};
use crate::{PoolClient, handle_response};
use minefleet_core::dto::auth::{AuthResponse, TokenRequest};

impl PoolClient {
    /// Exchange the pool token for the account and the pool address
    ///
    /// The pool address is the first positional argument of every compute
    /// process launch.
    ///
    /// # Errors
    /// [`ClientError::Unauthorized`] when the pool answers with a zero user id.
    pub async fn authenticate(&self) -> Result<AuthResponse> {
        let url = format!("{}/token", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&TokenRequest {
                token: self.token.clone(),
            })
            .send()
            .await?;

        let auth: AuthResponse = handle_response(response).await?;
        if !auth.is_authorized() {
            return Err(ClientError::Unauthorized);
        }

        Ok(auth)
    }
}
