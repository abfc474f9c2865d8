//! Task and solution endpoints

use crate::error::Result;
use crate::{PoolClient, handle_response};
use minefleet_core::domain::task::Task;
use minefleet_core::dto::solution::{SubmitSolution, SubmitSolutionResponse};
use minefleet_core::dto::task::TaskListResponse;

impl PoolClient {
    // =============================================================================
    // Tasks
    // =============================================================================

    /// Fetch the currently issued tasks
    ///
    /// # Returns
    /// The full task list; it replaces the caller's snapshot wholesale
    pub async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        let url = format!("{}/get", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let list: TaskListResponse = handle_response(response).await?;
        tracing::debug!("Pool issued {} task(s)", list.tasks.len());
        Ok(list.tasks)
    }

    // =============================================================================
    // Solutions
    // =============================================================================

    /// Submit an encoded solution for a task
    ///
    /// # Arguments
    /// * `hex_data` - Encoded payload produced by the proof encoder
    /// * `task` - The task the proof was computed for
    ///
    /// # Returns
    /// The pool's verdict; see [`SubmitSolutionResponse::is_accepted`]
    pub async fn submit_solution(
        &self,
        hex_data: String,
        task: &Task,
    ) -> Result<SubmitSolutionResponse> {
        let url = format!("{}/boc", self.base_url);
        tracing::debug!("Submitting solution for task {}", task.id);
        let response = self
            .client
            .post(&url)
            .json(&SubmitSolution {
                hex_data,
                data_source: "minerClient".to_string(),
                token: self.token.clone(),
                speed: "1".to_string(),
                seed: task.seed.clone(),
                id: task.id.to_string(),
            })
            .send()
            .await?;

        handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientError;
    use httpmock::prelude::*;
    use serde_json::json;

    fn sample_task() -> Task {
        Task {
            id: 7,
            seed: "0a0b".to_string(),
            complexity: "ff".to_string(),
            recipient: "EQgiver".to_string(),
            expiry: 1_700_000_060,
        }
    }

    #[tokio::test]
    async fn test_fetch_tasks() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/get");
                then.status(200).json_body(json!({
                    "status": "ok",
                    "tasks": [
                        { "id": 1, "seed": "aa", "new_complexity": "0f", "address": "EQ1", "expire": 100 },
                        { "id": 2, "seed": "bb", "new_complexity": "0f", "address": "EQ2", "expire": 200 }
                    ]
                }));
            })
            .await;

        let client = PoolClient::new(server.base_url(), "token");
        let tasks = client.fetch_tasks().await.unwrap();

        mock.assert_async().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].id, 2);
        assert_eq!(tasks[1].recipient, "EQ2");
    }

    #[tokio::test]
    async fn test_fetch_tasks_invalid_json() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/get");
                then.status(200).body("not json");
            })
            .await;

        let client = PoolClient::new(server.base_url(), "token");
        let err = client.fetch_tasks().await.unwrap_err();
        assert!(matches!(err, ClientError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_fetch_tasks_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/get");
                then.status(502).body("bad gateway");
            })
            .await;

        let client = PoolClient::new(server.base_url(), "token");
        let err = client.fetch_tasks().await.unwrap_err();
        assert!(matches!(err, ClientError::ApiError { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_submit_solution() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/boc").json_body(json!({
                    "hexData": "deadbeef",
                    "dataSource": "minerClient",
                    "token": "token",
                    "speed": "1",
                    "seed": "0a0b",
                    "id": "7"
                }));
                then.status(200)
                    .json_body(json!({ "status": "ok", "data": "Found", "hash": "h" }));
            })
            .await;

        let client = PoolClient::new(server.base_url(), "token");
        let verdict = client
            .submit_solution("deadbeef".to_string(), &sample_task())
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(verdict.is_accepted());
    }
}
