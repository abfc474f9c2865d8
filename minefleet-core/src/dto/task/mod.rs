//! Task DTOs

use serde::{Deserialize, Serialize};

use crate::domain::task::Task;
use crate::dto::ServerResponse;

/// Response of `POST /get`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListResponse {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(flatten)]
    pub response: ServerResponse,
}
