//! Task domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of remotely issued work
///
/// Immutable once observed and identified by `id`. A task is only current
/// while it appears, unexpired, in the latest pool snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    /// Proof-of-work seed, hex encoded
    pub seed: String,
    /// Target complexity, hex encoded
    #[serde(rename = "new_complexity")]
    pub complexity: String,
    /// Giver contract address the solution is sent to
    #[serde(rename = "address")]
    pub recipient: String,
    /// Expiry as a unix timestamp (seconds)
    #[serde(rename = "expire")]
    pub expiry: i64,
}

impl Task {
    /// Returns true if the task expired strictly before `now` (unix seconds)
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expiry < now
    }

    /// Returns true if the task has already expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Expiry as a UTC timestamp, if representable
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expiry, 0)
    }
}
