//! Stats API Handler

use axum::{Json, extract::State};
use minefleet_core::domain::stats::FleetStats;

use crate::api::AppState;

/// GET /stats
/// Latest fleet sample: per-slot state and hashrate, totals, share counters
pub async fn get_stats(State(state): State<AppState>) -> Json<FleetStats> {
    Json(state.aggregator.latest())
}
