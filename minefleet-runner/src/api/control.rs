//! Slot Control API Handlers
//!
//! Pause and resume individual slots, and terminate the runner.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use minefleet_core::domain::stats::SlotStats;
use std::sync::Arc;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::slot::WorkerSlot;

fn find_slot(state: &AppState, index: usize) -> ApiResult<Arc<WorkerSlot>> {
    state
        .aggregator
        .slots()
        .get(index)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Slot {} not found", index)))
}

/// POST /slots/{index}/pause
/// Stops the slot from drawing new tasks once its current cycle ends
pub async fn pause_slot(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> ApiResult<Json<SlotStats>> {
    let slot = find_slot(&state, index)?;
    slot.set_keep_alive(false);
    tracing::info!("Slot {} paused", index);
    Ok(Json(slot.stats()))
}

/// POST /slots/{index}/resume
/// Re-arms the slot; an idle slot picks up a task right away
pub async fn resume_slot(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> ApiResult<Json<SlotStats>> {
    let slot = find_slot(&state, index)?;
    slot.set_keep_alive(true);
    tracing::info!("Slot {} resumed", index);
    Ok(Json(slot.stats()))
}

/// POST /kill
/// Terminates the runner when kill handling is enabled
pub async fn kill(State(state): State<AppState>) -> ApiResult<StatusCode> {
    if !state.handle_kill {
        return Err(ApiError::Forbidden("Kill handling is disabled".to_string()));
    }

    tracing::warn!("Kill requested through control server");
    state.kill.notify_one();
    Ok(StatusCode::ACCEPTED)
}
