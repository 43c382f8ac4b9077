//! API Handlers
use crate::error::ApiError;
use crate::state::AppState;
use crate::submit::{self, SubmissionContext, SubmitOutcome, SubmitRequest};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use escape_core::ProgressKey;
use serde_json::{json, Value};

fn progress_key(room_id: String, team_id: String) -> ProgressKey {
    ProgressKey::new(team_id, room_id)
}

pub async fn submit_answer(
    State(state): State<AppState>,
    Path((room_id, team_id)): Path<(String, String)>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(payload) = payload?;
    let ctx = SubmissionContext::new(
        progress_key(room_id, team_id),
        payload.user_id.clone(),
        submit::requested_stage(payload.stage_index),
    );
    let outcome = submit::submit_answer(&state, &ctx, &payload.answer)?;

    let stage = ctx.stage_index;
    let id = ctx.submission_id;
    let response = match outcome {
        SubmitOutcome::Incorrect => (
            StatusCode::OK,
            json!({ "submissionId": id, "stageIndex": stage, "correct": false, "advanced": false }),
        ),
        SubmitOutcome::AlreadySolved { current_stage_index } => (
            StatusCode::OK,
            json!({
                "submissionId": id,
                "stageIndex": stage,
                "correct": true,
                "advanced": false,
                "alreadySolved": true,
                "currentStageIndex": current_stage_index
            }),
        ),
        SubmitOutcome::GateBlocked { summary } => (
            StatusCode::CONFLICT,
            json!({
                "submissionId": id,
                "stageIndex": stage,
                "correct": true,
                "advanced": false,
                "message": summary.message(),
                "contributions": summary
            }),
        ),
        SubmitOutcome::Advanced { outcome, summary } => (
            StatusCode::OK,
            json!({
                "submissionId": id,
                "stageIndex": stage,
                "correct": true,
                "advanced": true,
                "nextStageIndex": outcome.next_stage_index,
                "isComplete": outcome.is_complete,
                "solvedStages": outcome.solved_stages,
                "contributions": summary
            }),
        ),
    };

    Ok((response.0, Json(response.1)))
}

pub async fn get_progress(
    State(state): State<AppState>,
    Path((room_id, team_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let room = state
        .catalog
        .room(&room_id)
        .ok_or_else(|| ApiError::RoomNotFound(room_id.clone()))?;
    if state.catalog.team(&team_id).is_none() {
        return Err(ApiError::TeamNotFound(team_id));
    }

    let key = progress_key(room_id, team_id);
    let progress = submit::load_progress(&state, &key)?;
    let total_stages = room.stage_count();
    let is_complete = progress.is_complete(total_stages);

    Ok(Json(json!({
        "progress": progress,
        "totalStages": total_stages,
        "isComplete": is_complete
    })))
}

pub async fn get_contributions(
    State(state): State<AppState>,
    Path((room_id, team_id, stage_index)): Path<(String, String, u32)>,
) -> Result<Json<Value>, ApiError> {
    let key = progress_key(room_id, team_id);
    let (summary, satisfied) = submit::contribution_status(&state, &key, stage_index)?;
    Ok(Json(json!({
        "satisfied": satisfied,
        "message": summary.message(),
        "contributions": summary
    })))
}

pub async fn reset_progress(
    State(state): State<AppState>,
    Path((room_id, team_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    if state.catalog.room(&room_id).is_none() {
        return Err(ApiError::RoomNotFound(room_id));
    }
    if state.catalog.team(&team_id).is_none() {
        return Err(ApiError::TeamNotFound(team_id));
    }
    let key = progress_key(room_id, team_id);
    let removed = state.store.remove(&key)?;
    tracing::info!(%key, removed, "progress reset");
    Ok(Json(json!({ "removed": removed })))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(err) => {
            tracing::error!(error = %err, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                String::new(),
            )
        }
    }
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })),
    )
}
