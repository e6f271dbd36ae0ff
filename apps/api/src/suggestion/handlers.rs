//! Axum route handlers for the Suggestion API.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::task::{Task, TaskStats};
use crate::suggestion::engine::{
    ContextScore, ContextScoreRequest, SuggestionBundle, TaskSuggestionRequest,
};
use crate::suggestion::ingest::{
    draft_task, ingest_context_entry, IngestRequest, IngestResponse, TaskDraftRequest,
    TaskDraftResponse,
};
use crate::state::AppState;

/// POST /api/v1/context/score
///
/// Scores a piece of context without storing anything. Empty content is
/// valid and yields a neutral score.
pub async fn handle_score_context(
    State(state): State<AppState>,
    Json(request): Json<ContextScoreRequest>,
) -> Json<ContextScore> {
    Json(state.dispatcher.score_context(&request).await)
}

/// POST /api/v1/context/ingest
pub async fn handle_ingest_context(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, AppError> {
    let response = ingest_context_entry(&state.dispatcher, request).await?;
    Ok(Json(response))
}

/// POST /api/v1/tasks/suggestions
///
/// Always answers with a full bundle; provider trouble is absorbed by the dispatcher.
pub async fn handle_task_suggestions(
    State(state): State<AppState>,
    Json(request): Json<TaskSuggestionRequest>,
) -> Json<SuggestionBundle> {
    Json(state.dispatcher.suggest_for_task(&request, Utc::now()).await)
}

/// POST /api/v1/tasks/draft
pub async fn handle_draft_task(
    State(state): State<AppState>,
    Json(request): Json<TaskDraftRequest>,
) -> Result<Json<TaskDraftResponse>, AppError> {
    let response = draft_task(&state.dispatcher, request, Utc::now()).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct TaskStatsRequest {
    pub tasks: Vec<Task>,
}

/// POST /api/v1/tasks/toggle
///
/// Flips a task between pending and completed. Other states come back unchanged.
pub async fn handle_toggle_status(Json(mut task): Json<Task>) -> Json<Task> {
    task.toggle_status();
    Json(task)
}

/// POST /api/v1/tasks/stats
pub async fn handle_task_stats(
    State(state): State<AppState>,
    Json(request): Json<TaskStatsRequest>,
) -> Json<TaskStats> {
    Json(TaskStats::from_tasks(
        &request.tasks,
        Utc::now(),
        &state.dispatcher.tables().thresholds,
    ))
}
