pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::state::AppState;
use crate::suggestion::handlers;

async fn not_found() -> AppError {
    AppError::NotFound("no such route".to_string())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Context API
        .route("/api/v1/context/score", post(handlers::handle_score_context))
        .route("/api/v1/context/ingest", post(handlers::handle_ingest_context))
        // Task API
        .route(
            "/api/v1/tasks/suggestions",
            post(handlers::handle_task_suggestions),
        )
        .route("/api/v1/tasks/draft", post(handlers::handle_draft_task))
        .route("/api/v1/tasks/toggle", post(handlers::handle_toggle_status))
        .route("/api/v1/tasks/stats", post(handlers::handle_task_stats))
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::task::Task;
    use crate::suggestion::dispatcher::SuggestionDispatcher;
    use crate::suggestion::tables::SuggestionTables;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        let config = Config::from_lookup(|_| None).unwrap();
        let dispatcher = SuggestionDispatcher::heuristic_only(Arc::new(SuggestionTables::default()));
        build_router(AppState {
            config,
            dispatcher: Arc::new(dispatcher),
        })
    }

    async fn send(method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health_reports_heuristic_backend() {
        let (status, body) = send("GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "smart-todo-api");
        assert_eq!(body["suggestions"]["backend"], "heuristic");
        assert!(body["suggestions"]["model"].is_null());
    }

    #[tokio::test]
    async fn test_score_context_route() {
        let (status, body) = send(
            "POST",
            "/api/v1/context/score",
            Some(json!({
                "content": "Urgent: Client meeting tomorrow at 2 PM. Need presentation ready by noon.",
                "source_type": "whatsapp"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "heuristic");
        assert!(body["priority_score"].as_f64().unwrap() >= 0.8);
    }

    #[tokio::test]
    async fn test_task_suggestions_route() {
        let (status, body) = send(
            "POST",
            "/api/v1/tasks/suggestions",
            Some(json!({
                "title": "Weather looks great for the weekend. Anyone up for a hike?"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "Personal");
        assert!(body["priority_score"].as_f64().unwrap() <= 0.4);
        assert!(body["suggested_deadline"].is_string());
    }

    #[tokio::test]
    async fn test_ingest_route_scores_entry() {
        let (status, body) = send(
            "POST",
            "/api/v1/context/ingest",
            Some(json!({
                "user_id": Uuid::new_v4(),
                "content": "Dentist appointment on friday",
                "source_type": "calendar"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scored_by"], "heuristic");
        assert_eq!(body["entry"]["source_type"], "calendar");
        assert!(body["entry"]["analysis"]["keywords"]
            .as_array()
            .unwrap()
            .contains(&json!("dentist")));
    }

    #[tokio::test]
    async fn test_draft_with_empty_title_is_bad_request() {
        let (status, body) = send(
            "POST",
            "/api/v1/tasks/draft",
            Some(json!({"user_id": Uuid::new_v4(), "title": " "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_toggle_route_completes_pending_task() {
        let task = Task::new(Uuid::new_v4(), "Buy groceries");
        let (status, body) = send(
            "POST",
            "/api/v1/tasks/toggle",
            Some(serde_json::to_value(&task).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert!(body["completed_at"].is_string());
    }

    #[tokio::test]
    async fn test_stats_route_counts_overdue() {
        let mut late = Task::new(Uuid::new_v4(), "Pay rent");
        late.due_date = Some(Utc::now() - Duration::days(2));
        let mut done = Task::new(Uuid::new_v4(), "File taxes");
        done.toggle_status();

        let (status, body) = send(
            "POST",
            "/api/v1/tasks/stats",
            Some(json!({"tasks": [late, done]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["overdue"], 1);
        assert_eq!(body["completed"], 1);
        assert_eq!(body["completion_rate"], 50.0);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (status, body) = send("GET", "/api/v1/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
