use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::category::{resolve_category, sort_by_usage, Category};
use crate::models::context::{ContextEntry, SourceType};
use crate::models::task::{Task, TaskPriority};
use crate::suggestion::dispatcher::SuggestionDispatcher;
use crate::suggestion::engine::{
    ContextScoreRequest, SuggestionBundle, SuggestionSource, TaskSuggestionRequest,
};

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub user_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub source_title: Option<String>,
    /// The stored entry when this is an edit. Its analysis is kept if the text is unchanged.
    #[serde(default)]
    pub existing: Option<ContextEntry>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub entry: ContextEntry,
    /// `None` when an unchanged edit kept the stored analysis.
    pub scored_by: Option<SuggestionSource>,
}

/// Builds (or edits) a context entry and scores it if it has no analysis yet.
pub async fn ingest_context_entry(
    dispatcher: &SuggestionDispatcher,
    request: IngestRequest,
) -> Result<IngestResponse, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let mut entry = match request.existing {
        Some(mut existing) => {
            if existing.user_id != request.user_id {
                return Err(AppError::Validation(
                    "existing entry belongs to another user".to_string(),
                ));
            }
            existing.source_type = request.source_type;
            existing.source_title = request.source_title.filter(|t| !t.trim().is_empty());
            existing.update_content(request.content);
            existing
        }
        None => ContextEntry::new(
            request.user_id,
            request.content,
            request.source_type,
            request.source_title,
        ),
    };

    if entry.is_scored() {
        return Ok(IngestResponse {
            entry,
            scored_by: None,
        });
    }

    let score = dispatcher
        .score_context(&ContextScoreRequest {
            content: entry.content.clone(),
            source_type: entry.source_type,
            source_title: entry.source_title.clone(),
        })
        .await;
    let scored_by = score.source;
    entry.apply_analysis(score.into());

    info!(
        "Scored {} entry {} ({:?})",
        entry.source_type, entry.id, scored_by
    );

    Ok(IngestResponse {
        entry,
        scored_by: Some(scored_by),
    })
}

#[derive(Debug, Deserialize)]
pub struct TaskDraftRequest {
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Set when the user picked a priority explicitly.
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub linked_context: Vec<ContextEntry>,
    /// The user's existing categories.
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub current_workload: u32,
}

#[derive(Debug, Serialize)]
pub struct TaskDraftResponse {
    pub task: Task,
    /// Updated category list, most used first.
    pub categories: Vec<Category>,
    pub suggestions: SuggestionBundle,
}

/// Builds a new task, fills its advisory fields from the suggestion bundle
/// and records the category assignment.
pub async fn draft_task(
    dispatcher: &SuggestionDispatcher,
    request: TaskDraftRequest,
    now: DateTime<Utc>,
) -> Result<TaskDraftResponse, AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if request.due_date.is_some_and(|due| due < now) {
        return Err(AppError::Validation(
            "due_date cannot be in the past".to_string(),
        ));
    }

    let linked_context: Vec<ContextEntry> = request
        .linked_context
        .into_iter()
        .filter(|e| e.user_id == request.user_id)
        .collect();

    let mut task = Task::new(request.user_id, &request.title);
    task.description = request
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    task.due_date = request.due_date;
    task.category = request
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    task.tags = request.tags;
    task.context_references = linked_context.iter().map(|e| e.id).collect();
    if let Some(priority) = request.priority {
        task.set_user_priority(priority);
    }

    let suggestions = dispatcher
        .suggest_for_task(
            &TaskSuggestionRequest {
                title: task.title.clone(),
                description: task.description.clone().unwrap_or_default(),
                linked_context,
                due_date: task.due_date,
                current_workload: request.current_workload,
            },
            now,
        )
        .await;

    task.apply_suggestions(&suggestions, &dispatcher.tables().thresholds, false);

    let mut categories = request.categories;
    if let Some(name) = &task.category {
        let idx = resolve_category(&mut categories, name);
        // use the stored spelling
        task.category = Some(categories[idx].name.clone());
    }
    sort_by_usage(&mut categories);

    Ok(TaskDraftResponse {
        task,
        categories,
        suggestions,
    })
}
