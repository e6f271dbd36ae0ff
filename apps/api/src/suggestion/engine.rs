//! Suggestion engines: one contract, two backends.
//!
//! `HeuristicEngine` runs the local pipeline and always succeeds.
//! `ProviderEngine` asks the external AI provider and validates what comes back.
//! The dispatcher decides which one answers.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::models::context::{ContextAnalysis, ContextEntry, SourceType};
use crate::models::task::TaskPriority;
use crate::suggestion::aggregator;
use crate::suggestion::prompts::{fill_template, CONTEXT_SCORE_PROMPT, TASK_SUGGESTION_PROMPT};
use crate::suggestion::tables::SuggestionTables;

// ────────────────────────────────────────────────────────────────────────────
// Contract types (shared across all backends)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextScoreRequest {
    pub content: String,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub source_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextScore {
    pub keywords: Vec<String>,
    pub sentiment_score: f64,
    pub priority_score: f64,
    pub source: SuggestionSource,
}

impl From<ContextScore> for ContextAnalysis {
    fn from(score: ContextScore) -> Self {
        ContextAnalysis {
            keywords: score.keywords,
            sentiment_score: score.sentiment_score,
            priority_score: score.priority_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSuggestionRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub linked_context: Vec<ContextEntry>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Number of pending tasks the user already has.
    #[serde(default)]
    pub current_workload: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionBundle {
    pub priority_score: f64,
    pub priority: TaskPriority,
    pub suggested_deadline: DateTime<Utc>,
    /// The user's own due date, surfaced next to the suggestion, never merged.
    pub user_due_date: Option<DateTime<Utc>>,
    pub category: String,
    pub tags: Vec<String>,
    pub enhanced_description: String,
    pub source: SuggestionSource,
}

/// Which backend produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    Provider,
    Heuristic,
}

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("AI provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("AI provider not configured: {0}")]
    ConfigurationMissing(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to add a backend without touching handlers or the dispatcher.
#[async_trait]
pub trait SuggestionEngine: Send + Sync {
    fn backend(&self) -> SuggestionSource;

    async fn score_context(&self, request: &ContextScoreRequest)
        -> Result<ContextScore, SuggestError>;

    async fn suggest_for_task(
        &self,
        request: &TaskSuggestionRequest,
        now: DateTime<Utc>,
    ) -> Result<SuggestionBundle, SuggestError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicEngine
// ────────────────────────────────────────────────────────────────────────────

/// Local, deterministic pipeline. Never fails.
#[derive(Clone)]
pub struct HeuristicEngine {
    tables: Arc<SuggestionTables>,
}

impl HeuristicEngine {
    pub fn new(tables: Arc<SuggestionTables>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &SuggestionTables {
        &self.tables
    }

    pub fn score(&self, request: &ContextScoreRequest) -> ContextScore {
        aggregator::score_context(request, &self.tables)
    }

    pub fn suggest(&self, request: &TaskSuggestionRequest, now: DateTime<Utc>) -> SuggestionBundle {
        aggregator::suggest_for_task(request, now, &self.tables)
    }
}

#[async_trait]
impl SuggestionEngine for HeuristicEngine {
    fn backend(&self) -> SuggestionSource {
        SuggestionSource::Heuristic
    }

    async fn score_context(
        &self,
        request: &ContextScoreRequest,
    ) -> Result<ContextScore, SuggestError> {
        Ok(self.score(request))
    }

    async fn suggest_for_task(
        &self,
        request: &TaskSuggestionRequest,
        now: DateTime<Utc>,
    ) -> Result<SuggestionBundle, SuggestError> {
        Ok(self.suggest(request, now))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ProviderEngine
// ────────────────────────────────────────────────────────────────────────────

/// Raw provider answer for `score_context`, validated before use.
#[derive(Debug, Deserialize)]
struct ProviderContextScore {
    keywords: Vec<String>,
    sentiment_score: f64,
    priority_score: f64,
}

/// Raw provider answer for `suggest_for_task`, validated before use.
#[derive(Debug, Deserialize)]
struct ProviderTaskSuggestion {
    priority_score: f64,
    suggested_deadline: String,
    category: String,
    #[serde(default)]
    tags: Vec<String>,
    enhanced_description: String,
}

pub struct ProviderEngine {
    llm: LlmClient,
    tables: Arc<SuggestionTables>,
}

impl ProviderEngine {
    pub fn new(llm: LlmClient, tables: Arc<SuggestionTables>) -> Self {
        Self { llm, tables }
    }
}

#[async_trait]
impl SuggestionEngine for ProviderEngine {
    fn backend(&self) -> SuggestionSource {
        SuggestionSource::Provider
    }

    async fn score_context(
        &self,
        request: &ContextScoreRequest,
    ) -> Result<ContextScore, SuggestError> {
        if request.content.trim().is_empty() {
            return Err(SuggestError::InvalidInput("content is empty".to_string()));
        }

        let prompt = fill_template(
            CONTEXT_SCORE_PROMPT,
            &[
                ("source_type", request.source_type.as_str()),
                ("source_title", request.source_title.as_deref().unwrap_or("(none)")),
                ("content", request.content.as_str()),
            ],
        );

        let raw: ProviderContextScore = self
            .llm
            .call_json(&prompt, JSON_ONLY_SYSTEM)
            .await
            .map_err(|e| SuggestError::ProviderUnavailable(e.to_string()))?;

        check_unit_range("sentiment_score", raw.sentiment_score, -1.0)?;
        check_unit_range("priority_score", raw.priority_score, 0.0)?;

        debug!("Provider scored context: priority={:.2}", raw.priority_score);

        Ok(ContextScore {
            keywords: normalize_terms(raw.keywords, usize::MAX),
            sentiment_score: raw.sentiment_score,
            priority_score: raw.priority_score,
            source: SuggestionSource::Provider,
        })
    }

    async fn suggest_for_task(
        &self,
        request: &TaskSuggestionRequest,
        now: DateTime<Utc>,
    ) -> Result<SuggestionBundle, SuggestError> {
        if request.title.trim().is_empty() && request.description.trim().is_empty() {
            return Err(SuggestError::InvalidInput(
                "title and description are both empty".to_string(),
            ));
        }

        let recent = aggregator::select_recent(&request.linked_context, now, &self.tables.aggregation);
        let context_summary = if recent.is_empty() {
            "(none)".to_string()
        } else {
            recent
                .iter()
                .map(|e| format!("- [{}] {}", e.source_type, e.content.trim()))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let now_text = now.format("%Y-%m-%d %H:%M").to_string();
        let workload = request.current_workload.to_string();
        let categories = category_names(&self.tables);
        let prompt = fill_template(
            TASK_SUGGESTION_PROMPT,
            &[
                ("now", now_text.as_str()),
                ("workload", workload.as_str()),
                ("categories", categories.as_str()),
                ("title", request.title.trim()),
                ("description", request.description.trim()),
                ("context", context_summary.as_str()),
            ],
        );

        let raw: ProviderTaskSuggestion = self
            .llm
            .call_json(&prompt, JSON_ONLY_SYSTEM)
            .await
            .map_err(|e| SuggestError::ProviderUnavailable(e.to_string()))?;

        check_unit_range("priority_score", raw.priority_score, 0.0)?;

        let suggested_deadline = parse_deadline(&raw.suggested_deadline).ok_or_else(|| {
            SuggestError::ProviderUnavailable(format!(
                "unparseable suggested_deadline '{}'",
                raw.suggested_deadline
            ))
        })?;
        if suggested_deadline < now {
            return Err(SuggestError::ProviderUnavailable(
                "suggested_deadline is in the past".to_string(),
            ));
        }

        let category = raw.category.trim().to_string();
        if category.is_empty() {
            return Err(SuggestError::ProviderUnavailable("empty category".to_string()));
        }
        let enhanced_description = raw.enhanced_description.trim().to_string();
        if enhanced_description.is_empty() {
            return Err(SuggestError::ProviderUnavailable(
                "empty enhanced_description".to_string(),
            ));
        }

        Ok(SuggestionBundle {
            priority_score: raw.priority_score,
            priority: self.tables.thresholds.bucket(raw.priority_score),
            suggested_deadline,
            user_due_date: request.due_date,
            category,
            tags: normalize_terms(raw.tags, self.tables.categories.tag_count),
            enhanced_description,
            source: SuggestionSource::Provider,
        })
    }
}

fn check_unit_range(field: &str, value: f64, min: f64) -> Result<(), SuggestError> {
    if value.is_finite() && (min..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SuggestError::ProviderUnavailable(format!(
            "{field} out of range: {value}"
        )))
    }
}

/// Lowercased, trimmed, de-duplicated, order preserved, at most `limit`.
fn normalize_terms(terms: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = BTreeSet::new();
    terms
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .take(limit)
        .collect()
}

/// Accepts RFC 3339 or `YYYY-MM-DD HH:MM` (read as UTC).
fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
                .ok()
                .map(|n| n.and_utc())
        })
}

fn category_names(tables: &SuggestionTables) -> String {
    let mut names: Vec<&str> = tables
        .categories
        .clusters
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    names.push(&tables.categories.default_category);
    names.join(", ")
}
