//! Local suggestion pipeline.
//!
//! Runs the extractor over a task's own text, folds in the signals of its
//! recent context entries, then hands the merged set to the priority,
//! deadline and category scorers. Pure: same input, same bundle.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use crate::models::context::{ContextAnalysis, ContextEntry};
use crate::suggestion::categorize::{suggest_category, suggest_tags, KeywordWeights};
use crate::suggestion::deadline::suggest_deadline;
use crate::suggestion::engine::{
    ContextScore, ContextScoreRequest, SuggestionBundle, SuggestionSource, TaskSuggestionRequest,
};
use crate::suggestion::extractor::{extract, ExtractedSignals};
use crate::suggestion::priority::{score_for_source, score_priority};
use crate::suggestion::tables::{AggregationWeights, SuggestionTables};

pub fn score_context(request: &ContextScoreRequest, tables: &SuggestionTables) -> ContextScore {
    let signals = extract(&request.content, &tables.lexicon);
    let priority_score =
        score_for_source(&signals, request.source_type, &tables.priority, &tables.lexicon);

    ContextScore {
        keywords: signals.keywords.into_iter().collect(),
        sentiment_score: signals.sentiment,
        priority_score,
        source: SuggestionSource::Heuristic,
    }
}

/// Entries inside the recency window, newest first, at most `max_context_entries`.
pub fn select_recent<'a>(
    entries: &'a [ContextEntry],
    now: DateTime<Utc>,
    weights: &AggregationWeights,
) -> Vec<&'a ContextEntry> {
    let window = Duration::try_days(weights.recent_window_days.max(0)).unwrap_or(Duration::MAX);
    let mut recent: Vec<&ContextEntry> = entries
        .iter()
        .filter(|e| now - e.created_at <= window)
        .collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(weights.max_context_entries);
    recent
}

pub fn suggest_for_task(
    request: &TaskSuggestionRequest,
    now: DateTime<Utc>,
    tables: &SuggestionTables,
) -> SuggestionBundle {
    let weights = &tables.aggregation;
    let task_text = format!("{} {}", request.title.trim(), request.description.trim());
    let task_signals = extract(&task_text, &tables.lexicon);

    // Unscored entries are scored on the fly and not persisted here.
    let context: Vec<(&ContextEntry, ContextAnalysis)> =
        select_recent(&request.linked_context, now, weights)
            .into_iter()
            .map(|entry| {
                let analysis = entry.analysis.clone().unwrap_or_else(|| {
                    score_context(
                        &ContextScoreRequest {
                            content: entry.content.clone(),
                            source_type: entry.source_type,
                            source_title: entry.source_title.clone(),
                        },
                        tables,
                    )
                    .into()
                });
                (entry, analysis)
            })
            .collect();

    let keyword_weights = merge_keywords(&task_signals, &context, weights);

    let sentiment_total: f64 = task_signals.sentiment
        + context.iter().map(|(_, a)| a.sentiment_score).sum::<f64>();
    let sentiment = (sentiment_total / (context.len() + 1) as f64).clamp(-1.0, 1.0);

    let merged = ExtractedSignals {
        keywords: keyword_weights.keys().cloned().collect(),
        sentiment,
        ..task_signals.clone()
    };
    let own_score = score_priority(
        &merged,
        tables.priority.task_baseline,
        &tables.priority,
        &tables.lexicon,
    );
    let context_peak = context
        .iter()
        .map(|(_, a)| a.priority_score)
        .fold(0.0_f64, f64::max);
    let priority_score = own_score.max(weights.context_weight * context_peak).clamp(0.0, 1.0);

    let category = suggest_category(&keyword_weights, &tables.categories).category;
    let tags = suggest_tags(&keyword_weights, &tables.lexicon, tables.categories.tag_count);
    let deadline = suggest_deadline(
        priority_score,
        Some(&category),
        request.due_date,
        request.current_workload,
        now,
        &tables.thresholds,
        &tables.deadline,
    );

    let enhanced_description = enhance_description(request, &task_signals, &context, weights);

    SuggestionBundle {
        priority_score,
        priority: tables.thresholds.bucket(priority_score),
        suggested_deadline: deadline.suggested_deadline,
        user_due_date: deadline.user_due_date,
        category,
        tags,
        enhanced_description,
        source: SuggestionSource::Heuristic,
    }
}

/// Task keywords count `task_keyword_weight` each, every context mention counts 1.
fn merge_keywords(
    task: &ExtractedSignals,
    context: &[(&ContextEntry, ContextAnalysis)],
    weights: &AggregationWeights,
) -> KeywordWeights {
    let mut merged = KeywordWeights::new();
    for keyword in &task.keywords {
        *merged.entry(keyword.clone()).or_insert(0.0) += weights.task_keyword_weight;
    }
    for (_, analysis) in context {
        for keyword in &analysis.keywords {
            *merged.entry(keyword.clone()).or_insert(0.0) += 1.0;
        }
    }
    merged
}

fn enhance_description(
    request: &TaskSuggestionRequest,
    task_signals: &ExtractedSignals,
    context: &[(&ContextEntry, ContextAnalysis)],
    weights: &AggregationWeights,
) -> String {
    let title = request.title.trim();
    let description = request.description.trim();

    let base = if !description.is_empty() {
        description.to_string()
    } else if !title.is_empty() {
        format!("Task: {title}. Please add more details as needed.")
    } else {
        String::new()
    };

    // highest priority wins, newest on ties (context is already newest first)
    let top = context.iter().fold(None, |best: Option<&(&ContextEntry, ContextAnalysis)>, item| {
        match best {
            Some(b) if b.1.priority_score >= item.1.priority_score => Some(b),
            _ => Some(item),
        }
    });

    let Some((entry, analysis)) = top else {
        return base;
    };

    let mut clause = format!("Related {}", entry.source_type.label());
    if let Some(source_title) = &entry.source_title {
        clause.push_str(&format!(" \"{}\"", source_title.trim()));
    }
    clause.push_str(&format!(": \"{}\"", snippet(&entry.content, weights.snippet_chars)));

    let shared: BTreeSet<&str> = analysis
        .keywords
        .iter()
        .map(String::as_str)
        .filter(|k| task_signals.keywords.contains(*k))
        .collect();
    if !shared.is_empty() {
        clause.push_str(&format!(
            " (shared topics: {})",
            shared.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    clause.push('.');

    if base.is_empty() {
        clause
    } else {
        format!("{base}\n\n{clause}")
    }
}

/// Whitespace collapsed, cut at `max_chars` with a trailing ellipsis.
fn snippet(content: &str, max_chars: usize) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
