//! Tunable tables for the heuristic pipeline.
//!
//! Every scorer takes these explicitly. `Default` carries the built-in tables;
//! a JSON file named by `SUGGESTION_TABLES_PATH` can replace any section.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::context::SourceType;
use crate::models::task::TaskPriority;

/// Upper bound for any single lead-time or workload figure (five years).
pub const MAX_LEAD_HOURS: f64 = 5.0 * 365.0 * 24.0;
pub const MAX_CATEGORY_MULTIPLIER: f64 = 10.0;
pub const MAX_RECENT_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionTables {
    pub lexicon: Lexicon,
    pub priority: PriorityWeights,
    pub thresholds: PriorityThresholds,
    pub deadline: DeadlineTable,
    pub categories: CategoryTable,
    pub aggregation: AggregationWeights,
}

impl SuggestionTables {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read suggestion tables from {}", path.display()))?;
        let tables: SuggestionTables = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid suggestion tables in {}", path.display()))?;
        tables.validate()?;
        Ok(tables)
    }

    /// Rejects tables that would break the pipeline's guarantees
    /// (ordered buckets, strictly shorter lead times for higher buckets).
    pub fn validate(&self) -> Result<()> {
        let levels = &self.thresholds.levels;
        if levels.is_empty() {
            bail!("thresholds.levels must not be empty");
        }
        if levels.windows(2).any(|w| w[0].min_score <= w[1].min_score) {
            bail!("thresholds.levels must be sorted by strictly descending min_score");
        }

        let mut previous: Option<f64> = None;
        for level in levels {
            let hours = self.deadline.lead_hours_for(level.priority);
            if !hours.is_finite() || hours <= 0.0 || hours > MAX_LEAD_HOURS {
                bail!(
                    "deadline.lead_hours for {} must be in (0, {MAX_LEAD_HOURS}]",
                    level.priority.as_str()
                );
            }
            if previous.is_some_and(|p| hours <= p) {
                bail!("deadline.lead_hours must grow as priority decreases");
            }
            previous = Some(hours);
        }

        if self
            .deadline
            .category_multipliers
            .values()
            .any(|m| !m.is_finite() || *m <= 0.0 || *m > MAX_CATEGORY_MULTIPLIER)
        {
            bail!("deadline.category_multipliers must be in (0, {MAX_CATEGORY_MULTIPLIER}]");
        }
        let deadline = &self.deadline;
        if !(0.0..=MAX_LEAD_HOURS).contains(&deadline.workload_hours_per_task)
            || !(0.0..=MAX_LEAD_HOURS).contains(&deadline.max_workload_hours)
        {
            bail!("deadline workload hours must be in [0, {MAX_LEAD_HOURS}]");
        }
        if !(0..=MAX_RECENT_WINDOW_DAYS).contains(&self.aggregation.recent_window_days) {
            bail!("aggregation.recent_window_days must be in [0, {MAX_RECENT_WINDOW_DAYS}]");
        }
        if self.categories.default_category.trim().is_empty() {
            bail!("categories.default_category must not be empty");
        }
        if self.categories.tag_count == 0 {
            bail!("categories.tag_count must be at least 1");
        }
        if self.priority.urgency_hit_weight < 0.0 {
            bail!("priority.urgency_hit_weight must not be negative");
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lexicon
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerm {
    pub term: String,
    pub weight: f64,
}

fn weighted(terms: &[(&str, f64)]) -> Vec<WeightedTerm> {
    terms
        .iter()
        .map(|(term, weight)| WeightedTerm {
            term: term.to_string(),
            weight: *weight,
        })
        .collect()
}

fn words(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    pub urgency_terms: Vec<WeightedTerm>,
    pub domain_terms: Vec<WeightedTerm>,
    pub time_markers: Vec<String>,
    pub positive_terms: Vec<String>,
    pub negative_terms: Vec<String>,
    pub stopwords: Vec<String>,
    /// Multiplier applied to (positive - negative) / tokens before clipping.
    pub sentiment_gain: f64,
}

impl Lexicon {
    pub fn urgency_weight(&self, term: &str) -> Option<f64> {
        self.urgency_terms
            .iter()
            .find(|t| t.term == term)
            .map(|t| t.weight)
    }

    pub fn domain_weight(&self, term: &str) -> Option<f64> {
        self.domain_terms
            .iter()
            .find(|t| t.term == term)
            .map(|t| t.weight)
    }

    /// Weight of a keyword in either list. Unknown keywords weigh nothing.
    pub fn keyword_weight(&self, term: &str) -> f64 {
        self.urgency_weight(term)
            .or_else(|| self.domain_weight(term))
            .unwrap_or(0.0)
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.iter().any(|s| s == token)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            urgency_terms: weighted(&[
                ("urgent", 1.0),
                ("asap", 1.0),
                ("emergency", 1.0),
                ("immediately", 0.9),
                ("critical", 0.9),
                ("deadline", 0.8),
                ("overdue", 0.8),
                ("important", 0.6),
                ("priority", 0.6),
                ("due", 0.5),
            ]),
            domain_terms: weighted(&[
                ("client", 0.9),
                ("contract", 0.8),
                ("meeting", 0.8),
                ("presentation", 0.8),
                ("budget", 0.8),
                ("interview", 0.7),
                ("project", 0.7),
                ("report", 0.7),
                ("invoice", 0.7),
                ("manager", 0.6),
                ("review", 0.6),
                ("office", 0.5),
                ("team", 0.5),
                ("call", 0.5),
                ("email", 0.4),
                ("doctor", 0.8),
                ("dentist", 0.8),
                ("medication", 0.8),
                ("appointment", 0.7),
                ("gym", 0.5),
                ("workout", 0.5),
                ("exercise", 0.5),
                ("tax", 0.8),
                ("rent", 0.7),
                ("bill", 0.7),
                ("payment", 0.7),
                ("bank", 0.6),
                ("exam", 0.8),
                ("homework", 0.6),
                ("course", 0.6),
                ("study", 0.6),
                ("book", 0.4),
                ("repair", 0.5),
                ("laundry", 0.4),
                ("clean", 0.4),
                ("garden", 0.3),
                ("cook", 0.3),
                ("birthday", 0.6),
                ("family", 0.5),
                ("grocery", 0.5),
                ("groceries", 0.5),
                ("dinner", 0.4),
                ("party", 0.4),
                ("trip", 0.4),
                ("vacation", 0.4),
                ("friend", 0.3),
                ("weekend", 0.3),
                ("hike", 0.3),
            ]),
            time_markers: words(&[
                "today", "tonight", "tomorrow", "noon", "midnight", "eod",
                "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
            ]),
            positive_terms: words(&[
                "great", "good", "happy", "thanks", "thank", "excellent", "love", "awesome",
                "nice", "glad", "fun", "enjoy", "success", "perfect", "wonderful", "congrats",
                "congratulations", "relaxed",
            ]),
            negative_terms: words(&[
                "problem", "issue", "late", "delay", "delayed", "fail", "failed", "failure",
                "worried", "stress", "stressed", "angry", "bad", "broken", "error", "missed",
                "complaint", "sorry", "unfortunately", "crisis", "blocked", "sick",
            ]),
            stopwords: words(&[
                "a", "an", "the", "and", "or", "but", "for", "to", "of", "in", "on", "at", "by",
                "with", "from", "this", "that", "is", "are", "was", "were", "be", "been", "it",
                "i", "we", "you", "they", "he", "she", "me", "us", "my", "our", "your", "have",
                "has", "will", "up", "anyone", "looks", "so", "as", "if",
            ]),
            sentiment_gain: 4.0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Priority
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    /// Starting score per source type. Work-oriented sources start higher.
    pub source_baselines: HashMap<SourceType, f64>,
    /// Used when a source type is missing from `source_baselines`.
    pub fallback_baseline: f64,
    /// Starting score for a task's own title/description.
    pub task_baseline: f64,
    /// Added per unit of urgency-term weight, counting every occurrence.
    pub urgency_hit_weight: f64,
    /// Added once when any explicit time marker is present.
    pub time_marker_weight: f64,
    /// Added per distinct domain keyword, up to `domain_keyword_cap`.
    pub domain_keyword_weight: f64,
    pub domain_keyword_cap: f64,
    /// Subtracted per unit of sentiment; negative sentiment pushes the score up.
    pub sentiment_weight: f64,
}

impl PriorityWeights {
    pub fn baseline(&self, source: SourceType) -> f64 {
        self.source_baselines
            .get(&source)
            .copied()
            .unwrap_or(self.fallback_baseline)
            .clamp(0.0, 1.0)
    }
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            source_baselines: HashMap::from([
                (SourceType::Email, 0.35),
                (SourceType::Calendar, 0.35),
                (SourceType::Notes, 0.25),
                (SourceType::Whatsapp, 0.2),
                (SourceType::Other, 0.2),
            ]),
            fallback_baseline: 0.2,
            task_baseline: 0.3,
            urgency_hit_weight: 0.35,
            time_marker_weight: 0.15,
            domain_keyword_weight: 0.05,
            domain_keyword_cap: 0.15,
            sentiment_weight: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityLevel {
    pub priority: TaskPriority,
    pub min_score: f64,
}

/// Score → priority bucket table, sorted by descending `min_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityThresholds {
    pub levels: Vec<PriorityLevel>,
}

impl PriorityThresholds {
    pub fn bucket(&self, score: f64) -> TaskPriority {
        self.levels
            .iter()
            .find(|level| score >= level.min_score)
            .or(self.levels.last())
            .map(|level| level.priority)
            .unwrap_or(TaskPriority::Low)
    }

    /// Pulls `score` into the range the table assigns to `priority`.
    pub fn clamp_into(&self, priority: TaskPriority, score: f64) -> f64 {
        let Some(idx) = self.levels.iter().position(|l| l.priority == priority) else {
            return score.clamp(0.0, 1.0);
        };
        let lower = if idx + 1 == self.levels.len() {
            0.0
        } else {
            self.levels[idx].min_score
        };
        let upper = if idx == 0 {
            1.0
        } else {
            // just below the next bucket up
            self.levels[idx - 1].min_score - 1e-6
        };
        score.clamp(lower, upper.max(lower))
    }
}

impl Default for PriorityThresholds {
    fn default() -> Self {
        Self {
            levels: vec![
                PriorityLevel { priority: TaskPriority::Urgent, min_score: 0.8 },
                PriorityLevel { priority: TaskPriority::High, min_score: 0.5 },
                PriorityLevel { priority: TaskPriority::Medium, min_score: 0.3 },
                PriorityLevel { priority: TaskPriority::Low, min_score: 0.0 },
            ],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Deadline
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlineTable {
    pub lead_hours: BTreeMap<TaskPriority, f64>,
    /// Keyed by category name, compared case-insensitively. Missing → 1.0.
    pub category_multipliers: HashMap<String, f64>,
    pub workload_hours_per_task: f64,
    pub max_workload_hours: f64,
}

impl DeadlineTable {
    pub fn lead_hours_for(&self, priority: TaskPriority) -> f64 {
        self.lead_hours.get(&priority).copied().unwrap_or(168.0)
    }

    pub fn multiplier_for(&self, category: Option<&str>) -> f64 {
        category
            .and_then(|name| {
                self.category_multipliers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name.trim()))
                    .map(|(_, m)| *m)
            })
            .unwrap_or(1.0)
    }
}

impl Default for DeadlineTable {
    fn default() -> Self {
        Self {
            lead_hours: BTreeMap::from([
                (TaskPriority::Urgent, 4.0),
                (TaskPriority::High, 24.0),
                (TaskPriority::Medium, 72.0),
                (TaskPriority::Low, 168.0),
            ]),
            category_multipliers: HashMap::from([
                ("Work".to_string(), 1.0),
                ("Health".to_string(), 1.0),
                ("Finance".to_string(), 1.0),
                ("Personal".to_string(), 1.5),
                ("Learning".to_string(), 1.5),
                ("Home".to_string(), 1.5),
            ]),
            workload_hours_per_task: 12.0,
            max_workload_hours: 72.0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Categories
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCluster {
    pub name: String,
    pub keywords: Vec<String>,
}

fn cluster(name: &str, keywords: &[&str]) -> CategoryCluster {
    CategoryCluster {
        name: name.to_string(),
        keywords: words(keywords),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryTable {
    /// Declaration order breaks ties.
    pub clusters: Vec<CategoryCluster>,
    pub default_category: String,
    pub tag_count: usize,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            clusters: vec![
                cluster(
                    "Work",
                    &[
                        "client", "contract", "meeting", "presentation", "budget", "interview",
                        "project", "report", "invoice", "manager", "review", "office", "team",
                        "deadline",
                    ],
                ),
                cluster(
                    "Personal",
                    &[
                        "birthday", "family", "grocery", "groceries", "dinner", "party", "trip",
                        "vacation", "friend", "weekend", "hike", "appointment",
                    ],
                ),
                cluster(
                    "Health",
                    &["doctor", "dentist", "medication", "gym", "workout", "exercise"],
                ),
                cluster("Finance", &["tax", "rent", "bill", "payment", "bank"]),
                cluster("Learning", &["exam", "homework", "course", "study", "book"]),
                cluster("Home", &["repair", "laundry", "clean", "garden", "cook"]),
            ],
            default_category: "General".to_string(),
            tag_count: 3,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationWeights {
    pub recent_window_days: i64,
    pub max_context_entries: usize,
    /// Frequency weight of a task's own keywords relative to one context entry.
    pub task_keyword_weight: f64,
    /// Scale applied to the strongest context priority before the max.
    pub context_weight: f64,
    pub snippet_chars: usize,
}

impl Default for AggregationWeights {
    fn default() -> Self {
        Self {
            recent_window_days: 7,
            max_context_entries: 10,
            task_keyword_weight: 3.0,
            context_weight: 0.6,
            snippet_chars: 80,
        }
    }
}
