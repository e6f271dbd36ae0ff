use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::suggestion::engine::SuggestionBundle;
use crate::suggestion::tables::PriorityThresholds;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Set when the user picked `priority` themselves; suggestions then leave it alone.
    #[serde(default)]
    pub priority_user_set: bool,
    pub priority_score: f64,
    pub due_date: Option<DateTime<Utc>>,
    pub suggested_deadline: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub ai_enhanced_description: Option<String>,
    pub context_references: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(user_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into().trim().to_string(),
            description: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            priority_user_set: false,
            priority_score: 0.0,
            due_date: None,
            suggested_deadline: None,
            category: None,
            tags: vec![],
            ai_enhanced_description: None,
            context_references: vec![],
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn set_user_priority(&mut self, priority: TaskPriority) {
        self.priority = priority;
        self.priority_user_set = true;
        self.updated_at = Utc::now();
    }

    /// Moving into `Completed` stamps `completed_at`; moving out clears it.
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.completed_at = match status {
            TaskStatus::Completed => self.completed_at.or_else(|| Some(Utc::now())),
            _ => None,
        };
        self.updated_at = Utc::now();
    }

    /// Flips pending <-> completed. Other states are left as they are.
    pub fn toggle_status(&mut self) {
        match self.status {
            TaskStatus::Pending => self.set_status(TaskStatus::Completed),
            TaskStatus::Completed => self.set_status(TaskStatus::Pending),
            TaskStatus::InProgress | TaskStatus::Cancelled => {}
        }
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, TaskStatus::Pending | TaskStatus::InProgress)
            && self.due_date.is_some_and(|due| due < now)
    }

    pub fn priority_is_consistent(&self, thresholds: &PriorityThresholds) -> bool {
        thresholds.bucket(self.priority_score) == self.priority
    }

    /// Copies advisory suggestions onto the task.
    ///
    /// Suggestion-owned fields (`suggested_deadline`, `ai_enhanced_description`,
    /// `priority_score`) are always refreshed. User-entered fields (priority,
    /// category, tags) are only filled when empty, unless `overwrite` is set.
    /// `description` and `due_date` are never touched.
    pub fn apply_suggestions(
        &mut self,
        bundle: &SuggestionBundle,
        thresholds: &PriorityThresholds,
        overwrite: bool,
    ) {
        if self.priority_user_set && !overwrite {
            // keep the score inside the user's bucket
            self.priority_score = thresholds.clamp_into(self.priority, bundle.priority_score);
        } else {
            self.priority_score = bundle.priority_score.clamp(0.0, 1.0);
            self.priority = thresholds.bucket(self.priority_score);
            self.priority_user_set = false;
        }

        if overwrite || self.category.is_none() {
            self.category = Some(bundle.category.clone());
        }
        if overwrite || self.tags.is_empty() {
            self.tags = bundle.tags.clone();
        }

        self.suggested_deadline = Some(bundle.suggested_deadline);
        self.ai_enhanced_description = Some(bundle.enhanced_description.clone());
        self.updated_at = Utc::now();
    }
}

/// Counts over a user's task list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// High or urgent.
    pub high_priority: usize,
    pub overdue: usize,
    /// Tasks whose priority bucket disagrees with their score.
    pub inconsistent_priority: usize,
    /// Percentage, one decimal.
    pub completion_rate: f64,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task], now: DateTime<Utc>, thresholds: &PriorityThresholds) -> Self {
        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        let total = tasks.len();
        let completed = count(TaskStatus::Completed);
        let completion_rate = if total == 0 {
            0.0
        } else {
            (completed as f64 / total as f64 * 1000.0).round() / 10.0
        };

        Self {
            total,
            pending: count(TaskStatus::Pending),
            in_progress: count(TaskStatus::InProgress),
            completed,
            cancelled: count(TaskStatus::Cancelled),
            high_priority: tasks.iter().filter(|t| t.priority >= TaskPriority::High).count(),
            overdue: tasks.iter().filter(|t| t.is_overdue(now)).count(),
            inconsistent_priority: tasks
                .iter()
                .filter(|t| !t.priority_is_consistent(thresholds))
                .count(),
            completion_rate,
        }
    }
}
