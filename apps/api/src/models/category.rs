use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CATEGORY_COLOR: &str = "#3B82F6";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub usage_frequency: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            color: default_color(),
            usage_frequency: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    /// Called each time the category is assigned to a task.
    pub fn record_assignment(&mut self) {
        self.usage_frequency = self.usage_frequency.saturating_add(1);
        self.updated_at = Utc::now();
    }
}

/// Get-or-create by name (case-insensitive) and count the assignment.
/// Returns the index of the resolved category in `categories`.
pub fn resolve_category(categories: &mut Vec<Category>, name: &str) -> usize {
    let idx = match categories.iter().position(|c| c.matches_name(name)) {
        Some(idx) => idx,
        None => {
            categories.push(Category::new(name));
            categories.len() - 1
        }
    };
    categories[idx].record_assignment();
    idx
}

/// Most-used first, then by name.
pub fn sort_by_usage(categories: &mut [Category]) {
    categories.sort_by(|a, b| {
        b.usage_frequency
            .cmp(&a.usage_frequency)
            .then_with(|| a.name.cmp(&b.name))
    });
}
