use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a context snippet came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Whatsapp,
    Email,
    #[default]
    Notes,
    Calendar,
    Other,
}

impl SourceType {
    pub const ALL: [SourceType; 5] = [
        SourceType::Whatsapp,
        SourceType::Email,
        SourceType::Notes,
        SourceType::Calendar,
        SourceType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Whatsapp => "whatsapp",
            SourceType::Email => "email",
            SourceType::Notes => "notes",
            SourceType::Calendar => "calendar",
            SourceType::Other => "other",
        }
    }

    /// Human-readable label used in enhanced descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            SourceType::Whatsapp => "WhatsApp message",
            SourceType::Email => "email",
            SourceType::Notes => "note",
            SourceType::Calendar => "calendar event",
            SourceType::Other => "context entry",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown source type '{s}'"))
    }
}

/// Derived fields produced by `score_context`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextAnalysis {
    pub keywords: Vec<String>,
    pub sentiment_score: f64,
    pub priority_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub source_title: Option<String>,
    /// `None` until the entry has been scored.
    #[serde(default)]
    pub analysis: Option<ContextAnalysis>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContextEntry {
    pub fn new(
        user_id: Uuid,
        content: impl Into<String>,
        source_type: SourceType,
        source_title: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            content: content.into(),
            source_type,
            source_title: source_title.filter(|t| !t.trim().is_empty()),
            analysis: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.analysis.is_some()
    }

    pub fn apply_analysis(&mut self, analysis: ContextAnalysis) {
        self.analysis = Some(analysis);
        self.updated_at = Utc::now();
    }

    /// Replaces the content. The stored analysis is dropped only when the text
    /// actually changed, so the entry is re-scored at most once per edit.
    pub fn update_content(&mut self, content: impl Into<String>) {
        let content = content.into();
        if content != self.content {
            self.content = content;
            self.analysis = None;
            self.updated_at = Utc::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_serde_lowercase() {
        let json = serde_json::to_string(&SourceType::Whatsapp).unwrap();
        assert_eq!(json, r#""whatsapp""#);
        let parsed: SourceType = serde_json::from_str(r#""calendar""#).unwrap();
        assert_eq!(parsed, SourceType::Calendar);
    }

    #[test]
    fn test_source_type_from_str_is_case_insensitive() {
        assert_eq!("Email".parse::<SourceType>().unwrap(), SourceType::Email);
        assert!("fax".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_default_source_is_notes() {
        assert_eq!(SourceType::default(), SourceType::Notes);
    }

    #[test]
    fn test_blank_source_title_is_dropped() {
        let entry = ContextEntry::new(Uuid::new_v4(), "hi", SourceType::Email, Some("  ".into()));
        assert!(entry.source_title.is_none());
    }

    #[test]
    fn test_update_content_clears_analysis_only_on_change() {
        let mut entry = ContextEntry::new(Uuid::new_v4(), "call the bank", SourceType::Notes, None);
        entry.apply_analysis(ContextAnalysis {
            keywords: vec!["bank".to_string()],
            sentiment_score: 0.0,
            priority_score: 0.3,
        });

        entry.update_content("call the bank");
        assert!(entry.is_scored());

        entry.update_content("call the bank today");
        assert!(!entry.is_scored());
    }
}
