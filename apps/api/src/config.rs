use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::{ProviderSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::suggestion::engine::SuggestError;
use crate::suggestion::tables::SuggestionTables;

const DEFAULT_PROVIDER_TIMEOUT_SECS: f64 = 8.0;
const MAX_PROVIDER_TIMEOUT_SECS: f64 = 600.0;

/// Application configuration loaded from environment variables.
/// Nothing is required: with no AI provider configured the service runs
/// on the local heuristic pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub ai_provider_enabled: bool,
    pub ai_provider_timeout_secs: f64,
    pub ai_provider_api_key: Option<String>,
    pub ai_provider_base_url: String,
    pub ai_provider_model: String,
    pub ai_provider_max_retries: u32,
    /// JSON file overriding the built-in lexicon and threshold tables.
    pub suggestion_tables_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Config {
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            ai_provider_enabled: match get("AI_PROVIDER_ENABLED") {
                Some(v) => parse_bool(&v)
                    .with_context(|| format!("AI_PROVIDER_ENABLED must be true or false, got '{v}'"))?,
                None => false,
            },
            ai_provider_timeout_secs: match get("AI_PROVIDER_TIMEOUT_SECONDS") {
                Some(v) => v
                    .parse::<f64>()
                    .ok()
                    .filter(|secs| secs.is_finite() && *secs > 0.0 && *secs <= MAX_PROVIDER_TIMEOUT_SECS)
                    .with_context(|| {
                        format!("AI_PROVIDER_TIMEOUT_SECONDS must be a number in (0, {MAX_PROVIDER_TIMEOUT_SECS}], got '{v}'")
                    })?,
                None => DEFAULT_PROVIDER_TIMEOUT_SECS,
            },
            ai_provider_api_key: get("AI_PROVIDER_API_KEY"),
            ai_provider_base_url: get("AI_PROVIDER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            ai_provider_model: get("AI_PROVIDER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            ai_provider_max_retries: match get("AI_PROVIDER_MAX_RETRIES") {
                Some(v) => v
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n <= 1)
                    .context("AI_PROVIDER_MAX_RETRIES must be 0 or 1")?,
                None => 0,
            },
            suggestion_tables_path: get("SUGGESTION_TABLES_PATH").map(PathBuf::from),
        })
    }

    /// Provider connection settings, or why the provider cannot be used.
    pub fn provider_settings(&self) -> Result<ProviderSettings, SuggestError> {
        if !self.ai_provider_enabled {
            return Err(SuggestError::ConfigurationMissing(
                "AI_PROVIDER_ENABLED is not set".to_string(),
            ));
        }
        let api_key = self.ai_provider_api_key.clone().ok_or_else(|| {
            SuggestError::ConfigurationMissing("AI_PROVIDER_API_KEY is not set".to_string())
        })?;

        Ok(ProviderSettings {
            api_key,
            base_url: self.ai_provider_base_url.clone(),
            model: self.ai_provider_model.clone(),
            timeout: Duration::from_secs_f64(self.ai_provider_timeout_secs),
            max_retries: self.ai_provider_max_retries,
        })
    }

    pub fn load_tables(&self) -> Result<SuggestionTables> {
        match &self.suggestion_tables_path {
            Some(path) => SuggestionTables::from_json_file(path),
            None => Ok(SuggestionTables::default()),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_need_no_environment() {
        let c = config(&[]).unwrap();
        assert_eq!(c.port, 8080);
        assert_eq!(c.rust_log, "info");
        assert!(!c.ai_provider_enabled);
        assert_eq!(c.ai_provider_timeout_secs, 8.0);
        assert_eq!(c.ai_provider_model, DEFAULT_MODEL);
        assert_eq!(c.ai_provider_max_retries, 0);
        assert!(c.suggestion_tables_path.is_none());
    }

    #[test]
    fn test_enabled_provider_without_key_is_configuration_missing() {
        let c = config(&[("AI_PROVIDER_ENABLED", "true"), ("AI_PROVIDER_API_KEY", "  ")]).unwrap();
        assert!(matches!(
            c.provider_settings(),
            Err(SuggestError::ConfigurationMissing(_))
        ));
    }

    #[test]
    fn test_disabled_provider_is_configuration_missing_even_with_key() {
        let c = config(&[("AI_PROVIDER_API_KEY", "sk-test")]).unwrap();
        assert!(matches!(
            c.provider_settings(),
            Err(SuggestError::ConfigurationMissing(_))
        ));
    }

    #[test]
    fn test_provider_settings_from_env() {
        let c = config(&[
            ("AI_PROVIDER_ENABLED", "yes"),
            ("AI_PROVIDER_API_KEY", "sk-test"),
            ("AI_PROVIDER_TIMEOUT_SECONDS", "3"),
            ("AI_PROVIDER_MAX_RETRIES", "1"),
            ("AI_PROVIDER_BASE_URL", "http://localhost:9999/v1"),
        ])
        .unwrap();
        let s = c.provider_settings().unwrap();
        assert_eq!(s.api_key, "sk-test");
        assert_eq!(s.timeout, Duration::from_secs(3));
        assert_eq!(s.max_retries, 1);
        assert_eq!(s.base_url, "http://localhost:9999/v1");
    }

    #[test]
    fn test_fractional_timeout_is_accepted() {
        let c = config(&[
            ("AI_PROVIDER_ENABLED", "true"),
            ("AI_PROVIDER_API_KEY", "sk-test"),
            ("AI_PROVIDER_TIMEOUT_SECONDS", "2.5"),
        ])
        .unwrap();
        assert_eq!(c.ai_provider_timeout_secs, 2.5);
        assert_eq!(c.provider_settings().unwrap().timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config(&[("PORT", "not-a-port")]).is_err());
        assert!(config(&[("AI_PROVIDER_ENABLED", "maybe")]).is_err());
        assert!(config(&[("AI_PROVIDER_TIMEOUT_SECONDS", "0")]).is_err());
        assert!(config(&[("AI_PROVIDER_TIMEOUT_SECONDS", "-1.5")]).is_err());
        assert!(config(&[("AI_PROVIDER_TIMEOUT_SECONDS", "inf")]).is_err());
        assert!(config(&[("AI_PROVIDER_TIMEOUT_SECONDS", "NaN")]).is_err());
        assert!(config(&[("AI_PROVIDER_MAX_RETRIES", "3")]).is_err());
    }

    #[test]
    fn test_load_tables_defaults_without_path() {
        let tables = config(&[]).unwrap().load_tables().unwrap();
        assert_eq!(tables.categories.default_category, "General");
    }
}
