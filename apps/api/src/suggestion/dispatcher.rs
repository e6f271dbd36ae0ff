//! Provider-first routing with a guaranteed local answer.
//!
//! The dispatcher is the only caller of the engines. Its public methods are
//! infallible: any provider error or timeout is logged and the heuristic
//! engine answers instead.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::suggestion::engine::{
    ContextScore, ContextScoreRequest, HeuristicEngine, SuggestError, SuggestionBundle,
    SuggestionEngine, SuggestionSource, TaskSuggestionRequest,
};
use crate::suggestion::tables::SuggestionTables;

#[derive(Clone)]
pub struct SuggestionDispatcher {
    provider: Option<Arc<dyn SuggestionEngine>>,
    heuristic: HeuristicEngine,
    /// Wall-clock cap on one provider call, retries included.
    provider_budget: Duration,
}

impl SuggestionDispatcher {
    pub fn heuristic_only(tables: Arc<SuggestionTables>) -> Self {
        Self {
            provider: None,
            heuristic: HeuristicEngine::new(tables),
            provider_budget: Duration::ZERO,
        }
    }

    pub fn with_provider(
        tables: Arc<SuggestionTables>,
        provider: Arc<dyn SuggestionEngine>,
        provider_budget: Duration,
    ) -> Self {
        Self {
            provider: Some(provider),
            heuristic: HeuristicEngine::new(tables),
            provider_budget,
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn tables(&self) -> &SuggestionTables {
        self.heuristic.tables()
    }

    pub async fn score_context(&self, request: &ContextScoreRequest) -> ContextScore {
        if let Some(provider) = &self.provider {
            if let Some(score) = self
                .within_budget(
                    provider.backend(),
                    "score_context",
                    provider.score_context(request),
                )
                .await
            {
                return score;
            }
        }
        self.heuristic.score(request)
    }

    pub async fn suggest_for_task(
        &self,
        request: &TaskSuggestionRequest,
        now: DateTime<Utc>,
    ) -> SuggestionBundle {
        if let Some(provider) = &self.provider {
            if let Some(bundle) = self
                .within_budget(
                    provider.backend(),
                    "suggest_for_task",
                    provider.suggest_for_task(request, now),
                )
                .await
            {
                return bundle;
            }
        }
        self.heuristic.suggest(request, now)
    }

    async fn within_budget<T>(
        &self,
        backend: SuggestionSource,
        operation: &'static str,
        call: impl Future<Output = Result<T, SuggestError>>,
    ) -> Option<T> {
        match tokio::time::timeout(self.provider_budget, call).await {
            Ok(Ok(value)) => {
                debug!("{operation}: answered by {backend:?} backend");
                Some(value)
            }
            Ok(Err(e)) => {
                warn!("{operation}: {backend:?} backend failed, using heuristic: {e}");
                None
            }
            Err(_) => {
                warn!(
                    "{operation}: {backend:?} backend exceeded {}ms, using heuristic",
                    self.provider_budget.as_millis()
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{LlmClient, ProviderSettings, DEFAULT_MODEL};
    use crate::models::context::SourceType;
    use crate::suggestion::engine::ProviderEngine;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const URGENT_MSG: &str =
        "Urgent: Client meeting tomorrow at 2 PM. Need presentation ready by noon.";

    struct FailingEngine;

    #[async_trait]
    impl SuggestionEngine for FailingEngine {
        fn backend(&self) -> SuggestionSource {
            SuggestionSource::Provider
        }

        async fn score_context(
            &self,
            _request: &ContextScoreRequest,
        ) -> Result<ContextScore, SuggestError> {
            Err(SuggestError::ProviderUnavailable("down".to_string()))
        }

        async fn suggest_for_task(
            &self,
            _request: &TaskSuggestionRequest,
            _now: DateTime<Utc>,
        ) -> Result<SuggestionBundle, SuggestError> {
            Err(SuggestError::ProviderUnavailable("down".to_string()))
        }
    }

    struct StalledEngine;

    #[async_trait]
    impl SuggestionEngine for StalledEngine {
        fn backend(&self) -> SuggestionSource {
            SuggestionSource::Provider
        }

        async fn score_context(
            &self,
            _request: &ContextScoreRequest,
        ) -> Result<ContextScore, SuggestError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(SuggestError::ProviderUnavailable("never".to_string()))
        }

        async fn suggest_for_task(
            &self,
            _request: &TaskSuggestionRequest,
            _now: DateTime<Utc>,
        ) -> Result<SuggestionBundle, SuggestError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(SuggestError::ProviderUnavailable("never".to_string()))
        }
    }

    fn tables() -> Arc<SuggestionTables> {
        Arc::new(SuggestionTables::default())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn context_request() -> ContextScoreRequest {
        ContextScoreRequest {
            content: URGENT_MSG.to_string(),
            source_type: SourceType::Whatsapp,
            source_title: None,
        }
    }

    fn task_request() -> TaskSuggestionRequest {
        TaskSuggestionRequest {
            title: URGENT_MSG.to_string(),
            description: String::new(),
            linked_context: vec![],
            due_date: None,
            current_workload: 0,
        }
    }

    fn provider_dispatcher(server: &MockServer, timeout: Duration) -> SuggestionDispatcher {
        let settings = ProviderSettings {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            model: DEFAULT_MODEL.to_string(),
            timeout,
            max_retries: 0,
        };
        let engine = ProviderEngine::new(LlmClient::new(&settings).unwrap(), tables());
        SuggestionDispatcher::with_provider(tables(), Arc::new(engine), settings.total_budget())
    }

    #[tokio::test]
    async fn test_heuristic_only_answers_locally() {
        let dispatcher = SuggestionDispatcher::heuristic_only(tables());
        assert!(!dispatcher.has_provider());

        let score = dispatcher.score_context(&context_request()).await;
        assert_eq!(score.source, SuggestionSource::Heuristic);
        assert!(score.priority_score >= 0.8);
    }

    #[tokio::test]
    async fn test_failing_provider_falls_back() {
        let dispatcher = SuggestionDispatcher::with_provider(
            tables(),
            Arc::new(FailingEngine),
            Duration::from_secs(1),
        );
        let local = SuggestionDispatcher::heuristic_only(tables());

        let bundle = dispatcher.suggest_for_task(&task_request(), now()).await;
        assert_eq!(bundle, local.suggest_for_task(&task_request(), now()).await);
        assert_eq!(bundle.source, SuggestionSource::Heuristic);
    }

    #[tokio::test]
    async fn test_stalled_provider_is_cut_off_at_budget() {
        let dispatcher = SuggestionDispatcher::with_provider(
            tables(),
            Arc::new(StalledEngine),
            Duration::from_millis(50),
        );

        let started = Instant::now();
        let score = dispatcher.score_context(&context_request()).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(score.source, SuggestionSource::Heuristic);
    }

    #[tokio::test]
    async fn test_provider_server_error_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dispatcher = provider_dispatcher(&server, Duration::from_secs(2));
        let bundle = dispatcher.suggest_for_task(&task_request(), now()).await;
        assert_eq!(bundle.source, SuggestionSource::Heuristic);
        assert_eq!(bundle.category, "Work");
    }

    #[tokio::test]
    async fn test_slow_provider_response_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let dispatcher = provider_dispatcher(&server, Duration::from_millis(200));
        let started = Instant::now();
        let score = dispatcher.score_context(&context_request()).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(score.source, SuggestionSource::Heuristic);
    }

    #[tokio::test]
    async fn test_malformed_provider_body_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "I think it is urgent!"}}]
            })))
            .mount(&server)
            .await;

        let dispatcher = provider_dispatcher(&server, Duration::from_secs(2));
        let score = dispatcher.score_context(&context_request()).await;
        assert_eq!(score.source, SuggestionSource::Heuristic);
    }

    #[tokio::test]
    async fn test_healthy_provider_answers() {
        let server = MockServer::start().await;
        let content = json!({
            "keywords": ["client", "meeting"],
            "sentiment_score": 0.1,
            "priority_score": 0.9
        });
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": content.to_string()}}]
            })))
            .mount(&server)
            .await;

        let dispatcher = provider_dispatcher(&server, Duration::from_secs(2));
        assert!(dispatcher.has_provider());
        let score = dispatcher.score_context(&context_request()).await;
        assert_eq!(score.source, SuggestionSource::Provider);
        assert_eq!(score.keywords, vec!["client", "meeting"]);
        assert_eq!(score.priority_score, 0.9);
    }
}
