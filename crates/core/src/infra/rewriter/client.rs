use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::backend::{CompletionBackend, CompletionRequest, EMPTY_RESPONSE_MESSAGE};
use super::credentials::{self, CredentialSource};
use super::gemini::GeminiBackend;
use super::openrouter::OpenRouterBackend;
use super::prompts;
use super::{RewriteContext, RewriteError, Rewriter};
use crate::domain::settings::{AppSettings, ProviderChoice};
use crate::infra::metrics::Metrics;

/// モデル候補を順に試す言い換えクライアント
///
/// レート制限を受けたら次の候補で同じリクエストを再送する。
/// それ以外のエラーは即座に返す。待ち時間は入れない。
pub struct ParaphraseClient {
    backend: Arc<dyn CompletionBackend>,
    credentials: Arc<dyn CredentialSource>,
    candidates: Vec<String>,
    temperature: f32,
    top_p: f32,
    metrics: Option<Arc<Metrics>>,
}

impl ParaphraseClient {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        credentials: Arc<dyn CredentialSource>,
        candidates: Vec<String>,
    ) -> Result<Self, RewriteError> {
        if candidates.is_empty() {
            return Err(RewriteError::Configuration(
                "No model candidates are configured.".to_string(),
            ));
        }
        let defaults = AppSettings::default();
        Ok(Self {
            backend,
            credentials,
            candidates,
            temperature: defaults.temperature,
            top_p: defaults.top_p,
            metrics: None,
        })
    }

    /// 設定からバックエンドを選んで構築する
    pub fn from_settings(
        settings: &AppSettings,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, RewriteError> {
        let timeout = Duration::from_secs(settings.request_timeout_secs.max(1));
        let base_url = settings.base_url.as_deref();
        let backend: Arc<dyn CompletionBackend> = match settings.provider {
            ProviderChoice::Gemini => Arc::new(GeminiBackend::new(base_url, timeout)?),
            ProviderChoice::OpenRouter => Arc::new(OpenRouterBackend::new(base_url, timeout)?),
        };

        let mut client = Self::new(backend, credentials, settings.model_candidates())?;
        client.temperature = settings.temperature;
        client.top_p = settings.top_p;
        Ok(client)
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }
}

fn all_busy_message(tried: &[String]) -> String {
    format!(
        "All models are busy right now (tried: {}). Please try again in a moment.",
        tried.join(", ")
    )
}

#[async_trait]
impl Rewriter for ParaphraseClient {
    async fn rewrite(&self, text: &str, ctx: RewriteContext) -> Result<String, RewriteError> {
        if text.trim().is_empty() {
            return Err(RewriteError::InvalidInput(
                "Please enter some text to paraphrase.".to_string(),
            ));
        }

        let credential = credentials::resolve(
            self.credentials.as_ref(),
            self.backend.credential_vars(),
        )
        .ok_or_else(|| {
            RewriteError::Configuration(credentials::missing_key_message(
                self.backend.credential_vars(),
            ))
        })?;

        let instruction = prompts::system_instruction(ctx.tone);
        let mut busy: Vec<String> = Vec::new();

        for model in &self.candidates {
            let request = CompletionRequest {
                model,
                system_instruction: &instruction,
                text,
                temperature: self.temperature,
                top_p: self.top_p,
            };

            match self.backend.complete(&credential, &request).await {
                Ok(completion) => {
                    let trimmed = completion.trim();
                    if trimmed.is_empty() {
                        return Err(RewriteError::Unavailable(EMPTY_RESPONSE_MESSAGE.to_string()));
                    }
                    if !busy.is_empty() {
                        log::info!("フォールバック先 {model} で成功 (混雑: {})", busy.join(", "));
                        if let Some(metrics) = &self.metrics {
                            metrics.inc_fallbacks(busy.len() as u64);
                        }
                    }
                    return Ok(trimmed.to_string());
                }
                Err(RewriteError::Throttled(detail)) => {
                    log::warn!("{} モデル {model} がレート制限中: {detail}", self.backend.name());
                    busy.push(model.clone());
                }
                Err(err) => {
                    log::error!("{} 言い換え失敗 ({model}): {err}", self.backend.name());
                    return Err(err);
                }
            }
        }

        Err(RewriteError::Throttled(all_busy_message(&busy)))
    }

    fn name(&self) -> &str {
        self.backend.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tone::Tone;
    use crate::infra::rewriter::credentials::StaticCredentials;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// 台本どおりに応答するバックエンド
    struct ScriptedBackend {
        responses: Mutex<VecDeque<Result<String, RewriteError>>>,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<String, RewriteError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn models_called(&self) -> Vec<String> {
            self.calls.lock().iter().map(|(m, _, _)| m.clone()).collect()
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "Scripted"
        }

        fn credential_vars(&self) -> &'static [&'static str] {
            &["TEST_KEY"]
        }

        async fn complete(
            &self,
            credential: &str,
            request: &CompletionRequest<'_>,
        ) -> Result<String, RewriteError> {
            self.calls.lock().push((
                request.model.to_string(),
                credential.to_string(),
                request.system_instruction.to_string(),
            ));
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(RewriteError::Unavailable("script exhausted".into())))
        }
    }

    fn creds() -> Arc<StaticCredentials> {
        Arc::new(StaticCredentials::new().with("TEST_KEY", " \"k-123\" "))
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn ctx(tone: Tone) -> RewriteContext {
        RewriteContext { tone }
    }

    fn throttled() -> Result<String, RewriteError> {
        Err(RewriteError::Throttled("429".into()))
    }

    #[tokio::test]
    async fn test_primary_success_is_trimmed() {
        let backend = ScriptedBackend::new(vec![Ok("  A swift fox leaps.\n".into())]);
        let client = ParaphraseClient::new(backend.clone(), creds(), models(&["a", "b"])).unwrap();

        let out = client
            .rewrite("The quick brown fox jumps.", ctx(Tone::Formal))
            .await
            .unwrap();
        assert_eq!(out, "A swift fox leaps.");
        assert_eq!(backend.models_called(), vec!["a"]);

        let calls = backend.calls.lock();
        assert_eq!(calls[0].1, "k-123");
        assert!(calls[0].2.contains("requested tone: Formal."));
    }

    #[tokio::test]
    async fn test_falls_back_on_throttle() {
        let backend = ScriptedBackend::new(vec![throttled(), Ok("from b".into())]);
        let metrics = Arc::new(Metrics::new());
        let client = ParaphraseClient::new(backend.clone(), creds(), models(&["a", "b", "c"]))
            .unwrap()
            .with_metrics(metrics.clone());

        let out = client.rewrite("text", ctx(Tone::Standard)).await.unwrap();
        assert_eq!(out, "from b");
        assert_eq!(backend.models_called(), vec!["a", "b"]);
        assert_eq!(metrics.summary().fallbacks, 1);
    }

    #[tokio::test]
    async fn test_all_throttled_yields_single_aggregated_error() {
        let backend = ScriptedBackend::new(vec![throttled(), throttled(), throttled()]);
        let client = ParaphraseClient::new(backend.clone(), creds(), models(&["a", "b", "c"])).unwrap();

        let err = client.rewrite("text", ctx(Tone::Casual)).await.unwrap_err();
        match err {
            RewriteError::Throttled(msg) => {
                assert!(msg.contains("tried: a, b, c"));
                assert!(msg.contains("try again"));
            }
            other => panic!("expected Throttled, got {other:?}"),
        }
        assert_eq!(backend.models_called().len(), 3);
    }

    #[tokio::test]
    async fn test_non_throttle_error_stops_iteration() {
        let backend = ScriptedBackend::new(vec![
            throttled(),
            Err(RewriteError::Rejected("bad key".into())),
            Ok("never".into()),
        ]);
        let client = ParaphraseClient::new(backend.clone(), creds(), models(&["a", "b", "c"])).unwrap();

        let err = client.rewrite("text", ctx(Tone::Concise)).await.unwrap_err();
        assert_eq!(err, RewriteError::Rejected("bad key".into()));
        assert_eq!(backend.models_called(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_completion_is_unavailable() {
        let backend = ScriptedBackend::new(vec![Ok("   \n".into())]);
        let client = ParaphraseClient::new(backend, creds(), models(&["a", "b"])).unwrap();

        let err = client.rewrite("text", ctx(Tone::Standard)).await.unwrap_err();
        assert_eq!(err, RewriteError::Unavailable(EMPTY_RESPONSE_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_missing_credential_never_calls_backend() {
        let backend = ScriptedBackend::new(vec![Ok("x".into())]);
        let client = ParaphraseClient::new(
            backend.clone(),
            Arc::new(StaticCredentials::new().with("TEST_KEY", "''")),
            models(&["a"]),
        )
        .unwrap();

        let err = client.rewrite("text", ctx(Tone::Standard)).await.unwrap_err();
        assert!(matches!(err, RewriteError::Configuration(ref m) if m.contains("TEST_KEY")));
        assert!(backend.models_called().is_empty());
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let backend = ScriptedBackend::new(vec![]);
        let client = ParaphraseClient::new(backend.clone(), creds(), models(&["a"])).unwrap();

        let err = client.rewrite(" \t ", ctx(Tone::Standard)).await.unwrap_err();
        assert!(matches!(err, RewriteError::InvalidInput(_)));
        assert!(backend.models_called().is_empty());
    }

    #[test]
    fn test_requires_candidates() {
        let backend = ScriptedBackend::new(vec![]);
        let result = ParaphraseClient::new(backend, creds(), vec![]);
        assert!(matches!(result, Err(RewriteError::Configuration(_))));
    }

    #[test]
    fn test_from_settings_uses_provider_defaults() {
        let settings = AppSettings {
            provider: ProviderChoice::OpenRouter,
            ..Default::default()
        };
        let client = ParaphraseClient::from_settings(&settings, creds()).unwrap();
        assert_eq!(client.name(), "OpenRouter");
        assert_eq!(client.candidates().len(), 3);
    }
}
