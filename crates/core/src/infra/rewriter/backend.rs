use std::time::Duration;

use async_trait::async_trait;

use super::RewriteError;

pub const EMPTY_RESPONSE_MESSAGE: &str =
    "The AI returned an empty response. Please try with different text.";

/// 1 回の生成リクエスト
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub system_instruction: &'a str,
    pub text: &'a str,
    pub temperature: f32,
    pub top_p: f32,
}

/// 外部テキスト生成 API のバックエンド（1 試行 = 1 リクエスト）
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// 表示名（エラーメッセージ用）
    fn name(&self) -> &str;

    /// API キーとして参照する環境変数名（優先順）
    fn credential_vars(&self) -> &'static [&'static str];

    async fn complete(
        &self,
        credential: &str,
        request: &CompletionRequest<'_>,
    ) -> Result<String, RewriteError>;
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, RewriteError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RewriteError::Configuration(format!("Failed to create HTTP client: {e}")))
}

pub(crate) fn transport_error(provider: &str, err: &reqwest::Error) -> RewriteError {
    if err.is_timeout() {
        RewriteError::Unavailable(format!(
            "{provider} did not respond in time. Please try again."
        ))
    } else {
        RewriteError::Unavailable(format!(
            "Could not reach {provider}. Please check your connection and try again."
        ))
    }
}

pub(crate) fn malformed_response(provider: &str, detail: impl std::fmt::Display) -> RewriteError {
    log::warn!("{provider} のレスポンス解析に失敗: {detail}");
    RewriteError::Unavailable(format!(
        "{provider} returned an unexpected response. Please try again."
    ))
}

/// HTTP ステータスと本文からエラー種別を決める
pub(crate) fn classify_failure(provider: &str, model: &str, status: u16, body: &str) -> RewriteError {
    let lowered = body.to_lowercase();

    if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
        return RewriteError::Throttled(format!("Model '{model}' is rate limited (HTTP {status})."));
    }

    let model_missing = status == 404
        || lowered.contains("model not found")
        || lowered.contains("not a valid model")
        || lowered.contains("no endpoints found");

    if model_missing && matches!(status, 400 | 404) {
        return RewriteError::Rejected(format!(
            "Model '{model}' is not available for your API key yet. Please check your {provider} access."
        ));
    }

    match status {
        400 | 401 | 403 => RewriteError::Rejected(format!(
            "The API key is invalid. Ensure you copied the full key from {provider} and removed any quotes or spaces."
        )),
        _ => RewriteError::Unavailable(format!(
            "{provider} is unavailable right now (HTTP {status}). Please try again."
        )),
    }
}
