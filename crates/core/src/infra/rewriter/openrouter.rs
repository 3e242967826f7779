use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::backend::{
    classify_failure, http_client, malformed_response, transport_error, CompletionBackend,
    CompletionRequest,
};
use super::RewriteError;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai";

const CREDENTIAL_VARS: &[&str] = &["VITE_OPENROUTER_API_KEY", "OPENROUTER_API_KEY"];

/// OpenRouter chat completions API バックエンド
pub struct OpenRouterBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// HTTP 200 でも本文に入ってくることがあるエラー
#[derive(Deserialize)]
struct ApiError {
    code: Option<serde_json::Value>,
    message: Option<String>,
}

impl ApiError {
    fn status(&self) -> u16 {
        match &self.code {
            Some(serde_json::Value::Number(n)) => {
                n.as_u64().and_then(|n| u16::try_from(n).ok()).unwrap_or(500)
            }
            Some(serde_json::Value::String(s)) => s.parse().unwrap_or(500),
            _ => 500,
        }
    }
}

impl OpenRouterBackend {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self, RewriteError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterBackend {
    fn name(&self) -> &str {
        "OpenRouter"
    }

    fn credential_vars(&self) -> &'static [&'static str] {
        CREDENTIAL_VARS
    }

    async fn complete(
        &self,
        credential: &str,
        request: &CompletionRequest<'_>,
    ) -> Result<String, RewriteError> {
        let body = ChatRequest {
            model: request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: request.text,
                },
            ],
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(credential)
            .header("X-Title", "Quizontal Paraphrase")
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(self.name(), &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(self.name(), &e))?;

        if !status.is_success() {
            log::debug!("OpenRouter API error: {status} - {text}");
            return Err(classify_failure(
                self.name(),
                request.model,
                status.as_u16(),
                &text,
            ));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| malformed_response(self.name(), e))?;

        if let Some(err) = parsed.error {
            let detail = err.message.clone().unwrap_or_default();
            log::debug!("OpenRouter error in body: {} - {detail}", err.status());
            return Err(classify_failure(
                self.name(),
                request.model,
                err.status(),
                &detail,
            ));
        }

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default())
    }
}
