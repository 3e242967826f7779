use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::backend::{
    classify_failure, http_client, malformed_response, transport_error, CompletionBackend,
    CompletionRequest,
};
use super::RewriteError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const CREDENTIAL_VARS: &[&str] = &["VITE_API_KEY", "API_KEY", "GEMINI_API_KEY"];

/// Gemini generateContent API バックエンド
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiBackend {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self, RewriteError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn credential_vars(&self) -> &'static [&'static str] {
        CREDENTIAL_VARS
    }

    async fn complete(
        &self,
        credential: &str,
        request: &CompletionRequest<'_>,
    ) -> Result<String, RewriteError> {
        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: request.system_instruction,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: request.text }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                top_p: request.top_p,
            },
        };

        let response = self
            .client
            .post(self.endpoint(request.model))
            .header("x-goog-api-key", credential)
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
            log::debug!("Gemini API error: {status} - {text}");
            return Err(classify_failure(
                self.name(),
                request.model,
                status.as_u16(),
                &text,
            ));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| malformed_response(self.name(), e))?;

        let completion = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request<'a>(model: &'a str) -> CompletionRequest<'a> {
        CompletionRequest {
            model,
            system_instruction: "be formal",
            text: "hello",
            temperature: 0.7,
            top_p: 0.95,
        }
    }

    fn backend(server: &MockServer) -> GeminiBackend {
        GeminiBackend::new(Some(&server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_success_joins_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .and(body_partial_json(serde_json::json!({
                "systemInstruction": {"parts": [{"text": "be formal"}]},
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "generationConfig": {"temperature": 0.7}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "Greetings"}, {"text": ", friend."}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let out = backend(&server)
            .complete("secret", &request("gemini-test"))
            .await
            .unwrap();
        assert_eq!(out, "Greetings, friend.");
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let out = backend(&server).complete("k", &request("m")).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string(
                r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#,
            ))
            .mount(&server)
            .await;

        let err = backend(&server).complete("k", &request("m")).await.unwrap_err();
        assert!(err.is_throttled());
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#,
            ))
            .mount(&server)
            .await;

        let err = backend(&server).complete("k", &request("m")).await.unwrap_err();
        assert!(matches!(err, RewriteError::Rejected(ref m) if m.contains("API key is invalid")));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let err = backend(&server).complete("k", &request("m")).await.unwrap_err();
        assert!(matches!(err, RewriteError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_hung_request_times_out_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(serde_json::json!({
                        "candidates": [{"content": {"parts": [{"text": "too late"}]}}]
                    })),
            )
            .mount(&server)
            .await;

        let b = GeminiBackend::new(Some(&server.uri()), Duration::from_secs(1)).unwrap();
        let err = b.complete("k", &request("m")).await.unwrap_err();
        assert_eq!(
            err,
            RewriteError::Unavailable("Gemini did not respond in time. Please try again.".into())
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        // 空きポートを確保してすぐ閉じる
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let base = format!("http://127.0.0.1:{port}");

        let b = GeminiBackend::new(Some(&base), Duration::from_secs(1)).unwrap();
        let err = b.complete("k", &request("m")).await.unwrap_err();
        assert!(
            matches!(err, RewriteError::Unavailable(ref m) if m.contains("Could not reach Gemini")),
            "got {err:?}"
        );
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let b = GeminiBackend::new(Some("http://localhost:1234/"), Duration::from_secs(1)).unwrap();
        assert_eq!(
            b.endpoint("gemini-2.0-flash"),
            "http://localhost:1234/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
