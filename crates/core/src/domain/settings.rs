use serde::{Deserialize, Serialize};

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// 言い換えに使うプロバイダ
    pub provider: ProviderChoice,
    /// フォールバック順のモデル候補（空ならプロバイダ既定値）
    pub models: Vec<String>,
    /// サンプリング温度
    pub temperature: f32,
    /// nucleus sampling（Gemini のみ送信）
    pub top_p: f32,
    /// API ベース URL の上書き（プロキシ・テスト用）
    pub base_url: Option<String>,
    /// 1 リクエストあたりのタイムアウト（秒）
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderChoice {
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "openrouter", alias = "open_router")]
    OpenRouter,
}

impl ProviderChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderChoice::Gemini => "gemini",
            ProviderChoice::OpenRouter => "openrouter",
        }
    }

    /// "openrouter" / "open_router" / "open-router" のいずれも受け付ける
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "gemini" | "google" => Some(ProviderChoice::Gemini),
            "openrouter" => Some(ProviderChoice::OpenRouter),
            _ => None,
        }
    }
}

impl AppSettings {
    /// 空でない候補リストを返す（未設定ならプロバイダ既定値）
    pub fn model_candidates(&self) -> Vec<String> {
        let configured: Vec<String> = self
            .models
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if configured.is_empty() {
            default_models_for_provider(self.provider)
        } else {
            configured
        }
    }
}

pub fn default_models_for_provider(provider: ProviderChoice) -> Vec<String> {
    match provider {
        ProviderChoice::Gemini => vec![
            "gemini-3-flash-preview".to_string(),
            "gemini-2.5-flash".to_string(),
            "gemini-2.0-flash".to_string(),
        ],
        ProviderChoice::OpenRouter => vec![
            "google/gemini-2.0-flash-exp:free".to_string(),
            "meta-llama/llama-3.3-70b-instruct:free".to_string(),
            "mistralai/mistral-7b-instruct:free".to_string(),
        ],
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            provider: ProviderChoice::Gemini,
            models: vec![],
            temperature: 0.7,
            top_p: 0.95,
            base_url: None,
            request_timeout_secs: 60,
        }
    }
}
