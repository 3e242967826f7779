use std::collections::HashMap;

/// API キーの取得元
pub trait CredentialSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// プロセス環境変数から読む（呼び出しのたびに参照する）
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// 固定値（テスト・埋め込み用）
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    vars: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// 貼り付けミスを除去する: 前後の空白と、両端の引用符 1 文字ずつ
pub fn sanitize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed == "undefined" {
        return None;
    }
    let without_open = trimmed
        .strip_prefix('"')
        .or_else(|| trimmed.strip_prefix('\''))
        .unwrap_or(trimmed);
    let cleaned = without_open
        .strip_suffix('"')
        .or_else(|| without_open.strip_suffix('\''))
        .unwrap_or(without_open)
        .trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// 候補の変数名を順に調べ、最初に使える値を返す
pub fn resolve(source: &dyn CredentialSource, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| source.var(name))
        .find_map(|raw| sanitize(&raw))
}

/// キー未設定時のメッセージ
pub fn missing_key_message(names: &[&str]) -> String {
    let primary = names.first().copied().unwrap_or("API_KEY");
    format!(
        "Quizontal API Key is missing. Please ensure you have set '{primary}' in your environment and restarted (or redeployed) the app."
    )
}
