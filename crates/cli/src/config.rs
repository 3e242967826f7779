use anyhow::{anyhow, bail, Result};

use qz_core::domain::settings::{AppSettings, ProviderChoice};

/// フラグ・環境変数からの上書き（保存済み設定より優先）
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Overrides {
    pub provider: Option<ProviderChoice>,
    pub models: Option<Vec<String>>,
}

impl Overrides {
    pub fn from_flags(provider: Option<&str>, models: Option<Vec<String>>) -> Result<Self> {
        let provider = match provider.map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => Some(parse_provider(raw)?),
            None => None,
        };
        let models = models
            .map(|list| {
                list.into_iter()
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty());
        Ok(Self { provider, models })
    }
}

fn parse_provider(raw: &str) -> Result<ProviderChoice> {
    ProviderChoice::parse(raw)
        .ok_or_else(|| anyhow!("Unknown provider '{raw}' (expected gemini or openrouter)"))
}

/// 保存済み設定に上書きを適用する
///
/// プロバイダだけが変わった場合、保存済みのモデル候補は別プロバイダ用なので破棄する。
pub fn resolve(stored: AppSettings, overrides: &Overrides) -> AppSettings {
    let mut settings = stored;
    if let Some(provider) = overrides.provider {
        if provider != settings.provider {
            settings.provider = provider;
            settings.models.clear();
        }
    }
    if let Some(models) = &overrides.models {
        settings.models = models.clone();
    }
    settings
}

/// `settings set KEY VALUE` の適用
pub fn apply(settings: &mut AppSettings, key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    match key.trim().to_lowercase().replace('-', "_").as_str() {
        "provider" => {
            let provider = parse_provider(value)?;
            if provider != settings.provider {
                settings.provider = provider;
                settings.models.clear();
            }
        }
        "models" => {
            settings.models = value
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        }
        "temperature" => {
            let t: f32 = value
                .parse()
                .map_err(|_| anyhow!("temperature must be a number, got '{value}'"))?;
            if !(0.0..=2.0).contains(&t) {
                bail!("temperature must be between 0 and 2");
            }
            settings.temperature = t;
        }
        "top_p" => {
            let p: f32 = value
                .parse()
                .map_err(|_| anyhow!("top_p must be a number, got '{value}'"))?;
            if !(0.0..=1.0).contains(&p) {
                bail!("top_p must be between 0 and 1");
            }
            settings.top_p = p;
        }
        "base_url" => {
            settings.base_url = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
        }
        "request_timeout_secs" | "timeout" => {
            let secs: u64 = value
                .parse()
                .map_err(|_| anyhow!("request_timeout_secs must be a whole number, got '{value}'"))?;
            if secs == 0 {
                bail!("request_timeout_secs must be at least 1");
            }
            settings.request_timeout_secs = secs;
        }
        other => bail!(
            "Unknown setting '{other}' (expected provider, models, temperature, top_p, base_url, request_timeout_secs)"
        ),
    }
    Ok(())
}
