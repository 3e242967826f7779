use super::KeyValueStore;
use crate::domain::error::AppError;
use crate::domain::settings::AppSettings;

/// 設定を保存するキー
pub const SETTINGS_KEY: &str = "quizontal_settings";

/// 設定を読む。未保存・破損時は既定値。
pub fn load_settings(store: &dyn KeyValueStore) -> Result<AppSettings, AppError> {
    let Some(raw) = store.get(SETTINGS_KEY)? else {
        return Ok(AppSettings::default());
    };

    match serde_json::from_str::<AppSettings>(&raw) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            log::warn!("設定の読み込みに失敗（既定値を使用）: {e}");
            Ok(AppSettings::default())
        }
    }
}

pub fn save_settings(store: &dyn KeyValueStore, settings: &AppSettings) -> Result<(), AppError> {
    let json = serde_json::to_string(settings)
        .map_err(|e| AppError::internal(format!("settings serialize: {e}")))?;
    store.set(SETTINGS_KEY, &json)
}
