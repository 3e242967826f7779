mod history;
mod memory;
mod repository;
mod settings;

pub use history::{read_persisted, HistoryStore, HISTORY_KEY};
pub use memory::MemoryStore;
pub use repository::SqliteStore;
pub use settings::{load_settings, save_settings, SETTINGS_KEY};

use crate::domain::error::AppError;

/// キー単位で文字列を丸ごと読み書きするストア
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
}
