use std::sync::Arc;

use super::KeyValueStore;
use crate::domain::error::AppError;
use crate::domain::history::{HistoryEntry, HistoryList, RestoredRequest};
use crate::domain::tone::Tone;

/// 履歴を保存するキー
pub const HISTORY_KEY: &str = "quizontal_history";

/// 直近の言い換え履歴（新しい順・最大 10 件）
///
/// 記録のたびにリスト全体をシリアライズして保存する。書き込みは単一ライター前提。
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    entries: HistoryList,
}

impl HistoryStore {
    /// セッション開始時に読み込む
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let entries = read_persisted(store.as_ref());
        Self { store, entries }
    }

    pub fn entries(&self) -> &HistoryList {
        &self.entries
    }

    pub fn find(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.find(id)
    }

    /// 現在時刻で記録する
    pub fn record(
        &mut self,
        original: &str,
        paraphrased: &str,
        tone: Tone,
    ) -> Result<&HistoryList, AppError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.record_at(original, paraphrased, tone, now_ms)
    }

    /// 指定時刻で記録する。保存に失敗した場合はメモリ上の履歴も変更しない。
    pub fn record_at(
        &mut self,
        original: &str,
        paraphrased: &str,
        tone: Tone,
        now_ms: i64,
    ) -> Result<&HistoryList, AppError> {
        let entry = HistoryEntry {
            id: self.entries.next_id(now_ms),
            original: original.to_string(),
            paraphrased: paraphrased.to_string(),
            tone,
            timestamp: now_ms,
        };

        let mut next = self.entries.clone();
        next.push_front(entry);
        self.persist(&next)?;
        self.entries = next;
        Ok(&self.entries)
    }

    /// 履歴エントリから入力状態への射影（ストアは変更しない）
    pub fn restore(entry: &HistoryEntry) -> RestoredRequest {
        RestoredRequest {
            text: entry.original.clone(),
            output: entry.paraphrased.clone(),
            tone: entry.tone,
        }
    }

    /// 全削除（空リストを保存）
    pub fn clear(&mut self) -> Result<(), AppError> {
        let empty = HistoryList::new();
        self.persist(&empty)?;
        self.entries = empty;
        Ok(())
    }

    fn persist(&self, list: &HistoryList) -> Result<(), AppError> {
        let json = serde_json::to_string(list)
            .map_err(|e| AppError::internal(format!("history serialize: {e}")))?;
        self.store.set(HISTORY_KEY, &json)
    }
}

/// 保存済み履歴を読む。存在しない・壊れている場合は空リスト（エラーは表に出さない）。
pub fn read_persisted(store: &dyn KeyValueStore) -> HistoryList {
    let raw = match store.get(HISTORY_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return HistoryList::new(),
        Err(e) => {
            log::warn!("履歴の読み込みに失敗: {e}");
            return HistoryList::new();
        }
    };

    match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
        Ok(entries) => HistoryList::from(entries),
        Err(e) => {
            log::warn!("履歴のデシリアライズに失敗（空で開始）: {e}");
            HistoryList::new()
        }
    }
}
