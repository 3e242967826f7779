use serde::{Deserialize, Serialize};

use super::tone::Tone;

/// 履歴の最大保持件数
pub const HISTORY_CAPACITY: usize = 10;

/// 言い換え履歴エントリ（成功時のみ作成、作成後は不変）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub original: String,
    pub paraphrased: String,
    pub tone: Tone,
    /// 作成時刻 (Unix ミリ秒)
    pub timestamp: i64,
}

impl HistoryEntry {
    /// 先頭 `max_chars` 文字のプレビュー（一覧表示用）
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.original.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// 履歴から復元される入力状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredRequest {
    pub text: String,
    pub output: String,
    pub tone: Tone,
}

/// 新しい順の履歴リスト（最大 HISTORY_CAPACITY 件）
///
/// JSON では素の配列としてシリアライズされる。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryList {
    entries: Vec<HistoryEntry>,
}

impl HistoryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// 先頭に追加し、容量を超えた古いエントリを捨てる
    pub fn push_front(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    /// 現在時刻から重複しない ID を決める
    ///
    /// 同一ミリ秒内の連続記録では直前の ID + 1 を使う。
    pub fn next_id(&self, now_ms: i64) -> String {
        let newest = self
            .entries
            .first()
            .and_then(|e| e.id.parse::<i64>().ok());
        let id = match newest {
            Some(prev) if prev >= now_ms => prev + 1,
            _ => now_ms,
        };
        id.to_string()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn find(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEntry> {
        self.entries.iter()
    }
}

impl From<Vec<HistoryEntry>> for HistoryList {
    fn from(mut entries: Vec<HistoryEntry>) -> Self {
        entries.truncate(HISTORY_CAPACITY);
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a HistoryList {
    type Item = &'a HistoryEntry;
    type IntoIter = std::slice::Iter<'a, HistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
