use std::sync::Arc;

use crate::domain::error::AppError;
use crate::domain::history::{HistoryEntry, HistoryList};
use crate::domain::request::{RequestState, StateTransition};
use crate::domain::tone::Tone;
use crate::infra::metrics::{Metrics, MetricsSummary};
use crate::infra::output::OutputTarget;
use crate::infra::rewriter::{RewriteContext, Rewriter};
use crate::infra::storage::HistoryStore;

/// 画面操作の窓口（入力・送信・コピー・履歴復元）
///
/// `submit` は `&mut self` を取るため、同時に飛ぶリクエストは常に 1 件まで。
pub struct InteractionController {
    state: RequestState,
    rewriter: Arc<dyn Rewriter>,
    history: HistoryStore,
    output: Arc<dyn OutputTarget>,
    metrics: Arc<Metrics>,
}

impl InteractionController {
    pub fn new(
        rewriter: Arc<dyn Rewriter>,
        history: HistoryStore,
        output: Arc<dyn OutputTarget>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            state: RequestState::new(),
            rewriter,
            history,
            output,
            metrics,
        }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn history(&self) -> &HistoryList {
        self.history.entries()
    }

    pub fn metrics(&self) -> MetricsSummary {
        self.metrics.summary()
    }

    pub fn rewriter_name(&self) -> &str {
        self.rewriter.name()
    }

    // ==================== Input ====================

    pub fn set_input(&mut self, text: impl Into<String>) -> Result<StateTransition, AppError> {
        self.state.set_input(text)
    }

    pub fn set_tone(&mut self, tone: Tone) -> Result<(), AppError> {
        self.state.set_tone(tone)
    }

    pub fn can_submit(&self) -> bool {
        self.state.can_submit()
    }

    // ==================== Paraphrase ====================

    /// 現在の入力とトーンで言い換えを実行する
    ///
    /// 成功時は結果を表示状態にして履歴へ記録する。履歴の保存に失敗しても
    /// 結果は破棄しない。
    pub async fn submit(&mut self) -> Result<String, AppError> {
        let transition = match self.state.begin_submit() {
            Ok(t) => t,
            Err(e) => {
                self.metrics.inc_error(e.code);
                return Err(e);
            }
        };
        self.metrics.inc_paraphrases_requested();
        log::debug!("{} -> {}", transition.prev_state, transition.new_state.as_str());

        let text = self.state.input().to_string();
        let tone = self.state.tone();

        let start = std::time::Instant::now();
        let result = self.rewriter.rewrite(&text, RewriteContext { tone }).await;
        self.metrics
            .record_latency("paraphrase", start.elapsed().as_millis() as u64);

        match result {
            Ok(output) => {
                self.state.on_success(output.clone())?;
                self.metrics.inc_paraphrases_succeeded();
                log::info!("言い換え完了 ({}, tone={tone})", self.rewriter.name());

                let persist_start = std::time::Instant::now();
                if let Err(e) = self.history.record(&text, &output, tone) {
                    log::error!("履歴の保存に失敗: {e}");
                    self.metrics.inc_error(e.code);
                }
                self.metrics
                    .record_latency("persist", persist_start.elapsed().as_millis() as u64);

                Ok(output)
            }
            Err(err) => {
                let err = AppError::from(err);
                log::warn!("言い換え失敗: {err}");
                self.metrics.inc_error(err.code);
                self.state.on_failure(err.clone())?;
                Err(err)
            }
        }
    }

    // ==================== Copy ====================

    /// 結果をクリップボードへコピーし、「Copied!」表示を開始する
    pub fn copy(&mut self) -> Result<(), AppError> {
        if !self.state.can_copy() {
            let err = AppError::invalid_state(format!(
                "copy is only available while a result is displayed (current state: {})",
                self.state.view().as_str()
            ));
            self.metrics.inc_error(err.code);
            return Err(err);
        }

        if let Err(e) = self.output.deliver(self.state.output()) {
            log::error!("{} への出力に失敗: {e}", self.output.name());
            self.metrics.inc_error(e.code);
            return Err(e);
        }

        self.state.mark_copied(tokio::time::Instant::now())?;
        self.metrics.inc_copies();
        Ok(())
    }

    pub fn copy_label(&self) -> &'static str {
        self.state.copy_label()
    }

    // ==================== Clear / Restore ====================

    pub fn clear(&mut self) -> Result<StateTransition, AppError> {
        self.state.clear()
    }

    /// 履歴エントリの内容を入力・出力・トーンへ戻す（履歴は変更しない）
    pub fn restore(&mut self, entry: &HistoryEntry) -> Result<StateTransition, AppError> {
        self.state.restore(HistoryStore::restore(entry))
    }

    pub fn restore_by_id(&mut self, id: &str) -> Result<StateTransition, AppError> {
        let entry = self
            .history
            .find(id)
            .cloned()
            .ok_or_else(|| AppError::validation(format!("No history entry with id '{id}'.")))?;
        self.restore(&entry)
    }

    /// 一覧上の位置（0 始まり、新しい順）で復元する
    pub fn restore_by_index(&mut self, index: usize) -> Result<StateTransition, AppError> {
        let entry = self.history.entries().get(index).cloned().ok_or_else(|| {
            AppError::validation(format!(
                "History has {} entries; index {index} is out of range.",
                self.history.entries().len()
            ))
        })?;
        self.restore(&entry)
    }

    pub fn clear_history(&mut self) -> Result<(), AppError> {
        self.history
            .clear()
            .inspect_err(|e| self.metrics.inc_error(e.code))
    }
}
