use serde::Serialize;
use tokio::time::{Duration, Instant};

use super::error::AppError;
use super::history::RestoredRequest;
use super::tone::Tone;

/// コピー完了表示を維持する時間
pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_secs(2);

pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied!";

pub const EMPTY_INPUT_MESSAGE: &str = "Please enter some text to paraphrase.";

/// 画面状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    Idle,
    Editing,
    Submitting,
    Displaying,
    Error,
}

impl ViewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Editing => "editing",
            Self::Submitting => "submitting",
            Self::Displaying => "displaying",
            Self::Error => "error",
        }
    }
}

/// 状態遷移
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub prev_state: String,
    pub new_state: ViewState,
}

/// 1 セッション分の一時的なリクエスト状態（永続化しない）
#[derive(Debug, Clone)]
pub struct RequestState {
    input: String,
    output: String,
    tone: Tone,
    view: ViewState,
    error: Option<AppError>,
    copied_until: Option<Instant>,
}

impl RequestState {
    pub fn new() -> Self {
        Self {
            input: String::new(),
            output: String::new(),
            tone: Tone::default(),
            view: ViewState::Idle,
            error: None,
            copied_until: None,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    pub fn is_loading(&self) -> bool {
        self.view == ViewState::Submitting
    }

    /// 送信ボタンが有効か
    pub fn can_submit(&self) -> bool {
        !self.is_loading() && !self.input.trim().is_empty()
    }

    /// 結果表示中のみコピーできる
    pub fn can_copy(&self) -> bool {
        self.view == ViewState::Displaying && !self.output.is_empty()
    }

    /// コピーボタンのラベル（期限切れなら自動で元に戻る）
    pub fn copy_label(&self) -> &'static str {
        if self.is_copy_feedback_visible() {
            COPIED_LABEL
        } else {
            COPY_LABEL
        }
    }

    pub fn is_copy_feedback_visible(&self) -> bool {
        self.copied_until
            .is_some_and(|until| Instant::now() < until)
    }

    fn transition(&mut self, next: ViewState) -> StateTransition {
        let prev = self.view.as_str().to_string();
        self.view = next;
        StateTransition {
            prev_state: prev,
            new_state: next,
        }
    }

    fn ensure_not_submitting(&self, action: &str) -> Result<(), AppError> {
        if self.is_loading() {
            return Err(AppError::invalid_state(format!(
                "{action} is not allowed while a paraphrase is in flight"
            )));
        }
        Ok(())
    }

    /// 入力テキストの変更: Idle/Editing/Error/Displaying → Editing（空なら Idle）
    pub fn set_input(&mut self, text: impl Into<String>) -> Result<StateTransition, AppError> {
        self.ensure_not_submitting("editing")?;
        self.input = text.into();
        let next = if self.input.is_empty() && self.output.is_empty() {
            ViewState::Idle
        } else {
            ViewState::Editing
        };
        Ok(self.transition(next))
    }

    /// トーン変更（状態は変えない）
    pub fn set_tone(&mut self, tone: Tone) -> Result<(), AppError> {
        self.ensure_not_submitting("changing the tone")?;
        self.tone = tone;
        Ok(())
    }

    /// 送信開始: → Submitting
    ///
    /// 入力が空白のみの場合はバリデーションエラーを記録して Error へ遷移する。
    pub fn begin_submit(&mut self) -> Result<StateTransition, AppError> {
        self.ensure_not_submitting("submitting")?;
        if self.input.trim().is_empty() {
            let err = AppError::validation(EMPTY_INPUT_MESSAGE);
            self.error = Some(err.clone());
            self.transition(ViewState::Error);
            return Err(err);
        }
        self.error = None;
        Ok(self.transition(ViewState::Submitting))
    }

    /// 成功: Submitting → Displaying
    pub fn on_success(&mut self, output: String) -> Result<StateTransition, AppError> {
        if !self.is_loading() {
            return Err(AppError::invalid_state(format!(
                "on_success is not allowed in the {} state",
                self.view.as_str()
            )));
        }
        self.output = output;
        self.copied_until = None;
        Ok(self.transition(ViewState::Displaying))
    }

    /// 失敗: Submitting → Error
    pub fn on_failure(&mut self, err: AppError) -> Result<StateTransition, AppError> {
        if !self.is_loading() {
            return Err(AppError::invalid_state(format!(
                "on_failure is not allowed in the {} state",
                self.view.as_str()
            )));
        }
        self.error = Some(err);
        Ok(self.transition(ViewState::Error))
    }

    /// コピー可能か検査してフィードバック期限をセットする
    pub fn mark_copied(&mut self, now: Instant) -> Result<(), AppError> {
        if !self.can_copy() {
            return Err(AppError::invalid_state(format!(
                "copy is only available while a result is displayed (current state: {})",
                self.view.as_str()
            )));
        }
        self.copied_until = Some(now + COPY_FEEDBACK_DURATION);
        Ok(())
    }

    /// クリア: 入力・出力・エラーを破棄して Editing へ
    pub fn clear(&mut self) -> Result<StateTransition, AppError> {
        self.ensure_not_submitting("clearing")?;
        self.input.clear();
        self.output.clear();
        self.error = None;
        self.copied_until = None;
        Ok(self.transition(ViewState::Editing))
    }

    /// 履歴からの復元: → Displaying
    pub fn restore(&mut self, restored: RestoredRequest) -> Result<StateTransition, AppError> {
        self.ensure_not_submitting("restoring")?;
        self.input = restored.text;
        self.output = restored.output;
        self.tone = restored.tone;
        self.error = None;
        self.copied_until = None;
        Ok(self.transition(ViewState::Displaying))
    }
}

impl Default for RequestState {
    fn default() -> Self {
        Self::new()
    }
}
