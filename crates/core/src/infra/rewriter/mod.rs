pub mod backend;
pub mod client;
pub mod credentials;
pub mod gemini;
pub mod openrouter;
pub mod prompts;

pub use client::ParaphraseClient;

use async_trait::async_trait;

use crate::domain::error::{AppError, ErrorCode};
use crate::domain::tone::Tone;

/// リライトエラー
///
/// Display はそのままユーザーに表示できる文言にする。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// 入力テキストが空
    #[error("{0}")]
    InvalidInput(String),
    /// 利用可能な API キーが見つからない
    #[error("{0}")]
    Configuration(String),
    /// 認証エラー・不明なモデルなど
    #[error("{0}")]
    Rejected(String),
    /// レート制限（候補が残っていればフォールバック）
    #[error("{0}")]
    Throttled(String),
    /// 通信失敗・不正/空のレスポンス
    #[error("{0}")]
    Unavailable(String),
}

impl RewriteError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RewriteError::InvalidInput(_) => ErrorCode::Validation,
            RewriteError::Configuration(_) => ErrorCode::Configuration,
            RewriteError::Rejected(_) => ErrorCode::Rejected,
            RewriteError::Throttled(_) => ErrorCode::Throttled,
            RewriteError::Unavailable(_) => ErrorCode::Unavailable,
        }
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, RewriteError::Throttled(_))
    }
}

impl From<RewriteError> for AppError {
    fn from(err: RewriteError) -> Self {
        AppError {
            code: err.code(),
            message: err.to_string(),
            recoverable: true,
        }
    }
}

/// リライトコンテキスト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteContext {
    pub tone: Tone,
}

/// リライター trait（プロバイダ非依存の言い換えサービス）
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(&self, text: &str, ctx: RewriteContext) -> Result<String, RewriteError>;

    fn name(&self) -> &str;
}
