use serde::Serialize;

/// アプリケーション共通エラーコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    #[serde(rename = "E_VALIDATION")]
    Validation,
    #[serde(rename = "E_CONFIG")]
    Configuration,
    #[serde(rename = "E_REJECTED")]
    Rejected,
    #[serde(rename = "E_THROTTLED")]
    Throttled,
    #[serde(rename = "E_UNAVAILABLE")]
    Unavailable,
    #[serde(rename = "E_INVALID_STATE")]
    InvalidState,
    #[serde(rename = "E_STORAGE")]
    Storage,
    #[serde(rename = "E_CLIPBOARD")]
    Clipboard,
    #[serde(rename = "E_INTERNAL")]
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "E_VALIDATION",
            Self::Configuration => "E_CONFIG",
            Self::Rejected => "E_REJECTED",
            Self::Throttled => "E_THROTTLED",
            Self::Unavailable => "E_UNAVAILABLE",
            Self::InvalidState => "E_INVALID_STATE",
            Self::Storage => "E_STORAGE",
            Self::Clipboard => "E_CLIPBOARD",
            Self::Internal => "E_INTERNAL",
        }
    }
}

/// アプリケーションエラー（画面表示用メッセージ兼用）
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub recoverable: bool,
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Validation,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidState,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Internal,
            message: msg.into(),
            recoverable: false,
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Storage,
            message: msg.into(),
            recoverable: false,
        }
    }

    pub fn clipboard(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Clipboard,
            message: msg.into(),
            recoverable: true,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}
