use crate::domain::error::AppError;
use super::OutputTarget;

/// システムクリップボード出力（arboard）
///
/// 接続は呼び出しごとに開く。ヘッドレス環境では deliver がエラーを返す。
#[derive(Debug, Default)]
pub struct ClipboardOutput;

impl ClipboardOutput {
    pub fn new() -> Self {
        Self
    }
}

impl OutputTarget for ClipboardOutput {
    fn deliver(&self, text: &str) -> Result<(), AppError> {
        let mut ctx = arboard::Clipboard::new()
            .map_err(|e| AppError::clipboard(format!("Could not open the clipboard: {e}")))?;
        ctx.set_text(text)
            .map_err(|e| AppError::clipboard(format!("Could not write to the clipboard: {e}")))?;
        log::info!("クリップボードに出力: {} 文字", text.chars().count());
        Ok(())
    }

    fn name(&self) -> &str {
        "clipboard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipboard_name() {
        assert_eq!(ClipboardOutput::new().name(), "clipboard");
    }
}
