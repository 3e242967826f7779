#[cfg(test)]
mod tests {
    use crate::domain::error::{AppError, ErrorCode};
    use crate::domain::history::{HistoryEntry, HistoryList};
    use crate::domain::request::{StateTransition, ViewState};
    use crate::domain::settings::{AppSettings, ProviderChoice};
    use crate::domain::tone::Tone;

    #[test]
    fn test_tone_serialization() {
        assert_eq!(serde_json::to_string(&Tone::Standard).unwrap(), "\"Standard\"");
        assert_eq!(serde_json::to_string(&Tone::Formal).unwrap(), "\"Formal\"");
        assert_eq!(serde_json::to_string(&Tone::Academic).unwrap(), "\"Academic\"");
    }

    #[test]
    fn test_tone_deserialization() {
        assert_eq!(
            serde_json::from_str::<Tone>("\"Casual\"").unwrap(),
            Tone::Casual
        );
        assert!(serde_json::from_str::<Tone>("\"casual\"").is_err());
    }

    #[test]
    fn test_history_entry_field_names() {
        let entry = HistoryEntry {
            id: "1718000000000".to_string(),
            original: "The quick brown fox jumps.".to_string(),
            paraphrased: "A swift brown fox leaps.".to_string(),
            tone: Tone::Creative,
            timestamp: 1_718_000_000_000,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], "1718000000000");
        assert_eq!(json["original"], "The quick brown fox jumps.");
        assert_eq!(json["paraphrased"], "A swift brown fox leaps.");
        assert_eq!(json["tone"], "Creative");
        assert_eq!(json["timestamp"], 1_718_000_000_000_i64);
    }

    #[test]
    fn test_history_list_is_plain_array() {
        let json = r#"[{"id":"2","original":"b","paraphrased":"bb","tone":"Formal","timestamp":2},
                       {"id":"1","original":"a","paraphrased":"aa","tone":"Casual","timestamp":1}]"#;
        let list: HistoryList = serde_json::from_str(json).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0).unwrap().tone, Tone::Formal);

        let back = serde_json::to_string(&list).unwrap();
        assert!(back.starts_with('['));
    }

    #[test]
    fn test_view_state_serialization() {
        assert_eq!(serde_json::to_string(&ViewState::Idle).unwrap(), "\"idle\"");
        assert_eq!(
            serde_json::to_string(&ViewState::Submitting).unwrap(),
            "\"submitting\""
        );
    }

    #[test]
    fn test_error_code_serialization() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::Configuration).unwrap(),
            "\"E_CONFIG\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::Throttled).unwrap(),
            "\"E_THROTTLED\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::InvalidState).unwrap(),
            "\"E_INVALID_STATE\""
        );
    }

    #[test]
    fn test_app_error_serialization() {
        let err = AppError::validation("empty");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("E_VALIDATION"));
        assert!(json.contains("recoverable"));
    }

    #[test]
    fn test_state_transition_serialization() {
        let t = StateTransition {
            prev_state: "editing".to_string(),
            new_state: ViewState::Submitting,
        };
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("editing"));
        assert!(json.contains("submitting"));
    }

    #[test]
    fn test_settings_roundtrip() {
        let settings = AppSettings {
            provider: ProviderChoice::OpenRouter,
            models: vec!["m1".to_string(), "m2".to_string()],
            base_url: Some("http://localhost:9999".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"provider\":\"openrouter\""));
        let roundtrip: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, settings);
    }
}
