use serde::{Deserialize, Serialize};

/// 言い換えトーン
///
/// 永続化時は表示名（"Formal" など）でシリアライズされる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    Standard,
    Formal,
    Casual,
    Creative,
    Concise,
    Academic,
}

impl Tone {
    pub const ALL: [Tone; 6] = [
        Tone::Standard,
        Tone::Formal,
        Tone::Casual,
        Tone::Creative,
        Tone::Concise,
        Tone::Academic,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Tone::Standard => "Standard",
            Tone::Formal => "Formal",
            Tone::Casual => "Casual",
            Tone::Creative => "Creative",
            Tone::Concise => "Concise",
            Tone::Academic => "Academic",
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Tone {
    type Err = UnknownTone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Tone::ALL
            .into_iter()
            .find(|tone| tone.display_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownTone(wanted.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown tone '{0}' (expected one of: Standard, Formal, Casual, Creative, Concise, Academic)")]
pub struct UnknownTone(pub String);
