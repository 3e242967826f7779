use crate::domain::tone::Tone;

/// トーン別の追加指示
pub fn tone_guidance(tone: Tone) -> &'static str {
    match tone {
        Tone::Standard => "use balanced, natural wording suitable for most readers.",
        Tone::Formal => "use sophisticated language and avoid contractions.",
        Tone::Casual => "use a friendly, conversational style.",
        Tone::Creative => "use more vivid imagery and diverse sentence structures.",
        Tone::Concise => "reduce word count significantly without losing key points.",
        Tone::Academic => "follow formal scholarly writing conventions.",
    }
}

/// トーンを埋め込んだシステムプロンプトを構築する
pub fn system_instruction(tone: Tone) -> String {
    let mut prompt = format!(
        "You are a world-class professional editor and writing assistant for the brand \"Quizontal\".\n\
         Your task is to paraphrase the user's input text to make it unique while strictly \
         following the requested tone: {}.\n\n\
         Guidelines:\n\
         - Maintain the original meaning accurately.\n\
         - Improve clarity, flow, and vocabulary.\n",
        tone.display_name()
    );

    for t in Tone::ALL {
        prompt.push_str(&format!(
            "- If the tone is \"{}\", {}\n",
            t.display_name(),
            tone_guidance(t)
        ));
    }

    prompt.push_str("- Return ONLY the paraphrased text. No introductory remarks or explanations.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_names_selected_tone() {
        for tone in Tone::ALL {
            let prompt = system_instruction(tone);
            assert!(prompt.contains(&format!("requested tone: {}.", tone.display_name())));
        }
    }

    #[test]
    fn test_instruction_lists_every_tone_guidance() {
        let prompt = system_instruction(Tone::Formal);
        for tone in Tone::ALL {
            assert!(prompt.contains(tone_guidance(tone)));
        }
        assert!(prompt.contains("avoid contractions"));
    }

    #[test]
    fn test_instruction_demands_bare_output() {
        let prompt = system_instruction(Tone::Standard);
        assert!(prompt.ends_with("No introductory remarks or explanations."));
    }
}
