//! Text-level emotion shaping.
//!
//! The underlying engines carry no real emotion control, so the requested
//! emotion is simulated by adjusting the text before synthesis: a cheerful
//! or mournful interjection is prepended for the emotions that have one,
//! everything else passes through untouched. The requested emotion is still
//! recorded on the generation.

pub const EMOTIONS: &[&str] = &["neutral", "happy", "sad", "excited", "angry", "serious"];

pub fn is_supported(emotion: &str) -> bool {
    EMOTIONS.contains(&emotion)
}

pub fn shape(text: &str, emotion: &str) -> String {
    match emotion {
        "happy" => format!("Yay! {}", text),
        "sad" => format!("Alas... {}", text),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_prepends_an_interjection() {
        assert_eq!(shape("good morning", "happy"), "Yay! good morning");
    }

    #[test]
    fn sad_prepends_an_interjection() {
        assert_eq!(shape("good morning", "sad"), "Alas... good morning");
    }

    #[test]
    fn neutral_passes_through() {
        assert_eq!(shape("good morning", "neutral"), "good morning");
    }

    #[test]
    fn unshaped_emotions_pass_through() {
        assert_eq!(shape("good morning", "serious"), "good morning");
        assert_eq!(shape("good morning", "excited"), "good morning");
    }

    #[test]
    fn supported_list() {
        assert!(is_supported("neutral"));
        assert!(is_supported("angry"));
        assert!(!is_supported("melancholy"));
    }
}
