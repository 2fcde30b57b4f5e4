pub mod engine;
pub mod expression;

use std::sync::Arc;

use crate::db::Voice;
use crate::error::AppError;

pub use engine::{select_engine, EspeakEngine, Synthesizer, ToneEngine};

/// Synthesis front door. Shapes the text for the requested emotion, then
/// hands it to the configured backend with the voice's engine identifier.
pub struct TtsService {
    engine: Arc<dyn Synthesizer>,
}

impl TtsService {
    pub fn new(engine: Arc<dyn Synthesizer>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn render(
        &self,
        text: &str,
        voice: &Voice,
        speed: f64,
        emotion: &str,
    ) -> Result<Vec<u8>, AppError> {
        let shaped = expression::shape(text, emotion);
        self.engine.synthesize(&shaped, &voice.engine_voice, speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::VoiceKind;
    use chrono::Utc;
    use uuid::Uuid;

    fn voice() -> Voice {
        Voice {
            id: Uuid::new_v4(),
            owner_id: None,
            name: "Nova (Neutral Male)".into(),
            kind: VoiceKind::Builtin,
            engine_voice: "en-us".into(),
            pitch_shift: 0,
            sample_ref: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn render_returns_wav_bytes() {
        let service = TtsService::new(Arc::new(ToneEngine));
        let wav = service.render("hello there", &voice(), 1.0, "neutral").unwrap();
        assert!(wav.starts_with(b"RIFF"));
    }

    #[test]
    fn emotion_shaping_reaches_the_engine() {
        let service = TtsService::new(Arc::new(ToneEngine));
        let neutral = service.render("hello", &voice(), 1.0, "neutral").unwrap();
        let happy = service.render("hello", &voice(), 1.0, "happy").unwrap();
        // The happy interjection lengthens the rendered text.
        assert!(happy.len() > neutral.len());
    }
}
