use std::io::Cursor;
use std::process::Command;
use std::sync::Arc;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::config::EngineKind;
use crate::error::AppError;

/// Words-per-minute espeak-ng uses at speed 1.0.
const BASE_RATE_WPM: f64 = 175.0;

const SAMPLE_RATE: u32 = 22050;

/// A synthesis backend. Takes already-shaped text and returns WAV bytes.
///
/// Speed is the only parameter the engines honour; pitch and emotion are
/// simulated upstream of this seam.
pub trait Synthesizer: Send + Sync {
    fn synthesize(&self, text: &str, voice: &str, speed: f64) -> Result<Vec<u8>, AppError>;

    fn name(&self) -> &'static str;
}

/// Pick the configured backend. Auto prefers espeak-ng and falls back to
/// the tone generator when the binary is missing.
pub fn select_engine(kind: EngineKind) -> Arc<dyn Synthesizer> {
    match kind {
        EngineKind::Espeak => Arc::new(EspeakEngine),
        EngineKind::Tone => Arc::new(ToneEngine),
        EngineKind::Auto => {
            if EspeakEngine::available() {
                Arc::new(EspeakEngine)
            } else {
                tracing::warn!("espeak-ng not found, using the built-in tone generator");
                Arc::new(ToneEngine)
            }
        }
    }
}

/// Shells out to espeak-ng and captures the WAV it writes to stdout.
pub struct EspeakEngine;

impl EspeakEngine {
    pub fn available() -> bool {
        Command::new("espeak-ng")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Synthesizer for EspeakEngine {
    fn synthesize(&self, text: &str, voice: &str, speed: f64) -> Result<Vec<u8>, AppError> {
        let rate = (BASE_RATE_WPM * speed).round() as i64;
        let rate = rate.clamp(80, 450).to_string();

        let output = Command::new("espeak-ng")
            .args(["--stdout", "-v", voice, "-s", rate.as_str(), text])
            .output()
            .map_err(|e| {
                AppError::Engine(format!("Failed to run espeak-ng (is it installed?): {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Engine(format!("espeak-ng failed: {}", stderr)));
        }

        Ok(output.stdout)
    }

    fn name(&self) -> &'static str {
        "espeak-ng"
    }
}

/// Deterministic fallback engine. Renders each character as a short sine
/// burst whose frequency is derived from the character and the voice name,
/// so distinct voices and texts produce distinct audio without any external
/// binary. Used when espeak-ng is unavailable and throughout the tests.
pub struct ToneEngine;

impl Synthesizer for ToneEngine {
    fn synthesize(&self, text: &str, voice: &str, speed: f64) -> Result<Vec<u8>, AppError> {
        let base = 140.0 + (voice.bytes().map(u32::from).sum::<u32>() % 120) as f32;
        let speed = speed.clamp(0.5, 2.0) as f32;
        let char_samples = (SAMPLE_RATE as f32 * 0.06 / speed) as usize;
        let gap_samples = (SAMPLE_RATE as f32 * 0.03 / speed) as usize;

        let mut samples = Vec::new();
        for ch in text.chars() {
            if ch.is_whitespace() {
                samples.extend(std::iter::repeat(0.0).take(gap_samples));
                continue;
            }
            let freq = base * (1.0 + (ch as u32 % 12) as f32 / 24.0);
            for n in 0..char_samples {
                let t = n as f32 / SAMPLE_RATE as f32;
                let envelope = 1.0 - n as f32 / char_samples as f32;
                samples.push((t * freq * 2.0 * std::f32::consts::PI).sin() * 0.4 * envelope);
            }
        }

        samples_to_wav(&samples, SAMPLE_RATE)
    }

    fn name(&self) -> &'static str {
        "tone"
    }
}

/// Encode f32 samples as 16-bit mono PCM WAV.
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, AppError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Vec::new();
    {
        let cursor = Cursor::new(&mut buffer);
        let mut writer = WavWriter::new(cursor, spec)
            .map_err(|e| AppError::Engine(format!("Failed to create WAV writer: {}", e)))?;

        for sample in samples {
            let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(scaled)
                .map_err(|e| AppError::Engine(format!("Failed to write sample: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| AppError::Engine(format!("Failed to finalize WAV: {}", e)))?;
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_to_wav_empty_still_has_header() {
        let wav = samples_to_wav(&[], SAMPLE_RATE).unwrap();
        assert!(wav.starts_with(b"RIFF"));
    }

    #[test]
    fn samples_to_wav_valid() {
        let samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0];
        let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();
        assert!(wav.starts_with(b"RIFF"));
        assert!(wav.len() > 44);
    }

    #[test]
    fn tone_engine_produces_audio_for_text() {
        let wav = ToneEngine.synthesize("hello world", "en-us", 1.0).unwrap();
        assert!(wav.starts_with(b"RIFF"));
        assert!(wav.len() > 44);
    }

    #[test]
    fn tone_engine_is_deterministic() {
        let a = ToneEngine.synthesize("same text", "en-us", 1.0).unwrap();
        let b = ToneEngine.synthesize("same text", "en-us", 1.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn tone_engine_voice_changes_output() {
        let a = ToneEngine.synthesize("same text", "en-us", 1.0).unwrap();
        let b = ToneEngine.synthesize("same text", "en-us+f3", 1.0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn faster_speed_means_shorter_audio() {
        let slow = ToneEngine.synthesize("some words here", "en", 0.5).unwrap();
        let fast = ToneEngine.synthesize("some words here", "en", 2.0).unwrap();
        assert!(fast.len() < slow.len());
    }
}
