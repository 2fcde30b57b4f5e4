use std::path::{Path, PathBuf};

use crate::error::AppError;

/// File-backed store for audio artifacts. Generated WAVs and uploaded clone
/// samples live in sibling directories under the data dir; records in the
/// database reference them by id.
pub struct ArtifactStore {
    audio_dir: PathBuf,
    samples_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(data_dir: &Path) -> Result<Self, AppError> {
        let audio_dir = data_dir.join("generated_audio");
        let samples_dir = data_dir.join("cloned_voice_samples");
        std::fs::create_dir_all(&audio_dir)?;
        std::fs::create_dir_all(&samples_dir)?;
        Ok(Self {
            audio_dir,
            samples_dir,
        })
    }

    pub fn save_audio(&self, audio_ref: &str, wav: &[u8]) -> Result<(), AppError> {
        std::fs::write(self.audio_path(audio_ref), wav)?;
        Ok(())
    }

    pub fn load_audio(&self, audio_ref: &str) -> Result<Vec<u8>, AppError> {
        Ok(std::fs::read(self.audio_path(audio_ref))?)
    }

    pub fn delete_audio(&self, audio_ref: &str) {
        if let Err(e) = std::fs::remove_file(self.audio_path(audio_ref)) {
            tracing::warn!("Failed to remove audio artifact {}: {}", audio_ref, e);
        }
    }

    pub fn save_sample(&self, sample_ref: &str, bytes: &[u8]) -> Result<(), AppError> {
        std::fs::write(self.sample_path(sample_ref), bytes)?;
        Ok(())
    }

    pub fn delete_sample(&self, sample_ref: &str) {
        if let Err(e) = std::fs::remove_file(self.sample_path(sample_ref)) {
            tracing::warn!("Failed to remove voice sample {}: {}", sample_ref, e);
        }
    }

    fn audio_path(&self, audio_ref: &str) -> PathBuf {
        self.audio_dir.join(format!("{}.wav", audio_ref))
    }

    fn sample_path(&self, sample_ref: &str) -> PathBuf {
        self.samples_dir.join(format!("{}.wav", sample_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_load_audio() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();

        store.save_audio("gen-1", b"RIFFdata").unwrap();
        assert_eq!(store.load_audio("gen-1").unwrap(), b"RIFFdata");

        store.delete_audio("gen-1");
        assert!(store.load_audio("gen-1").is_err());
    }

    #[test]
    fn samples_live_apart_from_audio() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();

        store.save_sample("clip", b"sample").unwrap();
        // Same ref in the audio store must not collide.
        assert!(store.load_audio("clip").is_err());
    }
}
