use std::path::PathBuf;

/// Which synthesis backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Shell out to espeak-ng.
    Espeak,
    /// Deterministic built-in waveform generator.
    Tone,
    /// Use espeak-ng when present, fall back to the tone generator.
    Auto,
}

/// Runtime configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Root directory for the database and audio artifacts.
    pub data_dir: PathBuf,
    pub database_url: String,
    pub session_ttl_secs: u64,
    pub max_text_len: usize,
    pub engine: EngineKind,
}

impl Config {
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8008".to_string())
            .parse()
            .expect("PORT must be a number");
        let data_dir: PathBuf = std::env::var("DATA_DIR")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| data_dir.join("novavoice.db").to_string_lossy().into_owned());
        let session_ttl_secs: u64 = std::env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .expect("SESSION_TTL_SECS must be a number");
        let max_text_len: usize = std::env::var("MAX_TEXT_LEN")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .expect("MAX_TEXT_LEN must be a number");
        let engine = match std::env::var("TTS_ENGINE").as_deref() {
            Ok("espeak") => EngineKind::Espeak,
            Ok("tone") => EngineKind::Tone,
            _ => EngineKind::Auto,
        };

        Self {
            host,
            port,
            data_dir,
            database_url,
            session_ttl_secs,
            max_text_len,
            engine,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
