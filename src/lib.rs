//! NovaVoice: a local text-to-speech service with user accounts, a voice
//! library, generation history and tiered daily quotas.

pub mod api;
pub mod auth;
pub mod billing;
pub mod config;
pub mod db;
pub mod error;
pub mod storage;
pub mod tts;

pub use api::routes::{create_router, AppState};
pub use config::Config;
pub use error::AppError;
