pub mod extract;
pub mod handlers;
pub mod routes;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::billing::CardDetails;
use crate::db::{Generation, HistoryEntry, Tier, UserSummary, Voice};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
    pub voice_id: Uuid,
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Accepted and recorded, not applied by the engines.
    #[serde(default = "default_pitch")]
    pub pitch: f64,
    #[serde(default = "default_emotion")]
    pub emotion: String,
}

fn default_speed() -> f64 {
    1.0
}

fn default_pitch() -> f64 {
    1.0
}

fn default_emotion() -> String {
    "neutral".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub generation: Generation,
    /// Relative URL the audio can be fetched from.
    pub audio_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub voices: Vec<Voice>,
}

#[derive(Debug, Deserialize)]
pub struct CloneVoiceRequest {
    pub name: String,
    /// Base64-encoded audio sample.
    pub sample_base64: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en-us".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub tier: Tier,
    pub card: CardDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub message: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
