use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use uuid::Uuid;

use super::extract::{bearer_token, CurrentUser};
use super::{
    CloneVoiceRequest, GenerateRequest, GenerateResponse, HealthResponse, HistoryResponse,
    LoginRequest, LoginResponse, RegisterRequest, SubscribeRequest, SubscribeResponse,
    VoicesResponse,
};
use crate::api::routes::AppState;
use crate::auth;
use crate::billing;
use crate::db::UserSummary;
use crate::error::AppError;
use crate::tts::expression;

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    if request.username.trim().is_empty() {
        return Err(AppError::BadRequest("Username cannot be empty".into()));
    }
    if !request.email.contains('@') {
        return Err(AppError::BadRequest("Malformed email address".into()));
    }
    if request.password.is_empty() {
        return Err(AppError::BadRequest("Password cannot be empty".into()));
    }

    let password_hash = auth::hash_password(&request.password);
    let user = state
        .store
        .insert_user(request.username.trim(), &request.email, &password_hash)
        .await?;

    tracing::info!(username = %user.username, "Registered new user");

    let summary = UserSummary::new(&user, Utc::now().date_naive());
    Ok((StatusCode::CREATED, Json(summary)).into_response())
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .store
        .user_by_email(&request.email)
        .await?
        .ok_or(AppError::InvalidCredential)?;

    if !auth::verify_password(&user.password_hash, &request.password) {
        return Err(AppError::InvalidCredential);
    }

    let token = state.sessions.issue(user.id);
    tracing::info!(username = %user.username, "Login");

    Ok(Json(LoginResponse {
        token,
        user: UserSummary::new(&user, Utc::now().date_naive()),
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers)?;
    state.sessions.revoke(&token);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(
    State(_state): State<Arc<AppState>>,
    CurrentUser { user, .. }: CurrentUser,
) -> Json<UserSummary> {
    Json(UserSummary::new(&user, Utc::now().date_naive()))
}

pub async fn list_voices(
    State(state): State<Arc<AppState>>,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<Json<VoicesResponse>, AppError> {
    let voices = state.store.visible_voices(user.id).await?;
    Ok(Json(VoicesResponse { voices }))
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    CurrentUser { user, .. }: CurrentUser,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text cannot be empty".into()));
    }
    if request.text.len() > state.config.max_text_len {
        return Err(AppError::BadRequest(format!(
            "Text too long (max {} chars)",
            state.config.max_text_len
        )));
    }
    if !(0.5..=2.0).contains(&request.speed) {
        return Err(AppError::BadRequest(
            "Speed must be between 0.5 and 2.0".into(),
        ));
    }
    if !expression::is_supported(&request.emotion) {
        return Err(AppError::BadRequest(format!(
            "Unknown emotion '{}'",
            request.emotion
        )));
    }

    let today = Utc::now().date_naive();
    if user.remaining_today(today) == 0 {
        return Err(AppError::QuotaExceeded);
    }

    let voice = state
        .store
        .voice_visible_to(request.voice_id, user.id)
        .await?
        .ok_or_else(|| AppError::VoiceNotFound(request.voice_id.to_string()))?;

    // Conditional update; loses the race cleanly when parallel requests
    // exhaust the allowance.
    let consumed = state
        .store
        .consume_generation(user.id, today, user.tier.daily_quota())
        .await?;
    if !consumed {
        return Err(AppError::QuotaExceeded);
    }

    let wav = state
        .tts
        .render(&request.text, &voice, request.speed, &request.emotion)?;

    let id = Uuid::new_v4();
    let audio_ref = id.to_string();
    state.artifacts.save_audio(&audio_ref, &wav)?;

    let generation = state
        .store
        .insert_generation(
            id,
            user.id,
            voice.id,
            &request.text,
            request.speed,
            request.pitch,
            &request.emotion,
            &audio_ref,
        )
        .await?;

    tracing::info!(
        username = %user.username,
        voice = %voice.name,
        bytes = wav.len(),
        "Generated speech"
    );

    Ok(Json(GenerateResponse {
        audio_url: format!("/audio/{}", generation.id),
        generation,
    }))
}

pub async fn get_audio(
    State(state): State<Arc<AppState>>,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let generation = state
        .store
        .generation_owned(id, user.id)
        .await?
        .ok_or_else(|| AppError::GenerationNotFound(id.to_string()))?;

    let wav = state.artifacts.load_audio(&generation.audio_ref)?;
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "audio/wav")], wav).into_response())
}

pub async fn clone_voice(
    State(state): State<Arc<AppState>>,
    CurrentUser { user, .. }: CurrentUser,
    Json(request): Json<CloneVoiceRequest>,
) -> Result<Response, AppError> {
    if !user.tier.allows_cloning() {
        return Err(AppError::FeatureGated("Voice cloning"));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("Voice name cannot be empty".into()));
    }

    let sample = BASE64
        .decode(request.sample_base64.as_bytes())
        .map_err(|_| AppError::BadRequest("Sample is not valid base64".into()))?;
    if sample.is_empty() {
        return Err(AppError::BadRequest("Sample cannot be empty".into()));
    }

    // Cloning registers the sample against a stock engine voice. No model
    // is trained from it.
    let sample_ref = format!("clone_{}_{}", user.id.simple(), Uuid::new_v4().simple());
    state.artifacts.save_sample(&sample_ref, &sample)?;

    let engine_voice = request.language.to_ascii_lowercase();
    let voice = state
        .store
        .insert_cloned_voice(user.id, request.name.trim(), &engine_voice, &sample_ref)
        .await?;

    tracing::info!(username = %user.username, voice = %voice.name, "Cloned voice");

    Ok((StatusCode::CREATED, Json(voice)).into_response())
}

pub async fn delete_voice(
    State(state): State<Arc<AppState>>,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let voice = state
        .store
        .voice_by_id(id)
        .await?
        .ok_or_else(|| AppError::VoiceNotFound(id.to_string()))?;

    if voice.owner_id != Some(user.id) {
        return Err(AppError::Forbidden("You do not own this voice".into()));
    }

    state.store.delete_voice(voice.id).await?;
    if let Some(sample_ref) = &voice.sample_ref {
        state.artifacts.delete_sample(sample_ref);
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<Json<HistoryResponse>, AppError> {
    let history = state.store.history(user.id).await?;
    Ok(Json(HistoryResponse { history }))
}

pub async fn delete_generation(
    State(state): State<Arc<AppState>>,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let generation = state
        .store
        .generation_owned(id, user.id)
        .await?
        .ok_or_else(|| AppError::GenerationNotFound(id.to_string()))?;

    state.store.delete_generation(generation.id).await?;
    state.artifacts.delete_audio(&generation.audio_ref);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    CurrentUser { user, .. }: CurrentUser,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, AppError> {
    billing::validate_card(&request.card)?;

    let today = Utc::now().date_naive();
    state.store.set_tier(user.id, request.tier, today).await?;
    state
        .store
        .insert_payment(
            user.id,
            request.tier,
            &billing::masked_method(&request.card),
            &billing::transaction_id(),
        )
        .await?;

    let user = state
        .store
        .user_by_id(user.id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    tracing::info!(username = %user.username, tier = %request.tier, "Subscription updated");

    Ok(Json(SubscribeResponse {
        message: format!("Subscription to {} successful!", request.tier),
        user: UserSummary::new(&user, today),
    }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
