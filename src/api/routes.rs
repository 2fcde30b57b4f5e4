use axum::{
    http::{header, Method},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use crate::auth::SessionStore;
use crate::config::Config;
use crate::db::Store;
use crate::storage::ArtifactStore;
use crate::tts::TtsService;

pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub sessions: SessionStore,
    pub artifacts: ArtifactStore,
    pub tts: TtsService,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .route("/voices", get(handlers::list_voices))
        .route("/voice/clone", post(handlers::clone_voice))
        .route("/voice/:id", delete(handlers::delete_voice))
        .route("/tts/generate", post(handlers::generate))
        .route("/history", get(handlers::history))
        .route("/history/:id", delete(handlers::delete_generation))
        .route("/audio/:id", get(handlers::get_audio))
        .route("/subscribe", post(handlers::subscribe))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
