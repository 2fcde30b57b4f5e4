use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use novavoice::api::routes::{create_router, AppState};
use novavoice::auth::SessionStore;
use novavoice::config::Config;
use novavoice::db::Store;
use novavoice::storage::ArtifactStore;
use novavoice::tts::{select_engine, TtsService};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    tracing::info!("NovaVoice server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", config.data_dir.display());

    std::fs::create_dir_all(&config.data_dir).expect("Failed to create data directory");

    let store = Store::open(std::path::Path::new(&config.database_url))
        .await
        .expect("Failed to open database");
    store
        .seed_builtin_voices()
        .await
        .expect("Failed to seed built-in voices");

    let artifacts =
        ArtifactStore::new(&config.data_dir).expect("Failed to create artifact directories");

    let tts = TtsService::new(select_engine(config.engine));
    tracing::info!("Synthesis engine: {}", tts.engine_name());

    let sessions = SessionStore::new(Duration::from_secs(config.session_ttl_secs));

    let addr: SocketAddr = config.bind_addr().parse().expect("Invalid address");

    let state = Arc::new(AppState {
        config,
        store,
        sessions,
        artifacts,
        tts,
    });

    // Hourly sweep of expired sessions.
    let sweep = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            sweep.sessions.cleanup();
        }
    });

    let app = create_router(state);

    tracing::info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}
