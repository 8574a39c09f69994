use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use room_api::config::Config;
use room_api::db::kv::{KeyValueStore, MemoryStore};
use room_api::realtime::fanout::RealtimeBroadcast;
use room_api::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing — env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    // Connect to PostgreSQL.
    let db = room_api::db::pool::connect(&config.database_url).await;

    // In-memory KV store for tokens and tickets.
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let broadcast = Arc::new(RealtimeBroadcast::new());

    tracing::info!(issuer = %config.identity_issuer, "room-api configured");

    let state = AppState {
        db,
        kv,
        config: Arc::new(config),
        broadcast,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(room_api::routes::router())
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", room_api::routes::ApiDoc::openapi()),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "room-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
