mod auth;
mod config;
mod creations;
mod db;
mod errors;
mod generation;
mod models;
mod providers;
mod response;
mod routes;
mod state;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::creations::store::PgCreationStore;
use crate::db::create_pool;
use crate::providers::identity::HttpIdentityProvider;
use crate::providers::image::ImageSynthesisClient;
use crate::providers::pdf::PdfTextExtractor;
use crate::providers::text::ChatCompletionClient;
use crate::providers::transform::MediaHostClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_directive(&config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Quillbox API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(PgCreationStore::new(pool));

    // External collaborators, each behind its trait seam
    let identity = Arc::new(HttpIdentityProvider::new(
        config.identity_base_url.clone(),
        config.identity_api_key.clone(),
    ));
    let text = Arc::new(ChatCompletionClient::new(
        config.llm_base_url.clone(),
        config.llm_api_key.clone(),
    ));
    info!("LLM client initialized (model: {})", providers::text::MODEL);

    let image = Arc::new(ImageSynthesisClient::new(
        config.image_api_url.clone(),
        config.image_api_key.clone(),
    ));
    let transformer = Arc::new(MediaHostClient::new(
        config.media_cloud_name.clone(),
        config.media_api_key.clone(),
        config.media_api_secret.clone(),
    ));
    let extractor = Arc::new(PdfTextExtractor);

    // Build app state
    let state = AppState {
        store,
        identity,
        text,
        image,
        transformer,
        extractor,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Default `RUST_LOG`-style directive scoped to this crate's events. The
/// target root is the bin crate name, not the package name, so the directive
/// is derived from `module_path!` rather than `CARGO_PKG_NAME`.
fn default_log_directive(level: &str) -> String {
    let crate_target = module_path!()
        .split("::")
        .next()
        .unwrap_or(module_path!());
    format!("{crate_target}={level}")
}
