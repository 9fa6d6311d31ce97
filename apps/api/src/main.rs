mod admin;
mod api_client;
mod config;
mod errors;
mod matching;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api_client::{ApiClient, SessionContext};
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing API_BASE_URL)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sekolah API v{}", env!("CARGO_PKG_VERSION"));

    // One session shared by every request
    let session = Arc::new(SessionContext::new());
    let api = ApiClient::new(config.api_base_url.clone(), session)
        .with_credentials(config.credentials());
    info!("Remote API client initialized ({})", config.api_base_url);

    if let Some((username, password)) = config.credentials() {
        if let Err(e) = api.login(&username, &password).await {
            warn!("Service login failed, continuing without a session: {e}");
        }
    }

    info!(
        "Matcher: page size {}, result cap {}, roster limit {}",
        config.match_page_size, config.match_result_cap, config.roster_limit
    );

    let state = AppState {
        directory: Arc::new(api.clone()),
        api,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the admin front end host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
