mod analysis;
mod config;
mod credits;
mod errors;
mod outline;
mod routes;
mod session;
mod state;
mod upstream;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::outline::parser::OutlineParser;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;
use crate::upstream::UpstreamClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resumatch API v{}", env!("CARGO_PKG_VERSION"));

    // Upstream analysis API client
    let upstream = Arc::new(UpstreamClient::new(config.upstream_base_url.clone()));
    info!("Upstream client initialized ({})", config.upstream_base_url);

    // Session store: profile cache + single-flight revalidation
    let sessions = Arc::new(SessionStore::new(upstream.clone()));

    // Outline parser with its regexes compiled once
    let parser = Arc::new(OutlineParser::new());

    // Build app state
    let state = AppState {
        config: config.clone(),
        upstream,
        sessions,
        parser,
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: tighten CORS in production
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
