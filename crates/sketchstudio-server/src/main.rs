//! SketchStudio Generation Proxy
//!
//! Forwards sketch-to-design requests to the Replicate predictions API so
//! the API token never reaches the browser or CLI.
//!
//! ## Routes
//!
//! ```text
//! POST /api/generate-design     { "prompt": "...", "sketchImage": "data:image/png;base64,..." }
//! GET  /api/predictions/{id}    poll a prediction created above
//! GET  /health
//! ```

mod config;
mod proxy;

use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sketchstudio_server=info,tower_http=info".into()),
        )
        .init();

    let config = match config::ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    if config.token.is_none() {
        warn!("REPLICATE_API_TOKEN is not set; generation requests will fail");
    }

    let addr = config.addr;
    let upstream = config.upstream.clone();
    let app = proxy::router(Arc::new(proxy::AppState::new(config)));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("SketchStudio proxy listening on {}", addr);
    info!("Forwarding predictions to {}", upstream);

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {}", e);
    }
}
