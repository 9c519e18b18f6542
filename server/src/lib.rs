pub mod config;
pub mod game_manager;
pub mod ws;

use anyhow::Context;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use game_manager::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Builds the HTTP surface: the WebSocket endpoint and a liveness probe,
/// behind a CORS policy that admits only the configured origin.
pub fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let origin: HeaderValue = state
        .config
        .allowed_origin
        .parse()
        .with_context(|| format!("invalid allowed origin {:?}", state.config.allowed_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST]);

    Ok(Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    #[test]
    fn router_rejects_an_unparseable_origin() {
        let config = ServerConfig {
            allowed_origin: "http://bad\norigin".to_string(),
            ..ServerConfig::default()
        };
        assert!(router(Arc::new(AppState::new(config))).is_err());
    }

    #[test]
    fn router_builds_with_defaults() {
        assert!(router(Arc::new(AppState::default())).is_ok());
    }
}
