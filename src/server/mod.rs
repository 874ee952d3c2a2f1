//! Axum HTTP surface: routing, shared state, CORS, and process lifecycle.
//!
//! The API is small: health probes, an agent listing, a greetings
//! endpoint, and the authenticated run endpoint that streams agent events
//! over SSE. All handlers share one [`ServerState`] behind an `Arc`.

pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use miette::Diagnostic;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::agents::AgentRegistry;
use crate::config::Settings;
use crate::store::UserStore;

pub use error::ApiError;
pub use handlers::GREETINGS;

/// State shared by every handler.
pub struct ServerState {
    pub settings: Settings,
    pub store: UserStore,
    pub registry: AgentRegistry,
}

pub type SharedState = Arc<ServerState>;

/// Errors from binding or serving the HTTP listener.
#[derive(Debug, Error, Diagnostic)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    #[diagnostic(
        code(agentloom::server::bind),
        help("Is another process already listening on this address?")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    #[diagnostic(code(agentloom::server::serve))]
    Serve(#[source] std::io::Error),
}

/// Build the API router over shared state.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/copilotkit/agents", get(handlers::list_agents))
        .route("/copilotkit/{agent_name}", post(handlers::run_agent))
        .route(
            "/copilotkit/{agent_name}/health",
            get(handlers::agent_health),
        )
        .route("/health", get(handlers::health))
        .route("/greetings", get(handlers::greetings))
        .with_state(state)
}

/// CORS layer for the configured origins.
///
/// Credentialed requests rule out wildcards, so methods and headers are
/// explicit lists covering what the frontend sends.
fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "skipping unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// Bind the configured address and serve until ctrl-c.
pub async fn serve(state: ServerState) -> Result<(), ServeError> {
    let settings = state.settings.clone();
    let app = router(Arc::new(state)).layer(cors_layer(&settings));

    let listener = TcpListener::bind(&settings.bind_addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: settings.bind_addr.clone(),
            source,
        })?;
    tracing::info!(addr = %settings.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServeError::Serve)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
