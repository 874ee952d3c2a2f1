//! Process configuration sourced from environment variables.
//!
//! Every setting has a development-friendly default so the server starts
//! with nothing but a reachable Postgres. Production deployments override
//! via the environment (or a `.env` file loaded before [`Settings::from_env`]
//! runs).

use std::env;

/// Runtime settings for the server process.
///
/// Collected once at startup and passed by value into the layers that need
/// them. Cloning is cheap; the struct is a handful of strings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Comma-separated list of allowed CORS origins.
    pub cors_origins: String,
    /// API key for the hosted completion provider. Empty means "not set";
    /// agents fail at call time with a provider error rather than at boot.
    pub openai_api_key: String,
    /// Shared secret for HS256 token verification.
    pub jwt_secret: String,
    /// Postgres connection string for the user store.
    pub database_url: String,
    /// Socket address the HTTP listener binds to.
    pub bind_addr: String,
}

impl Settings {
    /// Read settings from the process environment, falling back to
    /// development defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-key".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/agentloom".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
        }
    }

    /// Split the configured CORS origins into individual entries.
    ///
    /// Empty segments (stray commas, trailing commas) are dropped.
    pub fn cors_origins_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}
