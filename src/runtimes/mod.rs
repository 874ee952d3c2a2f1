//! Agent runtime infrastructure: sessions, stepwise execution, and event
//! bus wiring.
//!
//! The runtime layer sits between a compiled [`App`](crate::app::App) and
//! its callers:
//!
//! - [`AppRunner`] drives supersteps for named sessions held in memory,
//!   one runner per request in server deployments so event streams stay
//!   isolated.
//! - [`RuntimeConfig`] describes how the event bus for a run is built
//!   (buffer capacity, sinks) and optionally pins the session id.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use agentloom::runtimes::AppRunner;
//! use agentloom::state::VersionedState;
//! # use agentloom::app::App;
//! # async fn example(app: App) -> Result<(), Box<dyn std::error::Error>> {
//!
//! let mut runner = AppRunner::new(app);
//! let initial_state = VersionedState::new_with_user_message("Hello");
//!
//! runner.create_session("session_1".to_string(), initial_state).await?;
//! let final_state = runner.run_until_complete("session_1").await?;
//! # Ok(())
//! # }
//! ```

pub mod runner;
pub mod runtime_config;

pub use runner::{
    AppRunner, PausedReason, PausedReport, RunnerError, SessionInit, SessionState, StateVersions,
    StepOptions, StepReport, StepResult,
};

pub use runtime_config::{EventBusConfig, RuntimeConfig, SinkConfig};
