//! Agent service entry point: load settings, prepare the user store,
//! register the agents, and serve HTTP until shutdown.

use agentloom::agents::AgentRegistry;
use agentloom::config::Settings;
use agentloom::server::{ServerState, serve};
use agentloom::store::UserStore;
use agentloom::telemetry::{init_miette, init_tracing};

#[tokio::main]
async fn main() -> miette::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    init_miette();

    let settings = Settings::from_env();
    tracing::info!(bind = %settings.bind_addr, "booting agentloom");

    let store = UserStore::connect(&settings.database_url).await?;
    store.init_schema().await?;

    let registry = AgentRegistry::live(&settings)?;
    tracing::info!(agents = registry.agents().len(), "agents registered");

    serve(ServerState {
        settings,
        store,
        registry,
    })
    .await?;
    Ok(())
}
