// Page Console - opens one of the account's page identities and prints its merged view

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pages_client::{
    app_state::AppState,
    config::Config,
    infrastructure::{NoopNavigator, TracingNotifier},
    services::RosterQuery,
    PageId,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config, Arc::new(TracingNotifier), Arc::new(NoopNavigator)).await?;
    let switcher = app_state.switcher.clone();

    switcher.refresh_roster().await?;
    if switcher.roster_stale() {
        eprintln!("warning: identity roster could not be refreshed");
    }

    let Some(page_id) = std::env::args().nth(1) else {
        // No identity given: list them
        let roster = switcher.roster(&RosterQuery::default());
        println!("{}", serde_json::to_string_pretty(&roster)?);
        return Ok(());
    };

    let view = switcher.select_identity(&PageId::new(page_id)).await?;
    println!("{}", serde_json::to_string_pretty(&view)?);

    let pending = app_state.controller.unconfirmed_edits().await?;
    if !pending.is_empty() {
        eprintln!("{} local edit(s) not yet saved remotely", pending.len());
    }

    Ok(())
}
