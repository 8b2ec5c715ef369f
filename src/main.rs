//! arr-llm-picker service entry point.

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use arr_llm_picker::config::Config;
use arr_llm_picker::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting arr-llm-picker");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };
    config.log_summary();

    let state = AppState::from_config(config.clone())?;
    let snapshot = state.prompts.snapshot().await;
    if snapshot.is_empty() {
        info!("No prompts configured (passthrough mode)");
    } else {
        for service in [
            arr_llm_picker::models::Service::Radarr,
            arr_llm_picker::models::Service::Sonarr,
        ] {
            let profiles = snapshot.profile_names(service);
            if !profiles.is_empty() {
                info!("AI enabled for {}: {:?}", service, profiles);
            }
        }
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Listening on http://0.0.0.0:{}", config.port);
    info!("Health check: http://0.0.0.0:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
