//! arr-llm-picker - AI release selection for Radarr and Sonarr.
//!
//! Intercepts the Download Decision Override webhook, which fires with every
//! candidate release before the manager commits to one, and substitutes an
//! LLM-driven choice for the manager's default heuristic. Every response
//! approves; the service only picks among candidates or defers.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod prompts;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::Config;
use crate::models::Service;
use crate::prompts::PromptStore;
use crate::services::{ArrClient, DecisionEngine, LlmClient, LlmConfig, Notifier, ReleasePicker};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Reloadable prompt table; decisions read one snapshot end to end.
    pub prompts: PromptStore,
    pub engine: Arc<DecisionEngine>,
    pub picker: Arc<dyn ReleasePicker>,
    pub notifier: Arc<Notifier>,
    pub radarr: Option<Arc<ArrClient>>,
    pub sonarr: Option<Arc<ArrClient>>,
    /// Service startup timestamp for uptime tracking.
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Build the full production state from configuration.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let llm = LlmClient::new(LlmConfig {
            api_url: config.llm_api_url.clone(),
            model: config.llm_model.clone(),
            api_key: config.llm_api_key.clone(),
            timeout_secs: config.llm_timeout_secs,
        })
        .map_err(|e| anyhow::anyhow!("Failed to create LLM client: {}", e))?;
        Self::with_picker(config, Arc::new(llm))
    }

    /// Build state around an explicit picker implementation. This is the
    /// seam tests use to script model answers.
    pub fn with_picker(config: Config, picker: Arc<dyn ReleasePicker>) -> anyhow::Result<Self> {
        let engine = DecisionEngine::new(picker.clone(), config.skip_tag.clone(), config.dry_run);
        let notifier = Notifier::new(config.ntfy_url.clone(), config.ntfy_topic.clone())?;
        let prompts = PromptStore::new(config.prompts_dir.clone());

        let radarr = config
            .arr(Service::Radarr)
            .map(|c| ArrClient::new(Service::Radarr, c.url.clone(), c.api_key.clone()))
            .transpose()
            .map_err(|e| anyhow::anyhow!("Failed to create Radarr client: {}", e))?
            .map(Arc::new);
        let sonarr = config
            .arr(Service::Sonarr)
            .map(|c| ArrClient::new(Service::Sonarr, c.url.clone(), c.api_key.clone()))
            .transpose()
            .map_err(|e| anyhow::anyhow!("Failed to create Sonarr client: {}", e))?
            .map(Arc::new);

        Ok(AppState {
            config: Arc::new(config),
            prompts,
            engine: Arc::new(engine),
            picker,
            notifier: Arc::new(notifier),
            radarr,
            sonarr,
            startup_time: Utc::now(),
        })
    }

    pub fn arr_client(&self, service: Service) -> Option<&Arc<ArrClient>> {
        match service {
            Service::Radarr => self.radarr.as_ref(),
            Service::Sonarr => self.sonarr.as_ref(),
        }
    }
}

/// Build application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::admin_routes())
        .merge(api::webhook_routes())
        .merge(api::simulate_routes())
        .with_state(state)
}
