//! Environment configuration.
//!
//! All settings come from environment variables, resolved once at startup
//! into an immutable `Config`. Validation collects every problem before
//! failing so a misconfigured deployment reports all missing variables in
//! one pass.

use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::models::Service;

const DEFAULT_PROMPTS_DIR: &str = "/config/prompts";
const DEFAULT_NTFY_TOPIC: &str = "arr-llm-picker";
const DEFAULT_SKIP_TAG: &str = "no-ai";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 90;
const DEFAULT_PORT: u16 = 8484;

#[derive(Debug, Error)]
#[error("Configuration errors: {0}")]
pub struct ConfigError(pub String);

/// Connection settings for one media manager.
#[derive(Debug, Clone)]
pub struct ArrConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_timeout_secs: u64,
    pub prompts_dir: PathBuf,
    pub radarr: Option<ArrConfig>,
    pub sonarr: Option<ArrConfig>,
    pub dry_run: bool,
    pub ntfy_url: Option<String>,
    pub ntfy_topic: String,
    /// Lowercased; compared case-insensitively against media tag labels.
    pub skip_tag: String,
    pub port: u16,
}

fn lookup(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Load from an explicit variable map.
    ///
    /// Required: `LLM_API_URL`, `LLM_MODEL`, and at least one of
    /// Radarr/Sonarr with both its `_URL` and `_API_KEY` set.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let llm_api_url = lookup(vars, "LLM_API_URL");
        if llm_api_url.is_none() {
            errors.push("LLM_API_URL".to_string());
        }
        let llm_model = lookup(vars, "LLM_MODEL");
        if llm_model.is_none() {
            errors.push("LLM_MODEL".to_string());
        }

        let radarr = match (lookup(vars, "RADARR_URL"), lookup(vars, "RADARR_API_KEY")) {
            (Some(url), Some(api_key)) => Some(ArrConfig {
                url: url.trim_end_matches('/').to_string(),
                api_key,
            }),
            (None, None) => None,
            _ => {
                errors.push(
                    "RADARR_URL and RADARR_API_KEY (both required if using Radarr)".to_string(),
                );
                None
            }
        };

        let sonarr = match (lookup(vars, "SONARR_URL"), lookup(vars, "SONARR_API_KEY")) {
            (Some(url), Some(api_key)) => Some(ArrConfig {
                url: url.trim_end_matches('/').to_string(),
                api_key,
            }),
            (None, None) => None,
            _ => {
                errors.push(
                    "SONARR_URL and SONARR_API_KEY (both required if using Sonarr)".to_string(),
                );
                None
            }
        };

        if radarr.is_none() && sonarr.is_none() && errors.is_empty() {
            errors.push("At least one of RADARR or SONARR must be configured".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError(errors.join(", ")));
        }

        let dry_run = lookup(vars, "DRY_RUN")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let llm_timeout_secs = lookup(vars, "LLM_TIMEOUT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS);

        let port = lookup(vars, "PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Config {
            llm_api_url: llm_api_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_default(),
            llm_model: llm_model.unwrap_or_default(),
            llm_api_key: lookup(vars, "LLM_API_KEY"),
            llm_timeout_secs,
            prompts_dir: PathBuf::from(
                lookup(vars, "PROMPTS_DIR").unwrap_or_else(|| DEFAULT_PROMPTS_DIR.to_string()),
            ),
            radarr,
            sonarr,
            dry_run,
            ntfy_url: lookup(vars, "NTFY_URL").map(|u| u.trim_end_matches('/').to_string()),
            ntfy_topic: lookup(vars, "NTFY_TOPIC")
                .unwrap_or_else(|| DEFAULT_NTFY_TOPIC.to_string()),
            skip_tag: lookup(vars, "SKIP_TAG")
                .unwrap_or_else(|| DEFAULT_SKIP_TAG.to_string())
                .to_lowercase(),
            port,
        })
    }

    pub fn arr(&self, service: Service) -> Option<&ArrConfig> {
        match service {
            Service::Radarr => self.radarr.as_ref(),
            Service::Sonarr => self.sonarr.as_ref(),
        }
    }

    /// Log a startup summary without exposing secrets.
    pub fn log_summary(&self) {
        info!("=== Configuration ===");
        match &self.radarr {
            Some(c) => info!("  Radarr URL: {}", c.url),
            None => info!("  Radarr: not configured"),
        }
        match &self.sonarr {
            Some(c) => info!("  Sonarr URL: {}", c.url),
            None => info!("  Sonarr: not configured"),
        }
        info!("  LLM API URL: {}", self.llm_api_url);
        info!("  LLM Model: {}", self.llm_model);
        info!(
            "  LLM API Key: {}",
            if self.llm_api_key.is_some() { "set" } else { "not set" }
        );
        info!("  LLM Timeout: {}s", self.llm_timeout_secs);
        info!("  Prompts directory: {}", self.prompts_dir.display());
        info!("  Skip tag: {}", self.skip_tag);
        info!("  Dry run: {}", self.dry_run);
        info!(
            "  Notifications: {}",
            if self.ntfy_url.is_some() { "enabled" } else { "disabled" }
        );
        info!("=====================");
    }
}
