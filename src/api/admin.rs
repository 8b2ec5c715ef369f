//! Administrative endpoints: connection testing and prompt reload.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::Service;
use crate::services::ArrClient;
use crate::AppState;

/// Probe one arr instance: system status plus configured profile names.
async fn probe_arr(client: &Arc<ArrClient>) -> Value {
    let status = match client.system_status().await {
        Ok(status) => status,
        Err(e) => return json!({ "status": "error", "error": e.to_string() }),
    };
    let profiles = match client.quality_profiles().await {
        Ok(profiles) => profiles,
        Err(e) => return json!({ "status": "error", "error": e.to_string() }),
    };

    let names: Vec<&str> = profiles
        .iter()
        .filter_map(|p| p.get("name").and_then(Value::as_str))
        .collect();
    json!({
        "status": "ok",
        "version": status.get("version"),
        "profiles": names,
    })
}

/// GET /test
///
/// Checks connectivity to Radarr, Sonarr and the LLM endpoint and echoes a
/// config summary. Diagnostics only; never called during a decision.
pub async fn test_connections(State(state): State<AppState>) -> Json<Value> {
    let mut results = serde_json::Map::new();

    for service in [Service::Radarr, Service::Sonarr] {
        let value = match state.arr_client(service) {
            Some(client) => probe_arr(client).await,
            None => json!({ "status": "not configured" }),
        };
        results.insert(service.as_str().to_string(), value);
    }

    let llm = match state.picker.probe().await {
        Ok(()) => json!({ "status": "ok", "model": state.config.llm_model }),
        Err(e) => json!({ "status": "error", "error": e.to_string() }),
    };
    results.insert("llm".to_string(), llm);

    let prompts = state.prompts.snapshot().await;
    results.insert(
        "config".to_string(),
        json!({
            "dry_run": state.config.dry_run,
            "skip_tag": state.config.skip_tag,
            "prompts_dir": state.config.prompts_dir.display().to_string(),
            "radarr_profiles": prompts.profile_names(Service::Radarr),
            "sonarr_profiles": prompts.profile_names(Service::Sonarr),
            "radarr_configured": state.radarr.is_some(),
            "sonarr_configured": state.sonarr.is_some(),
        }),
    );

    Json(Value::Object(results))
}

/// POST /reload
///
/// Rescans the prompts directory and atomically swaps in the new table.
/// In-flight decisions keep the snapshot they started with.
pub async fn reload_prompts(State(state): State<AppState>) -> Json<Value> {
    let table = state.prompts.reload().await;
    Json(json!({
        "status": "reloaded",
        "radarr_profiles": table.profile_names(Service::Radarr),
        "sonarr_profiles": table.profile_names(Service::Sonarr),
    }))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/test", get(test_connections))
        .route("/reload", post(reload_prompts))
}
