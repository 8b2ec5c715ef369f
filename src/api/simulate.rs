//! Simulation endpoints: run the selection pipeline against a media item's
//! current releases without side effects.
//!
//! Releases come from the manager's interactive search API and are
//! normalized into the same shape the webhook delivers, with the first
//! result marked as the manager's pick. No notification is emitted and no
//! selection is applied.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::models::{Outcome, Release, SelectionRequest, Service, NO_PROMPT_REASON};
use crate::services::formatter::size_gb;
use crate::AppState;

async fn simulate_radarr(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    simulate(state, Service::Radarr, movie_id).await
}

async fn simulate_sonarr(
    State(state): State<AppState>,
    Path(series_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    simulate(state, Service::Sonarr, series_id).await
}

async fn simulate(state: AppState, service: Service, media_id: i64) -> ApiResult<Json<Value>> {
    let client = state.arr_client(service).ok_or_else(|| {
        ApiError::NotFound(format!("{} not configured", service.display_name()))
    })?;

    let media = client
        .fetch_media(media_id)
        .await
        .map_err(|e| ApiError::NotFound(format!("Media not found: {}", e)))?;
    let raw_releases = client
        .fetch_releases(media_id)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to get releases: {}", e)))?;
    if raw_releases.is_empty() {
        return Err(ApiError::NotFound("No releases found".to_string()));
    }

    let profile_name = client.quality_profile_name(media_id).await;
    let media_title = media
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    let releases: Vec<Release> = raw_releases
        .iter()
        .enumerate()
        .map(|(i, raw)| Release::from_arr_search(raw, i == 0))
        .collect();
    let total = releases.len();

    let request = SelectionRequest {
        media_title: media_title.clone(),
        service,
        profile_name: profile_name.clone(),
        releases,
        skip_tag_matched: false,
    };

    let prompts = state.prompts.snapshot().await;
    let outcome = state.engine.select(&prompts, &request).await;

    let media_key = match service {
        Service::Radarr => "movie",
        Service::Sonarr => "series",
    };

    match outcome {
        Outcome::ConfirmsDefault { index, reason } | Outcome::Override { index, reason } => {
            let selected = &request.releases[index];
            let gb = (size_gb(selected.size) * 100.0).round() / 100.0;
            Ok(Json(json!({
                "status": "simulated",
                media_key: media_title,
                "profile": profile_name,
                "selected": {
                    "index": index + 1,
                    "title": selected.title,
                    "size_gb": gb,
                    "quality": selected.quality,
                    "seeders": selected.seeders,
                },
                "reason": reason,
                "total_releases": total,
            })))
        }
        other => {
            let reason = match other {
                Outcome::NoPrompt => NO_PROMPT_REASON.to_string(),
                Outcome::ModelFailed { detail } => detail,
                // Unreachable here: the list is non-empty and skip is false.
                _ => "AI made no selection".to_string(),
            };
            Ok(Json(json!({
                "status": "ai_failed",
                media_key: media_title,
                "profile": profile_name,
                "reason": reason,
                "total_releases": total,
            })))
        }
    }
}

pub fn simulate_routes() -> Router<AppState> {
    Router::new()
        .route("/simulate/radarr/:movie_id", get(simulate_radarr))
        .route("/simulate/sonarr/:series_id", get(simulate_sonarr))
}
