//! Download Decision Override webhook handlers.
//!
//! The manager posts every candidate release here before committing to one.
//! Every branch answers HTTP 200 with `approved: true`: a failed or bypassed
//! AI defers to the manager's own choice rather than stalling its pipeline.

use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use crate::models::{DdoPayload, Decision, SelectionRequest, Service};
use crate::AppState;

const DDO_EVENT_TYPE: &str = "DownloadDecisionOverride";

async fn radarr_override(
    State(state): State<AppState>,
    payload: Option<Json<DdoPayload>>,
) -> Json<Decision> {
    handle_override(state, Service::Radarr, payload.map(|Json(p)| p)).await
}

async fn sonarr_override(
    State(state): State<AppState>,
    payload: Option<Json<DdoPayload>>,
) -> Json<Decision> {
    handle_override(state, Service::Sonarr, payload.map(|Json(p)| p)).await
}

async fn handle_override(
    state: AppState,
    service: Service,
    payload: Option<DdoPayload>,
) -> Json<Decision> {
    let Some(client) = state.arr_client(service) else {
        return Json(Decision::deferred(format!(
            "{} not configured",
            service.display_name()
        )));
    };

    let Some(payload) = payload else {
        return Json(Decision::deferred("Empty payload"));
    };

    if payload.event_type != DDO_EVENT_TYPE {
        return Json(Decision::deferred(format!(
            "Ignored event type: {}",
            payload.event_type
        )));
    }

    let media = payload.media(service);
    let media_id = media.and_then(|m| m.id);
    let media_title = media
        .map(|m| m.title.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    info!(
        "Download Decision Override: '{}' ({} releases)",
        media_title,
        payload.releases.len()
    );

    // An empty list short-circuits before any arr API lookups.
    let (skip_tag_matched, profile_name) = if payload.releases.is_empty() {
        (false, "unknown".to_string())
    } else {
        let skip = match media_id {
            Some(id) => client
                .media_tags(id)
                .await
                .iter()
                .any(|tag| tag == &state.config.skip_tag),
            None => false,
        };
        let profile = match (skip, media_id) {
            (false, Some(id)) => client.quality_profile_name(id).await,
            _ => "unknown".to_string(),
        };
        (skip, profile)
    };

    let request = SelectionRequest {
        media_title,
        service,
        profile_name,
        releases: payload.releases,
        skip_tag_matched,
    };

    let prompts = state.prompts.snapshot().await;
    let verdict = state.engine.decide(&prompts, &request).await;

    if let Some(intent) = verdict.notification {
        let notifier = state.notifier.clone();
        tokio::spawn(async move {
            notifier.send(&intent).await;
        });
    }

    Json(verdict.decision)
}

pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/hook/radarr/override", post(radarr_override))
        .route("/hook/sonarr/override", post(sonarr_override))
}
