//! Webhook pipeline integration tests.
//!
//! Drive the full router with `tower::ServiceExt::oneshot` and a scripted
//! model picker. The configured arr endpoint points at an unroutable local
//! port, so tag and profile lookups exercise their fallback paths.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use arr_llm_picker::config::Config;
use arr_llm_picker::services::{ModelAnswer, ReleasePicker, SelectionError};
use arr_llm_picker::{build_router, AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct ScriptedPicker {
    result: Result<ModelAnswer, String>,
}

#[async_trait]
impl ReleasePicker for ScriptedPicker {
    async fn pick(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
    ) -> Result<ModelAnswer, SelectionError> {
        match &self.result {
            Ok(answer) => Ok(answer.clone()),
            Err(detail) => Err(SelectionError::Transport(detail.clone())),
        }
    }
}

fn picker_answering(choice: i64, reason: &str) -> Arc<ScriptedPicker> {
    Arc::new(ScriptedPicker {
        result: Ok(ModelAnswer {
            choice,
            reason: reason.to_string(),
        }),
    })
}

fn test_config(prompts_dir: &Path, dry_run: bool) -> Config {
    let vars: HashMap<String, String> = [
        ("LLM_API_URL", "http://127.0.0.1:1/v1"),
        ("LLM_MODEL", "test-model"),
        ("RADARR_URL", "http://127.0.0.1:1"),
        ("RADARR_API_KEY", "test-key"),
        ("PROMPTS_DIR", prompts_dir.to_str().unwrap()),
        ("DRY_RUN", if dry_run { "true" } else { "false" }),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    Config::from_vars(&vars).unwrap()
}

fn app(prompts_dir: &Path, picker: Arc<dyn ReleasePicker>, dry_run: bool) -> Router {
    let state = AppState::with_picker(test_config(prompts_dir, dry_run), picker).unwrap();
    build_router(state)
}

/// Write a prompt so the profile fallback name ("default") resolves.
fn write_default_prompt(prompts_dir: &Path) {
    let dir = prompts_dir.join("radarr").join("default");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("system.txt"), "Pick the best release.").unwrap();
}

fn ddo_payload(releases: Value) -> Value {
    json!({
        "eventType": "DownloadDecisionOverride",
        "instanceName": "Radarr",
        "movie": { "id": 7, "title": "Test Movie" },
        "releases": releases,
    })
}

fn two_releases() -> Value {
    json!([
        { "guid": "a", "title": "Release.A.1080p", "size": 5_368_709_120u64,
          "quality": "Bluray-1080p", "indexer": "Idx", "isSelected": true },
        { "guid": "b", "title": "Release.B.1080p", "size": 10_737_418_240u64,
          "quality": "Bluray-1080p", "indexer": "Idx", "seeders": 50 },
    ])
}

async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let tmp = TempDir::new().unwrap();
    let app = app(tmp.path(), picker_answering(1, "x"), false);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "arr-llm-picker");
}

#[tokio::test]
async fn test_unconfigured_service_defers() {
    let tmp = TempDir::new().unwrap();
    let app = app(tmp.path(), picker_answering(1, "x"), false);

    // Only Radarr is configured in the test state.
    let (status, body) = post_json(
        app,
        "/hook/sonarr/override",
        &ddo_payload(two_releases()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved"], true);
    assert_eq!(body["reason"], "Sonarr not configured");
}

#[tokio::test]
async fn test_unparseable_body_is_empty_payload() {
    let tmp = TempDir::new().unwrap();
    let app = app(tmp.path(), picker_answering(1, "x"), false);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/hook/radarr/override")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["approved"], true);
    assert_eq!(body["reason"], "Empty payload");
}

#[tokio::test]
async fn test_other_event_types_are_acknowledged() {
    let tmp = TempDir::new().unwrap();
    let app = app(tmp.path(), picker_answering(1, "x"), false);

    let payload = json!({ "eventType": "Grab", "releases": [] });
    let (status, body) = post_json(app, "/hook/radarr/override", &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reason"], "Ignored event type: Grab");
}

#[tokio::test]
async fn test_empty_release_list() {
    let tmp = TempDir::new().unwrap();
    let app = app(tmp.path(), picker_answering(1, "x"), false);

    let (status, body) = post_json(app, "/hook/radarr/override", &ddo_payload(json!([]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved"], true);
    assert_eq!(body["reason"], "No releases to evaluate");
    assert!(body.get("selectedReleaseGuid").is_none());
}

#[tokio::test]
async fn test_no_prompt_for_profile_bypasses_ai() {
    // Empty prompts directory: the profile lookup falls back to "default",
    // which has no prompt configured.
    let tmp = TempDir::new().unwrap();
    let app = app(tmp.path(), picker_answering(1, "x"), false);

    let (status, body) = post_json(
        app,
        "/hook/radarr/override",
        &ddo_payload(two_releases()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved"], true);
    assert_eq!(body["reason"], "AI bypassed - no prompt for this profile");
    assert!(body.get("selectedReleaseGuid").is_none());
}

#[tokio::test]
async fn test_override_returns_selected_guid() {
    let tmp = TempDir::new().unwrap();
    write_default_prompt(tmp.path());
    let app = app(tmp.path(), picker_answering(2, "better seeders"), false);

    let (status, body) = post_json(
        app,
        "/hook/radarr/override",
        &ddo_payload(two_releases()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved"], true);
    assert_eq!(body["selectedReleaseGuid"], "b");
    assert_eq!(body["reason"], "better seeders");
}

#[tokio::test]
async fn test_confirming_default_keeps_guid_absent() {
    let tmp = TempDir::new().unwrap();
    write_default_prompt(tmp.path());
    let app = app(tmp.path(), picker_answering(1, "default is fine"), false);

    let (_, body) = post_json(
        app,
        "/hook/radarr/override",
        &ddo_payload(two_releases()),
    )
    .await;
    assert_eq!(body["reason"], "AI confirms default: default is fine");
    assert!(body.get("selectedReleaseGuid").is_none());
}

#[tokio::test]
async fn test_dry_run_suppresses_override() {
    let tmp = TempDir::new().unwrap();
    write_default_prompt(tmp.path());
    let app = app(tmp.path(), picker_answering(2, "better seeders"), true);

    let (_, body) = post_json(
        app,
        "/hook/radarr/override",
        &ddo_payload(two_releases()),
    )
    .await;
    assert_eq!(body["approved"], true);
    assert_eq!(body["reason"], "[DRY RUN] Would select: Release.B.1080p");
    assert!(body.get("selectedReleaseGuid").is_none());
}

#[tokio::test]
async fn test_model_failure_defers_to_manager() {
    let tmp = TempDir::new().unwrap();
    write_default_prompt(tmp.path());
    let app = app(
        tmp.path(),
        Arc::new(ScriptedPicker {
            result: Err("connection refused".to_string()),
        }),
        false,
    );

    let (status, body) = post_json(
        app,
        "/hook/radarr/override",
        &ddo_payload(two_releases()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved"], true);
    let reason = body["reason"].as_str().unwrap();
    assert!(reason.starts_with("AI failed: "));
    assert!(reason.ends_with(", using default"));
    assert!(body.get("selectedReleaseGuid").is_none());
}

#[tokio::test]
async fn test_out_of_range_choice_defers_to_manager() {
    let tmp = TempDir::new().unwrap();
    write_default_prompt(tmp.path());
    let app = app(tmp.path(), picker_answering(3, "x"), false);

    let (_, body) = post_json(
        app,
        "/hook/radarr/override",
        &ddo_payload(two_releases()),
    )
    .await;
    assert!(body["reason"].as_str().unwrap().starts_with("AI failed: "));
    assert!(body.get("selectedReleaseGuid").is_none());
}

#[tokio::test]
async fn test_reload_picks_up_new_prompts() {
    let tmp = TempDir::new().unwrap();
    let state = AppState::with_picker(
        test_config(tmp.path(), false),
        picker_answering(2, "better seeders"),
    )
    .unwrap();

    // Before reload: no prompts, webhook bypasses AI.
    let (_, body) = post_json(
        build_router(state.clone()),
        "/hook/radarr/override",
        &ddo_payload(two_releases()),
    )
    .await;
    assert_eq!(body["reason"], "AI bypassed - no prompt for this profile");

    write_default_prompt(tmp.path());
    let response = build_router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/reload")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let reloaded: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(reloaded["status"], "reloaded");
    assert_eq!(reloaded["radarr_profiles"], json!(["default"]));

    // After reload the same request reaches the model.
    let (_, body) = post_json(
        build_router(state),
        "/hook/radarr/override",
        &ddo_payload(two_releases()),
    )
    .await;
    assert_eq!(body["selectedReleaseGuid"], "b");
}
