//! Typed model of the Download Decision Override payload.
//!
//! The webhook body arrives as arbitrary JSON; this module converts it into
//! the typed shapes everything downstream operates on. Both entry paths (the
//! webhook itself and the simulate endpoints, which rebuild releases from the
//! arr search API) normalize into the same `Release` shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Media manager that originated a selection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Radarr,
    Sonarr,
}

impl Service {
    /// Lowercase identifier used for prompt-table keys and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Radarr => "radarr",
            Service::Sonarr => "sonarr",
        }
    }

    /// Capitalized name for user-facing reason strings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Service::Radarr => "Radarr",
            Service::Sonarr => "Sonarr",
        }
    }

    /// ntfy tag attached to override notifications for this service.
    pub fn notification_tag(&self) -> &'static str {
        match self {
            Service::Radarr => "movie_camera",
            Service::Sonarr => "tv",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn unknown() -> String {
    "Unknown".to_string()
}

/// One candidate release as reported by the manager.
///
/// Position within the payload's `releases` array is the stable 1-based index
/// the model answers with; releases are never re-sorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Opaque selector, unique within one decision request.
    #[serde(default)]
    pub guid: String,
    #[serde(default = "unknown")]
    pub title: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default = "unknown")]
    pub quality: String,
    #[serde(default = "unknown")]
    pub indexer: String,
    #[serde(default)]
    pub seeders: u64,
    #[serde(default)]
    pub custom_format_score: i64,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub custom_formats: Vec<String>,
    #[serde(default)]
    pub indexer_flags: Vec<String>,
    #[serde(default)]
    pub age_minutes: f64,
    /// The manager's own top pick within the list.
    #[serde(default)]
    pub is_selected: bool,
}

impl Release {
    /// Normalize a raw arr `release` search result into the DDO shape.
    ///
    /// The search API nests quality (`quality.quality.name`) and reports
    /// languages/custom formats as objects with a `name` field, unlike the
    /// flattened webhook payload.
    pub fn from_arr_search(raw: &Value, is_selected: bool) -> Self {
        let name_list = |key: &str| -> Vec<String> {
            raw.get(key)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.get("name").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };

        Release {
            guid: raw
                .get("guid")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            title: raw
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
            size: raw.get("size").and_then(Value::as_u64).unwrap_or(0),
            quality: raw
                .pointer("/quality/quality/name")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
            indexer: raw
                .get("indexer")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
            seeders: raw.get("seeders").and_then(Value::as_u64).unwrap_or(0),
            custom_format_score: raw
                .get("customFormatScore")
                .and_then(Value::as_i64)
                .unwrap_or(0),
            languages: name_list("languages"),
            custom_formats: name_list("customFormats"),
            indexer_flags: raw
                .get("indexerFlags")
                .and_then(Value::as_array)
                .map(|flags| {
                    flags
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            age_minutes: raw.get("ageMinutes").and_then(Value::as_f64).unwrap_or(0.0),
            is_selected,
        }
    }
}

/// Movie or series reference inside the webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default = "unknown")]
    pub title: String,
}

/// Download Decision Override webhook body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DdoPayload {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub instance_name: Option<String>,
    #[serde(default)]
    pub movie: Option<MediaRef>,
    #[serde(default)]
    pub series: Option<MediaRef>,
    #[serde(default)]
    pub releases: Vec<Release>,
}

impl DdoPayload {
    /// The media reference matching the originating service.
    pub fn media(&self, service: Service) -> Option<&MediaRef> {
        match service {
            Service::Radarr => self.movie.as_ref(),
            Service::Sonarr => self.series.as_ref(),
        }
    }
}

/// Immutable input to one selection decision.
///
/// Exactly one request maps to exactly one decision; no cross-request state
/// is kept. Skip-tag membership is resolved by the caller before the request
/// reaches the engine.
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    pub media_title: String,
    pub service: Service,
    pub profile_name: String,
    pub releases: Vec<Release>,
    pub skip_tag_matched: bool,
}

impl SelectionRequest {
    /// The manager's default pick: the first release flagged `isSelected`.
    ///
    /// If the payload flags several, the first in original order is treated
    /// as the default for comparison purposes.
    pub fn default_release(&self) -> Option<&Release> {
        self.releases.iter().find(|r| r.is_selected)
    }
}
