//! Radarr/Sonarr v3 API client.
//!
//! Both managers expose the same surface for everything this service needs,
//! so one client covers both, parameterized by `Service`. Lookups feeding
//! the decision pipeline (profile name, tags) degrade to safe fallbacks on
//! failure instead of propagating, matching the always-answer webhook
//! contract.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::models::Service;

#[derive(Debug, Error)]
pub enum ArrError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub struct ArrClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    service: Service,
}

impl ArrClient {
    pub fn new(service: Service, base_url: String, api_key: String) -> Result<Self, ArrError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ArrError::Network(e.to_string()))?;
        Ok(ArrClient {
            http,
            base_url,
            api_key,
            service,
        })
    }

    pub fn service(&self) -> Service {
        self.service
    }

    /// GET an endpoint under `/api/v3/` and parse the JSON body.
    pub async fn get(&self, endpoint: &str) -> Result<Value, ArrError> {
        let url = format!("{}/api/v3/{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| ArrError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ArrError::Api(status.as_u16(), text));
        }

        response
            .json()
            .await
            .map_err(|e| ArrError::Parse(e.to_string()))
    }

    pub async fn system_status(&self) -> Result<Value, ArrError> {
        self.get("system/status").await
    }

    /// All quality profiles configured in the manager.
    pub async fn quality_profiles(&self) -> Result<Vec<Value>, ArrError> {
        let value = self.get("qualityprofile").await?;
        value
            .as_array()
            .cloned()
            .ok_or_else(|| ArrError::Parse("expected profile array".to_string()))
    }

    /// Fetch the movie (Radarr) or series (Sonarr) record.
    pub async fn fetch_media(&self, media_id: i64) -> Result<Value, ArrError> {
        self.get(&format!("{}/{}", self.media_endpoint(), media_id))
            .await
    }

    /// Current candidate releases from the manager's interactive search.
    pub async fn fetch_releases(&self, media_id: i64) -> Result<Vec<Value>, ArrError> {
        let value = self
            .get(&format!("release?{}={}", self.release_query_key(), media_id))
            .await?;
        value
            .as_array()
            .cloned()
            .ok_or_else(|| ArrError::Parse("expected release array".to_string()))
    }

    /// Quality profile name for a media item, or `"default"` when any part
    /// of the lookup fails.
    pub async fn quality_profile_name(&self, media_id: i64) -> String {
        match self.lookup_profile_name(media_id).await {
            Ok(Some(name)) => name,
            Ok(None) => "default".to_string(),
            Err(e) => {
                warn!("Failed to get quality profile: {}", e);
                "default".to_string()
            }
        }
    }

    async fn lookup_profile_name(&self, media_id: i64) -> Result<Option<String>, ArrError> {
        let media = self.fetch_media(media_id).await?;
        let profile_id = media
            .get("qualityProfileId")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let profiles = self.quality_profiles().await?;
        Ok(profiles
            .iter()
            .find(|p| p.get("id").and_then(Value::as_i64) == Some(profile_id))
            .and_then(|p| p.get("name").and_then(Value::as_str))
            .map(str::to_string))
    }

    /// Lowercased tag labels attached to a media item; empty on any failure
    /// so a broken tag lookup never blocks the webhook.
    pub async fn media_tags(&self, media_id: i64) -> Vec<String> {
        match self.lookup_tags(media_id).await {
            Ok(tags) => tags,
            Err(e) => {
                warn!("Failed to get media tags: {}", e);
                Vec::new()
            }
        }
    }

    async fn lookup_tags(&self, media_id: i64) -> Result<Vec<String>, ArrError> {
        let media = self.fetch_media(media_id).await?;
        let tag_ids: Vec<i64> = media
            .get("tags")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let all_tags = self.get("tag").await?;
        let all_tags = all_tags
            .as_array()
            .ok_or_else(|| ArrError::Parse("expected tag array".to_string()))?;

        Ok(tag_ids
            .iter()
            .filter_map(|id| {
                all_tags
                    .iter()
                    .find(|t| t.get("id").and_then(Value::as_i64) == Some(*id))
                    .and_then(|t| t.get("label").and_then(Value::as_str))
                    .map(|label| label.to_lowercase())
            })
            .collect())
    }

    fn media_endpoint(&self) -> &'static str {
        match self.service {
            Service::Radarr => "movie",
            Service::Sonarr => "series",
        }
    }

    fn release_query_key(&self) -> &'static str {
        match self.service {
            Service::Radarr => "movieId",
            Service::Sonarr => "seriesId",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ArrClient::new(
            Service::Radarr,
            "http://localhost:7878".to_string(),
            "key".to_string(),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_service_specific_endpoints() {
        let radarr = ArrClient::new(Service::Radarr, "http://r".to_string(), "k".to_string())
            .unwrap();
        let sonarr = ArrClient::new(Service::Sonarr, "http://s".to_string(), "k".to_string())
            .unwrap();
        assert_eq!(radarr.media_endpoint(), "movie");
        assert_eq!(radarr.release_query_key(), "movieId");
        assert_eq!(sonarr.media_endpoint(), "series");
        assert_eq!(sonarr.release_query_key(), "seriesId");
    }

    #[tokio::test]
    async fn test_unreachable_host_degrades_to_defaults() {
        // Port 1 is never listening; lookups fall back instead of erroring.
        let client = ArrClient::new(
            Service::Radarr,
            "http://127.0.0.1:1".to_string(),
            "k".to_string(),
        )
        .unwrap();
        assert_eq!(client.quality_profile_name(5).await, "default");
        assert!(client.media_tags(5).await.is_empty());
    }
}
