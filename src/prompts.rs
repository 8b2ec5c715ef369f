//! Per-profile system prompt table.
//!
//! Prompts live on disk as `<prompts_dir>/<service>/<profile>/system.txt`.
//! The scan produces an immutable `PromptTable`; decisions read one snapshot
//! for their whole lifetime, and `/reload` publishes a brand-new table
//! atomically instead of mutating entries in place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::models::Service;

/// Immutable `service -> (profile, lowercased) -> system prompt` mapping.
#[derive(Debug, Default)]
pub struct PromptTable {
    radarr: HashMap<String, String>,
    sonarr: HashMap<String, String>,
}

impl PromptTable {
    /// Exact case-insensitive lookup. `None` means AI selection is disabled
    /// for this profile; callers treat that as "defer to the manager",
    /// never as an error. No fuzzy matching, no fallback profile.
    pub fn resolve(&self, service: Service, profile_name: &str) -> Option<&str> {
        let key = profile_name.trim().to_lowercase();
        self.profiles(service).get(&key).map(String::as_str)
    }

    pub fn insert(&mut self, service: Service, profile: &str, prompt: String) {
        self.profiles_mut(service)
            .insert(profile.trim().to_lowercase(), prompt);
    }

    /// Loaded profile names for one service, sorted for stable output.
    pub fn profile_names(&self, service: Service) -> Vec<String> {
        let mut names: Vec<String> = self.profiles(service).keys().cloned().collect();
        names.sort();
        names
    }

    /// Total number of loaded prompts across services.
    pub fn len(&self) -> usize {
        self.radarr.len() + self.sonarr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn profiles(&self, service: Service) -> &HashMap<String, String> {
        match service {
            Service::Radarr => &self.radarr,
            Service::Sonarr => &self.sonarr,
        }
    }

    fn profiles_mut(&mut self, service: Service) -> &mut HashMap<String, String> {
        match service {
            Service::Radarr => &mut self.radarr,
            Service::Sonarr => &mut self.sonarr,
        }
    }
}

/// Read `system.txt` from one profile directory; empty or missing files
/// yield no prompt.
fn load_system_prompt(profile_dir: &Path) -> Option<String> {
    let path = profile_dir.join("system.txt");
    let content = std::fs::read_to_string(path).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Scan the prompts directory into a fresh table.
///
/// A missing directory is not an error: it leaves the table empty, which
/// disables AI selection everywhere (passthrough mode).
pub fn scan_prompts(prompts_dir: &Path) -> PromptTable {
    let mut table = PromptTable::default();

    if !prompts_dir.is_dir() {
        info!(
            "Prompts directory not found: {}. AI selection disabled for all profiles.",
            prompts_dir.display()
        );
        return table;
    }

    for service in [Service::Radarr, Service::Sonarr] {
        let service_dir = prompts_dir.join(service.as_str());
        let Ok(entries) = std::fs::read_dir(&service_dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let profile_dir = entry.path();
            if !profile_dir.is_dir() {
                continue;
            }
            let profile = entry.file_name().to_string_lossy().to_string();
            if let Some(prompt) = load_system_prompt(&profile_dir) {
                info!("Loaded prompt for {}/{}", service, profile.to_lowercase());
                table.insert(service, &profile, prompt);
            }
        }
    }

    if table.is_empty() {
        info!(
            "No prompts found in {}. AI selection disabled for all profiles.",
            prompts_dir.display()
        );
    }

    table
}

/// Snapshot-and-swap store for the prompt table.
///
/// Readers clone the inner `Arc` once per decision and keep observing that
/// snapshot even if a reload lands mid-decision.
#[derive(Clone)]
pub struct PromptStore {
    table: Arc<RwLock<Arc<PromptTable>>>,
    prompts_dir: PathBuf,
}

impl PromptStore {
    /// Scan `prompts_dir` and publish the initial table.
    pub fn new(prompts_dir: PathBuf) -> Self {
        let table = Arc::new(scan_prompts(&prompts_dir));
        PromptStore {
            table: Arc::new(RwLock::new(table)),
            prompts_dir,
        }
    }

    /// Current snapshot; stable for as long as the caller holds it.
    pub async fn snapshot(&self) -> Arc<PromptTable> {
        self.table.read().await.clone()
    }

    /// Rescan the prompts directory and swap in the new table.
    pub async fn reload(&self) -> Arc<PromptTable> {
        let fresh = Arc::new(scan_prompts(&self.prompts_dir));
        let mut guard = self.table.write().await;
        *guard = fresh.clone();
        info!("Prompts reloaded ({} total)", fresh.len());
        fresh
    }
}
