use crate::blob::BlobStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;
use watcher_core::{Category, StorageError};

pub const STATS_KEY: &str = "stats";

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedStats {
    #[serde(default)]
    counters: BTreeMap<String, u64>,
    #[serde(default)]
    last_event: Option<DateTime<Utc>>,
}

/// Per-category post counters plus process uptime.
pub struct StatsCounter {
    start_time: DateTime<Utc>,
    last_event: Option<DateTime<Utc>>,
    counters: BTreeMap<Category, u64>,
    blobs: Arc<dyn BlobStore>,
}

impl StatsCounter {
    pub async fn load(blobs: Arc<dyn BlobStore>) -> Self {
        let persisted = match blobs.load_blob(STATS_KEY).await {
            Ok(Some(raw)) => serde_json::from_str::<PersistedStats>(&raw).unwrap_or_else(|e| {
                warn!("Discarding corrupt stats: {}", e);
                PersistedStats::default()
            }),
            Ok(None) => PersistedStats::default(),
            Err(e) => {
                warn!("Unable to load stats: {}", e);
                PersistedStats::default()
            }
        };

        let mut counters = BTreeMap::new();
        for (name, hits) in persisted.counters {
            match name.parse::<Category>() {
                Ok(category) => {
                    counters.insert(category, hits);
                }
                Err(_) => warn!("Ignoring stats for unknown category {}", name),
            }
        }

        Self {
            start_time: Utc::now(),
            last_event: persisted.last_event,
            counters,
            blobs,
        }
    }

    pub async fn increment(&mut self, category: Category) -> Result<(), StorageError> {
        *self.counters.entry(category).or_insert(0) += 1;
        self.last_event = Some(Utc::now());
        self.save().await
    }

    pub fn count(&self, category: Category) -> u64 {
        self.counters.get(&category).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> BTreeMap<String, String> {
        let mut snapshot = BTreeMap::new();
        snapshot.insert(
            "uptime".to_string(),
            format_elapsed(Some(self.start_time), now),
        );
        snapshot.insert(
            "last-event".to_string(),
            format_elapsed(self.last_event, now),
        );
        for (category, hits) in &self.counters {
            snapshot.insert(category.to_string(), format!("{} hits", hits));
        }
        snapshot
    }

    async fn save(&self) -> Result<(), StorageError> {
        let persisted = PersistedStats {
            counters: self
                .counters
                .iter()
                .map(|(category, hits)| (category.to_string(), *hits))
                .collect(),
            last_event: self.last_event,
        };
        let raw = serde_json::to_string(&persisted).map_err(|source| {
            StorageError::Serialization {
                key: STATS_KEY.to_string(),
                source,
            }
        })?;
        self.blobs.save_blob(STATS_KEY, &raw).await
    }
}

/// Renders the time since `since` as `"2d 3h 4m"`, skipping zero parts.
pub fn format_elapsed(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(since) = since else {
        return "unknown".to_string();
    };

    let minutes = (now - since).num_minutes().max(0);
    let days = minutes / (24 * 60);
    let hours = (minutes / 60) % 24;
    let mins = minutes % 60;

    let mut parts = Vec::new();
    if days != 0 {
        parts.push(format!("{}d", days));
    }
    if hours != 0 {
        parts.push(format!("{}h", hours));
    }
    if mins != 0 {
        parts.push(format!("{}m", mins));
    }

    if parts.is_empty() {
        "just now".to_string()
    } else {
        parts.join(" ")
    }
}
