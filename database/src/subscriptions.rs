use crate::blob::BlobStore;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use watcher_core::{Category, Keywords, StorageError, UserId};

/// Watch list of every user for one category.
///
/// The user -> keyword map is the source of truth and is the only thing
/// persisted. The keyword -> users index is rebuilt from it in full inside
/// every call that changes its key set, so readers never see a stale index.
///
/// Mutations are applied in memory before they are saved. A failed save is
/// returned to the caller but the change stays in effect.
pub struct SubscriptionStore {
    category: Category,
    users: BTreeMap<UserId, Keywords>,
    index: BTreeMap<String, BTreeSet<UserId>>,
    blobs: Arc<dyn BlobStore>,
}

fn normalize(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

impl SubscriptionStore {
    pub fn blob_key(category: Category) -> String {
        format!("subscriptions/{}", category)
    }

    /// Restores the store from `blobs`, starting empty when nothing usable
    /// was saved before.
    pub async fn load(category: Category, blobs: Arc<dyn BlobStore>) -> Self {
        let key = Self::blob_key(category);
        let users = match blobs.load_blob(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<BTreeMap<UserId, Keywords>>(&raw) {
                Ok(users) => users,
                Err(e) => {
                    warn!("Discarding corrupt subscriptions in {}: {}", key, e);
                    BTreeMap::new()
                }
            },
            Ok(None) => {
                debug!("No saved subscriptions in {}", key);
                BTreeMap::new()
            }
            Err(e) => {
                warn!("Unable to load subscriptions from {}: {}", key, e);
                BTreeMap::new()
            }
        };

        let mut store = Self {
            category,
            users,
            index: BTreeMap::new(),
            blobs,
        };
        store.rebuild_index();
        info!(
            "Loaded {} store: {} subscribers, {} keywords",
            category,
            store.subscriber_count(),
            store.keyword_count()
        );
        store
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Keywords of `user`. Unknown users get an empty entry.
    pub fn get(&mut self, user: UserId) -> &Keywords {
        self.users.entry(user).or_default()
    }

    /// Hit count of one pair, without allocating an entry.
    pub fn hits(&self, user: UserId, keyword: &str) -> Option<u64> {
        self.users
            .get(&user)
            .and_then(|keywords| keywords.get(&normalize(keyword)))
            .copied()
    }

    pub fn exists(&self, user: UserId, keyword: &str) -> bool {
        self.users
            .get(&user)
            .is_some_and(|keywords| keywords.contains_key(&normalize(keyword)))
    }

    /// Watches `keyword` for `user` with a fresh hit count.
    pub async fn add(&mut self, user: UserId, keyword: &str) -> Result<(), StorageError> {
        self.users.entry(user).or_default().insert(normalize(keyword), 0);
        self.rebuild_index();
        self.save().await
    }

    pub async fn remove(&mut self, user: UserId, keyword: &str) -> Result<(), StorageError> {
        if let Some(keywords) = self.users.get_mut(&user) {
            keywords.remove(&normalize(keyword));
        }
        self.rebuild_index();
        self.save().await
    }

    /// Counts a delivered match. A pair that vanished in the meantime is
    /// recreated with one hit.
    pub async fn increment(&mut self, user: UserId, keyword: &str) -> Result<(), StorageError> {
        let keyword = normalize(keyword);
        let keywords = self.users.entry(user).or_default();
        let created = !keywords.contains_key(&keyword);
        *keywords.entry(keyword).or_insert(0) += 1;

        if created {
            self.rebuild_index();
        }
        self.save().await
    }

    pub fn get_by_keyword(&self, keyword: &str) -> Vec<UserId> {
        self.index
            .get(&normalize(keyword))
            .map(|users| users.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every keyword watched by at least one user, sorted.
    pub fn get_all_keywords(&self) -> Vec<String> {
        self.index.keys().cloned().collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.users.values().filter(|k| !k.is_empty()).count()
    }

    pub fn keyword_count(&self) -> usize {
        self.index.len()
    }

    fn rebuild_index(&mut self) {
        let mut index: BTreeMap<String, BTreeSet<UserId>> = BTreeMap::new();
        for (user, keywords) in &self.users {
            for keyword in keywords.keys() {
                index.entry(keyword.clone()).or_default().insert(*user);
            }
        }
        self.index = index;
    }

    async fn save(&self) -> Result<(), StorageError> {
        let key = Self::blob_key(self.category);
        let raw = serde_json::to_string(&self.users).map_err(|source| {
            StorageError::Serialization {
                key: key.clone(),
                source,
            }
        })?;
        self.blobs.save_blob(&key, &raw).await
    }
}
