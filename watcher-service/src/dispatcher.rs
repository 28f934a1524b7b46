use crate::commands::{parse_command, Command};
use crate::replies;
use database::{BlobStore, StatsCounter, SubscriptionStore};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use watcher_core::{
    Category, CoreError, Disposition, ErrorReporter, IncomingCommand, Keywords, Notifier, Post,
    UserId,
};

/// Owns every store and processes one event at a time to completion.
///
/// All state mutation happens here, so neither the stores nor the stats
/// counter need locking.
pub struct Dispatcher<N: Notifier> {
    notifier: N,
    stores: HashMap<Category, SubscriptionStore>,
    stats: StatsCounter,
    reporter: ErrorReporter,
    version: String,
}

impl<N: Notifier> Dispatcher<N> {
    pub fn new(
        notifier: N,
        stores: HashMap<Category, SubscriptionStore>,
        stats: StatsCounter,
    ) -> Self {
        Self {
            notifier,
            stores,
            stats,
            reporter: ErrorReporter::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Restores one store per category plus the stats counter from `blobs`.
    pub async fn load(notifier: N, blobs: Arc<dyn BlobStore>) -> Self {
        let mut stores = HashMap::new();
        for category in Category::ALL {
            stores.insert(category, SubscriptionStore::load(category, blobs.clone()).await);
        }
        let stats = StatsCounter::load(blobs).await;
        Self::new(notifier, stores, stats)
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn store(&self, category: Category) -> Option<&SubscriptionStore> {
        self.stores.get(&category)
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    /// Classifies `post` and notifies every subscriber of every matching
    /// keyword. Returns how many notifications were attempted.
    ///
    /// Storage and send failures are logged per pair and never stop the
    /// remaining deliveries.
    pub async fn handle_post(&mut self, post: &Post) -> Result<usize, CoreError> {
        info!("POST: {} {}", post.id, post.title);
        let item = matcher::classify(&post.title)?;
        debug!("PARSE: category: {} region: {:?}", item.category, item.region);

        if let Err(e) = self.stats.increment(item.category).await {
            self.reporter.report(&e.into());
        }

        let store = self
            .stores
            .get_mut(&item.category)
            .ok_or_else(|| CoreError::UnknownCategory {
                category: item.category.to_string(),
            })?;

        let keywords = store.get_all_keywords();
        let matched = matcher::find_matches(&keywords, &item.content, &post.self_text);
        let deliverable = item.is_deliverable();

        let mut attempted = 0;
        for keyword in matched {
            let message = replies::notification(post, item.category, &keyword);
            for user_id in store.get_by_keyword(&keyword) {
                if !deliverable {
                    debug!("Skipping {} for {}: region {}", post.id, user_id, item.region);
                    continue;
                }

                info!(
                    "MATCH: {}/{} for {} ({})",
                    item.category, keyword, user_id, post.url
                );
                attempted += 1;
                if let Err(e) = self.notifier.send_message(user_id, &message).await {
                    self.reporter.report(&e.into());
                }
                if let Err(e) = store.increment(user_id, &keyword).await {
                    self.reporter.report(&e.into());
                }
            }
        }

        Ok(attempted)
    }

    /// Answers one chat message. Text that is not a slash command gets no
    /// reply; every slash command gets exactly one.
    pub async fn handle_command(&mut self, command: &IncomingCommand) -> Result<(), CoreError> {
        debug!("MSG: {} from {}", command.text, command.user_id);
        let Some(parsed) = parse_command(&command.text) else {
            debug!("Ignoring non-command text from {}", command.user_id);
            return Ok(());
        };

        let reply = match parsed {
            Command::Toggle { category, keyword } => {
                self.toggle(command.user_id, category, &keyword).await?
            }
            Command::Items => self.items(command.user_id),
            Command::Stats => replies::stats(&self.stats_fields()),
            Command::Help => replies::help(&self.version),
            Command::Start => replies::start(&self.version),
            Command::Unknown(name) => {
                debug!("Unknown command /{} from {}", name, command.user_id);
                replies::UNKNOWN_COMMAND.to_string()
            }
        };

        self.notifier
            .send_message(command.user_id, &reply)
            .await
            .map_err(CoreError::from)
    }

    async fn toggle(
        &mut self,
        user_id: UserId,
        category: Category,
        keyword: &str,
    ) -> Result<String, CoreError> {
        let keyword = keyword.trim().to_lowercase();
        let keyword = keyword.as_str();
        let store = self
            .stores
            .get_mut(&category)
            .ok_or_else(|| CoreError::UnknownCategory {
                category: category.to_string(),
            })?;

        if store.exists(user_id, keyword) {
            if let Err(e) = store.remove(user_id, keyword).await {
                self.reporter.report(&e.into());
            }
            info!("{} stopped watching {}/{}", user_id, category, keyword);
            Ok(replies::unwatching(category, keyword))
        } else {
            if let Err(e) = store.add(user_id, keyword).await {
                self.reporter.report(&e.into());
            }
            info!("{} started watching {}/{}", user_id, category, keyword);
            Ok(replies::watching(category, keyword))
        }
    }

    fn items(&mut self, user_id: UserId) -> String {
        let mut entries: Vec<(Category, Keywords)> = Vec::new();
        for category in Category::ALL {
            if let Some(store) = self.stores.get_mut(&category) {
                entries.push((category, store.get(user_id).clone()));
            }
        }
        replies::watchlist(&entries)
    }

    fn stats_fields(&self) -> BTreeMap<String, String> {
        let mut fields = self.stats.snapshot();
        let subscriptions: usize = self.stores.values().map(|s| s.subscriber_count()).sum();
        let keywords: usize = self.stores.values().map(|s| s.keyword_count()).sum();
        fields.insert("subscriptions".to_string(), subscriptions.to_string());
        fields.insert("keywords".to_string(), keywords.to_string());
        fields
    }

    /// Consumes both event channels until they are closed or an error leaves
    /// the bot unable to continue.
    pub async fn run(
        mut self,
        mut posts: mpsc::Receiver<Post>,
        mut commands: mpsc::Receiver<IncomingCommand>,
    ) -> Result<(), CoreError> {
        let mut posts_open = true;
        let mut commands_open = true;
        info!("Dispatcher started");

        loop {
            let result = tokio::select! {
                post = posts.recv(), if posts_open => match post {
                    Some(post) => self.handle_post(&post).await.map(|_| ()),
                    None => {
                        warn!("Post source closed");
                        posts_open = false;
                        Ok(())
                    }
                },
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(&command).await,
                    None => {
                        warn!("Command source closed");
                        commands_open = false;
                        Ok(())
                    }
                },
                else => break,
            };

            if let Err(e) = result {
                if self.reporter.report(&e) == Disposition::Fatal {
                    return Err(e);
                }
            }
        }

        info!("Dispatcher stopped");
        Ok(())
    }
}
