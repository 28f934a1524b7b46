#[cfg(test)]
mod tests {
    use crate::replies::UNKNOWN_COMMAND;
    use crate::Dispatcher;
    use async_trait::async_trait;
    use database::{BlobStore, MemoryBlobStore, StatsCounter, SubscriptionStore};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;
    use watcher_core::{Category, CoreError, IncomingCommand, Notifier, Post, SendError, UserId};

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<(UserId, String)>>>,
        fail: Arc<AtomicBool>,
    }

    impl RecordingNotifier {
        fn messages(&self) -> Vec<(UserId, String)> {
            self.sent.lock().unwrap().clone()
        }

        fn last_text(&self) -> String {
            self.messages().last().map(|(_, text)| text.clone()).unwrap_or_default()
        }

        fn clear(&self) {
            self.sent.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_message(&self, user_id: UserId, text: &str) -> Result<(), SendError> {
            self.sent.lock().unwrap().push((user_id, text.to_string()));
            if self.fail.load(Ordering::SeqCst) {
                return Err(SendError::Rejected {
                    user_id,
                    description: "Forbidden: bot was blocked by the user".to_string(),
                });
            }
            Ok(())
        }
    }

    async fn setup() -> (Dispatcher<RecordingNotifier>, RecordingNotifier, Arc<MemoryBlobStore>) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let notifier = RecordingNotifier::default();
        let dispatcher = Dispatcher::load(notifier.clone(), blobs.clone() as Arc<dyn BlobStore>)
            .await
            .with_version("9.9.9");
        (dispatcher, notifier, blobs)
    }

    fn command(user_id: UserId, text: &str) -> IncomingCommand {
        IncomingCommand {
            user_id,
            text: text.to_string(),
        }
    }

    fn post(title: &str, self_text: &str) -> Post {
        Post {
            id: "abc123".to_string(),
            title: title.to_string(),
            self_text: self_text.to_string(),
            url: "https://www.reddit.com/r/mechmarket/comments/abc123/".to_string(),
            permalink: "https://www.reddit.com/r/mechmarket/comments/abc123/post/".to_string(),
        }
    }

    fn hits(
        dispatcher: &Dispatcher<RecordingNotifier>,
        category: Category,
        user: UserId,
        keyword: &str,
    ) -> Option<u64> {
        dispatcher.store(category)?.hits(user, keyword)
    }

    #[tokio::test]
    async fn test_buying_tada68_scenario() {
        let (mut dispatcher, notifier, _) = setup().await;

        dispatcher.handle_command(&command(1, "/buying Tada68")).await.unwrap();
        assert_eq!(
            notifier.last_text(),
            "Okay, I'm going to watch for <b>buying</b> posts that match <b>tada68</b>"
        );
        notifier.clear();

        let attempted = dispatcher
            .handle_post(&post("[US-CA] [H] Money [W] Tada68", ""))
            .await
            .unwrap();

        assert_eq!(attempted, 1);
        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, 1);
        assert!(messages[0].1.starts_with("[US-CA] [H] Money [W] <b>Tada68</b>"));
        assert!(messages[0].1.ends_with("<i>(matched buying tada68)</i>"));
        assert_eq!(hits(&dispatcher, Category::Buying, 1, "tada68"), Some(1));
        assert_eq!(dispatcher.stats().count(Category::Buying), 1);
    }

    #[tokio::test]
    async fn test_foreign_region_is_suppressed() {
        let (mut dispatcher, notifier, _) = setup().await;
        dispatcher.handle_command(&command(1, "/selling tada68")).await.unwrap();
        notifier.clear();

        let attempted = dispatcher
            .handle_post(&post("[EU-DE] [H] Tada68 [W] PayPal", ""))
            .await
            .unwrap();

        assert_eq!(attempted, 0);
        assert!(notifier.messages().is_empty());
        assert_eq!(hits(&dispatcher, Category::Selling, 1, "tada68"), Some(0));
        assert_eq!(dispatcher.stats().count(Category::Selling), 1);
    }

    #[tokio::test]
    async fn test_body_match_and_post_without_region() {
        let (mut dispatcher, notifier, _) = setup().await;
        dispatcher.handle_command(&command(2, "/vendor restock")).await.unwrap();
        notifier.clear();

        let attempted = dispatcher
            .handle_post(&post("[Vendor] New arrivals", "Big RESTOCK this friday"))
            .await
            .unwrap();

        assert_eq!(attempted, 1);
        assert!(notifier.last_text().contains("(matched vendor restock)"));
    }

    #[tokio::test]
    async fn test_selling_toggle() {
        let (mut dispatcher, notifier, _) = setup().await;

        dispatcher.handle_command(&command(1, "/selling foo")).await.unwrap();
        assert_eq!(
            notifier.last_text(),
            "Okay, I'm going to watch for <b>selling</b> posts that match <b>foo</b>"
        );
        assert!(dispatcher.store(Category::Selling).unwrap().exists(1, "foo"));

        dispatcher.handle_command(&command(1, "/selling foo")).await.unwrap();
        assert_eq!(
            notifier.last_text(),
            "I'm no longer watching for <b>selling</b> posts that match <b>foo</b>"
        );
        assert!(!dispatcher.store(Category::Selling).unwrap().exists(1, "foo"));
        assert_eq!(notifier.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_toggle_without_argument_uses_wildcard() {
        let (mut dispatcher, notifier, _) = setup().await;

        dispatcher.handle_command(&command(3, "/artisan")).await.unwrap();
        assert!(notifier.last_text().ends_with("match <b>*</b>"));
        assert!(dispatcher.store(Category::Artisan).unwrap().exists(3, "*"));
    }

    #[tokio::test]
    async fn test_send_failure_still_counts_hit() {
        let (mut dispatcher, notifier, _) = setup().await;
        dispatcher.handle_command(&command(1, "/giveaway")).await.unwrap();
        notifier.fail.store(true, Ordering::SeqCst);

        let attempted = dispatcher
            .handle_post(&post("[Giveaway] Free switches", ""))
            .await
            .unwrap();

        assert_eq!(attempted, 1);
        assert_eq!(hits(&dispatcher, Category::Giveaway, 1, "*"), Some(1));
    }

    #[tokio::test]
    async fn test_storage_failure_does_not_stop_delivery() {
        let (mut dispatcher, notifier, blobs) = setup().await;
        dispatcher.handle_command(&command(1, "/groupbuy gmk")).await.unwrap();
        dispatcher.handle_command(&command(2, "/groupbuy gmk")).await.unwrap();
        notifier.clear();
        blobs.set_fail_writes(true);

        let attempted = dispatcher
            .handle_post(&post("[GB] GMK Olivia", ""))
            .await
            .unwrap();

        assert_eq!(attempted, 2);
        let recipients: Vec<UserId> = notifier.messages().iter().map(|(id, _)| *id).collect();
        assert_eq!(recipients, vec![1, 2]);
        assert_eq!(hits(&dispatcher, Category::GroupBuy, 2, "gmk"), Some(1));
        assert_eq!(dispatcher.stats().count(Category::GroupBuy), 1);
    }

    #[tokio::test]
    async fn test_toggle_reply_survives_storage_failure() {
        let (mut dispatcher, notifier, blobs) = setup().await;
        blobs.set_fail_writes(true);

        dispatcher.handle_command(&command(1, "/selling foo")).await.unwrap();
        assert!(notifier.last_text().starts_with("Okay"));
        assert!(dispatcher.store(Category::Selling).unwrap().exists(1, "foo"));
    }

    #[tokio::test]
    async fn test_wildcard_and_literal_both_deliver() {
        let (mut dispatcher, notifier, _) = setup().await;
        dispatcher.handle_command(&command(5, "/artisan")).await.unwrap();
        dispatcher.handle_command(&command(5, "/artisan fugu")).await.unwrap();
        notifier.clear();

        let attempted = dispatcher
            .handle_post(&post("[Artisan] Fugu sale", ""))
            .await
            .unwrap();

        assert_eq!(attempted, 2);
        let messages = notifier.messages();
        assert!(messages[0].1.starts_with("<b>[Artisan]</b> Fugu sale"));
        assert!(messages[1].1.starts_with("[Artisan] <b>Fugu</b> sale"));
    }

    #[tokio::test]
    async fn test_unparsable_title_is_dropped() {
        let (mut dispatcher, notifier, _) = setup().await;
        dispatcher.handle_command(&command(1, "/selling")).await.unwrap();
        notifier.clear();

        let result = dispatcher
            .handle_post(&post("May Confirmed Trade Thread", ""))
            .await;

        match result {
            Err(CoreError::Parse(e)) => {
                assert_eq!(e.to_string(), "not parsable: May Confirmed Trade Thread")
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
        assert!(notifier.messages().is_empty());
        assert_eq!(dispatcher.stats().count(Category::Selling), 0);
    }

    #[tokio::test]
    async fn test_missing_store_is_unknown_category() {
        let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        let mut stores = HashMap::new();
        stores.insert(
            Category::Buying,
            SubscriptionStore::load(Category::Buying, blobs.clone()).await,
        );
        let stats = StatsCounter::load(blobs).await;
        let mut dispatcher = Dispatcher::new(RecordingNotifier::default(), stores, stats);

        let result = dispatcher.handle_post(&post("[Vendor] Restock", "")).await;
        assert!(matches!(result, Err(CoreError::UnknownCategory { .. })));
        assert_eq!(dispatcher.stats().count(Category::Vendor), 1);
    }

    #[tokio::test]
    async fn test_items_lists_every_category() {
        let (mut dispatcher, notifier, _) = setup().await;

        dispatcher.handle_command(&command(1, "/items")).await.unwrap();
        assert_eq!(notifier.last_text(), "There are no items on your watch list");

        dispatcher.handle_command(&command(1, "/selling tada68")).await.unwrap();
        dispatcher.handle_command(&command(1, "/vendor")).await.unwrap();
        dispatcher.handle_command(&command(2, "/buying other")).await.unwrap();
        dispatcher.handle_command(&command(1, "/items")).await.unwrap();

        assert_eq!(
            notifier.last_text(),
            "These are your current watch items:\n\
             <b>SELLING:</b>\n - tada68 <i>(0 hits)</i>\n\n\
             <b>VENDOR:</b>\n - * <i>(0 hits)</i>\n"
        );
    }

    #[tokio::test]
    async fn test_stats_command() {
        let (mut dispatcher, notifier, _) = setup().await;
        dispatcher.handle_command(&command(1, "/selling tada68")).await.unwrap();
        dispatcher.handle_post(&post("[Vendor] Restock", "")).await.unwrap();

        dispatcher.handle_command(&command(1, "/stats")).await.unwrap();
        let reply = notifier.last_text();
        assert!(reply.starts_with("<b>Interesting Statistics:</b>"));
        assert!(reply.contains(" - vendor <i>(1 hits)</i>"));
        assert!(reply.contains(" - subscriptions <i>(1)</i>"));
        assert!(reply.contains(" - keywords <i>(1)</i>"));
        assert!(reply.contains(" - last-event <i>(just now)</i>"));
    }

    #[tokio::test]
    async fn test_help_start_and_unknown() {
        let (mut dispatcher, notifier, _) = setup().await;

        dispatcher.handle_command(&command(1, "/help")).await.unwrap();
        assert!(notifier.last_text().starts_with("Hi, I'm"));
        assert!(notifier.last_text().contains("mechwatch@9.9.9"));

        dispatcher.handle_command(&command(1, "/start")).await.unwrap();
        assert!(notifier.last_text().contains("/selling tada68"));

        dispatcher.handle_command(&command(1, "/invalid")).await.unwrap();
        assert_eq!(notifier.last_text(), UNKNOWN_COMMAND);
        assert_eq!(notifier.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_plain_text_gets_no_reply() {
        let (mut dispatcher, notifier, _) = setup().await;

        dispatcher.handle_command(&command(1, "Foo")).await.unwrap();
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_failed_reply_is_reported() {
        let (mut dispatcher, notifier, _) = setup().await;
        notifier.fail.store(true, Ordering::SeqCst);

        let result = dispatcher.handle_command(&command(1, "/help")).await;
        assert!(matches!(result, Err(CoreError::Send(_))));
    }

    #[tokio::test]
    async fn test_run_drains_both_channels() {
        let (mut dispatcher, notifier, _) = setup().await;
        dispatcher.handle_command(&command(1, "/vendor")).await.unwrap();
        notifier.clear();

        let (post_tx, post_rx) = mpsc::channel(4);
        let (command_tx, command_rx) = mpsc::channel(4);
        post_tx.send(post("[Vendor] Restock", "")).await.unwrap();
        post_tx.send(post("Not a trade post", "")).await.unwrap();
        command_tx.send(command(1, "/help")).await.unwrap();
        drop(post_tx);
        drop(command_tx);

        dispatcher.run(post_rx, command_rx).await.unwrap();

        let messages = notifier.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|(_, text)| text.contains("(matched vendor *)")));
        assert!(messages.iter().any(|(_, text)| text.starts_with("Hi, I'm")));
    }
}
