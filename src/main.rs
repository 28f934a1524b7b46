use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use database::{BlobStore, Database, FileBlobStore};
use reddit_client::{PostScanner, RedditClient, RedditCredentials};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use telegram_client::{TelegramClient, UpdatePoller};
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing_subscriber::EnvFilter;
use watcher_core::{AppConfig, CoreError, StorageBackend, StorageConfig};
use watcher_service::Dispatcher;

const DEFAULT_LOG_FILTER: &str =
    "mechwatch=info,watcher_service=info,reddit_client=info,telegram_client=info,database=info,watcher_core=info";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StorageArg {
    File,
    Sqlite,
}

impl From<StorageArg> for StorageBackend {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::File => StorageBackend::File,
            StorageArg::Sqlite => StorageBackend::Sqlite,
        }
    }
}

/// Watches r/mechmarket and sends Telegram notifications for watched keywords.
#[derive(Parser, Debug)]
#[command(name = "mechwatch", version)]
struct Args {
    /// TOML configuration file
    #[arg(long, short, env = "MECHWATCH_CONFIG", default_value = "mechwatch.toml")]
    config: PathBuf,

    /// Telegram bot token, overrides `telegram.token`
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Where subscriptions and stats are kept, overrides `storage.path`
    #[arg(long, env = "MECHWATCH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Storage backend, overrides `storage.backend`
    #[arg(long, value_enum)]
    storage: Option<StorageArg>,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(token) = &self.token {
            config.telegram.token = token.clone();
        }
        if let Some(data_dir) = &self.data_dir {
            config.storage.path = data_dir.clone();
        }
        if let Some(storage) = self.storage {
            config.storage.backend = storage.into();
        }
    }
}

fn sqlite_path(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.join("mechwatch.db")
    }
}

async fn open_storage(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::File => {
            tracing::info!("Using file storage in {}", config.path.display());
            Ok(Arc::new(FileBlobStore::new(config.path.clone())))
        }
        StorageBackend::Sqlite => {
            let db_path = sqlite_path(&config.path);
            if let Some(parent) = db_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            tracing::info!("Using SQLite storage at {}", db_path.display());

            let mut db = Database::new(format!("sqlite://{}", db_path.display()));
            db.connect().await.context("connecting to SQLite")?;
            db.run_migrations().await.context("running migrations")?;
            Ok(Arc::new(db))
        }
    }
}

/// Any producer exit ends the bot: a fatal error becomes the process error,
/// a clean return means its channel closed underneath it.
fn producer_outcome(name: &str, joined: Result<Result<(), CoreError>, JoinError>) -> Result<()> {
    match joined {
        Ok(Ok(())) => {
            tracing::warn!("{} stopped", name);
            Ok(())
        }
        Ok(Err(e)) => Err(e).with_context(|| format!("{} stopped", name)),
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => Err(e).with_context(|| format!("{} panicked", name)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let mut config = AppConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    tracing::info!(
        "Starting mechwatch {} for r/{} (bot token {})",
        env!("CARGO_PKG_VERSION"),
        config.reddit.subreddit,
        config.telegram.masked_token()
    );

    let blobs = open_storage(&config.storage).await?;

    let telegram = TelegramClient::new(&config.telegram).context("building Telegram client")?;
    let me = telegram.get_me().await.context("verifying Telegram bot token")?;
    tracing::info!(
        "Connected to Telegram as @{}",
        me.username.as_deref().unwrap_or(&me.first_name)
    );

    let credentials = match (&config.reddit.client_id, &config.reddit.client_secret) {
        (Some(client_id), Some(client_secret)) => Some(RedditCredentials {
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
        }),
        _ => None,
    };
    let reddit = RedditClient::new(config.reddit.user_agent.clone(), credentials)
        .context("building Reddit client")?;

    let (post_tx, post_rx) = mpsc::channel(config.dispatch.channel_capacity);
    let (command_tx, command_rx) = mpsc::channel(config.dispatch.channel_capacity);

    let scanner = PostScanner::new(reddit, &config.reddit);
    let mut scanner_task = tokio::spawn(scanner.run(post_tx));

    let poller = UpdatePoller::new(telegram.clone(), config.telegram.poll_timeout_secs);
    let mut poller_task = tokio::spawn(poller.run(command_tx));

    let dispatcher = Dispatcher::load(telegram, blobs).await;

    let mut scanner_done = false;
    let mut poller_done = false;
    let outcome = tokio::select! {
        result = dispatcher.run(post_rx, command_rx) => result.context("dispatcher stopped"),
        joined = &mut scanner_task => {
            scanner_done = true;
            producer_outcome("Reddit scanner", joined)
        }
        joined = &mut poller_task => {
            poller_done = true;
            producer_outcome("Telegram poller", joined)
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down");
            Ok(())
        }
    };

    for (name, task, done) in [
        ("Reddit scanner", scanner_task, scanner_done),
        ("Telegram poller", poller_task, poller_done),
    ] {
        if done {
            continue;
        }
        task.abort();
        if let Err(e) = producer_outcome(name, task.await) {
            tracing::error!("{:#}", e);
        }
    }

    outcome?;
    tracing::info!("mechwatch stopped");
    Ok(())
}
