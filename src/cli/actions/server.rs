use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use url::Url;

use crate::api;
use crate::notifier::{LogNotifier, RetryPolicy};
use crate::registry::Waitlist;
use crate::store::{KeyValueStore, MemoryStore, RedbStore};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub store_path: String,
    pub ephemeral: bool,
    pub referral_base_url: Url,
    pub backoff_base: Duration,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the store cannot be opened or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let store: Arc<dyn KeyValueStore> = if args.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            RedbStore::open(&args.store_path)
                .with_context(|| format!("failed to open store at {}", args.store_path))?,
        )
    };

    let retry = RetryPolicy {
        max_attempts: 3,
        backoff_base: args.backoff_base,
    };
    let waitlist = Arc::new(
        Waitlist::new(store, Arc::new(LogNotifier), args.referral_base_url)
            .with_retry_policy(retry),
    );

    api::serve(args.port, waitlist).await
}

fn log_startup_args(args: &Args) {
    let store = if args.ephemeral {
        "memory".to_string()
    } else {
        args.store_path.clone()
    };
    info!(
        port = args.port,
        store,
        referral_base_url = %args.referral_base_url,
        backoff_base_secs = args.backoff_base.as_secs(),
        "starting waitlistd"
    );
}
