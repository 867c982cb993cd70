//! The crawl engine: periodic discovery of followed accounts' uploads plus a
//! handful of curated hot lists, persisted idempotently.

pub mod fetch;
pub mod followers;
pub mod hot;
pub mod parse;
pub mod videos;

#[cfg(test)]
pub(crate) mod testing;

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{error, info};

use crate::crawler::fetch::PageSource;
use crate::errors::AppError;
use crate::store::VideoStore;

/// Crawl-side settings, read from the environment in `main` and passed in
/// explicitly.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Account whose follow list seeds the per-user crawls.
    pub seed_uid: i64,
    /// Pause between cycles, successful or not.
    pub interval: Duration,
}

/// Runs crawl cycles for the life of the process.
///
/// A fatal error aborts only the cycle that raised it: it is logged here and
/// the next cycle starts after the usual pause. There is no backoff and no
/// cap on consecutive failed cycles.
pub async fn run<F, S>(fetcher: F, store: S, config: CrawlConfig)
where
    F: PageSource,
    S: VideoStore,
{
    loop {
        let started = Instant::now();
        match run_cycle(&fetcher, &store, &config).await {
            Ok(()) => info!(elapsed = ?started.elapsed(), "crawl cycle finished"),
            Err(err) => error!(error = %err, "crawl cycle aborted"),
        }
        sleep(config.interval).await;
    }
}

/// One cycle: curated hot lists first, then every account followed by the
/// seed, strictly in sequence. The follow list is rediscovered each cycle,
/// so newly followed accounts are picked up without a restart.
async fn run_cycle<F, S>(fetcher: &F, store: &S, config: &CrawlConfig) -> Result<(), AppError>
where
    F: PageSource,
    S: VideoStore,
{
    hot::crawl_hot_lists(fetcher, store).await?;

    let uids = followers::discover_followers(fetcher, config.seed_uid).await?;
    for uid in uids {
        videos::crawl_user(fetcher, store, uid).await?;
    }
    Ok(())
}
