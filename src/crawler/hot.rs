use chrono::{Duration, NaiveDate, Utc};

use crate::crawler::fetch::PageSource;
use crate::crawler::parse::parse_video_entries;
use crate::errors::AppError;
use crate::store::{NewVideo, VideoStore};

const OFFICIAL_LIST_URL: &str =
    "http://www.bilibili.com/video/bagumi_offical_1.html#!order=hot&page=1";

/// Ranked category listings, scoped to a trailing 7-day window.
const RANKED_CATEGORIES: [u32; 5] = [29, 17, 37, 51, 98];

/// The curated listing URLs for a cycle starting on `today`.
pub(crate) fn hot_list_urls(today: NaiveDate) -> Vec<String> {
    let start = today - Duration::days(7);
    let range = format!(
        "{}~{}",
        start.format("%Y-%m-%d"),
        today.format("%Y-%m-%d")
    );

    let mut urls = vec![OFFICIAL_LIST_URL.to_string()];
    for category in RANKED_CATEGORIES {
        urls.push(format!(
            "http://www.bilibili.com/list/damku-{}-1-{}.html",
            category, range
        ));
    }
    urls
}

/// Scrapes the curated hot lists once each, without pagination. Entries carry
/// no owning uid, and duplicate outcomes are discarded: hot lists overlap
/// heavily from one cycle to the next.
pub async fn crawl_hot_lists<F: PageSource, S: VideoStore>(
    fetcher: &F,
    store: &S,
) -> Result<(), AppError> {
    let urls = hot_list_urls(Utc::now().date_naive());
    crawl_lists(fetcher, store, &urls).await
}

async fn crawl_lists<F: PageSource, S: VideoStore>(
    fetcher: &F,
    store: &S,
    urls: &[String],
) -> Result<(), AppError> {
    for url in urls {
        let html = fetcher.fetch(url).await?;
        for entry in parse_video_entries(&html, url) {
            let entry = entry?;
            store
                .insert(&NewVideo {
                    id: entry.id,
                    title: entry.title,
                    image: entry.image,
                    uid: None,
                })
                .await?;
        }
    }
    Ok(())
}
