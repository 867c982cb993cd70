use std::time::Duration;

use tracing::{info, warn};

use crate::crawler::fetch::{PageSource, RetryPolicy};
use crate::crawler::parse::{parse_follow_page, FollowPage};
use crate::errors::AppError;

/// An unrendered follow page is a transient origin failure: retry in place,
/// without bound, with no pause beyond the fetcher's own.
const EMPTY_RENDER_RETRY: RetryPolicy = RetryPolicy::unbounded(Duration::ZERO);

fn follow_url(account_id: i64, page: u32) -> String {
    format!(
        "http://space.bilibili.com/{}/follow?page={}",
        account_id, page
    )
}

/// Collects the uids followed by `account_id`, in page order.
///
/// The result is not deduplicated: an account rendered on two follow-list
/// pages shows up twice, and its videos get crawled twice that cycle.
pub async fn discover_followers<F: PageSource>(
    fetcher: &F,
    account_id: i64,
) -> Result<Vec<i64>, AppError> {
    let mut retries = 0u32;
    let page_count = loop {
        let url = follow_url(account_id, 1);
        let page = fetch_follow_page(fetcher, &url).await?;
        if page.page_count > 0 {
            break page.page_count;
        }
        warn!(account_id, "follow list rendered without a page count, retrying");
        EMPTY_RENDER_RETRY.backoff(&mut retries).await;
    };

    let mut uids = Vec::new();
    for page_no in 1..=page_count {
        let url = follow_url(account_id, page_no);
        loop {
            let page = fetch_follow_page(fetcher, &url).await?;
            if !page.uids.is_empty() {
                uids.extend(page.uids);
                break;
            }
            warn!(account_id, page = page_no, "follow page rendered empty, retrying");
            EMPTY_RENDER_RETRY.backoff(&mut retries).await;
        }
    }

    info!("following {} users", uids.len());
    Ok(uids)
}

async fn fetch_follow_page<F: PageSource>(fetcher: &F, url: &str) -> Result<FollowPage, AppError> {
    let html = fetcher.fetch(url).await?;
    parse_follow_page(&html, url)
}
