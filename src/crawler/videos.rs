use tracing::debug;

use crate::crawler::fetch::PageSource;
use crate::crawler::parse::parse_video_entries;
use crate::errors::AppError;
use crate::store::{InsertOutcome, NewVideo, VideoStore};

/// Cumulative already-seen entries tolerated per user before the crawl
/// assumes the rest of the back catalog is already indexed.
const DUPLICATE_BUDGET: u32 = 50;

fn video_list_url(uid: i64, page: u32) -> String {
    format!("http://space.bilibili.com/{}/video?page={}", uid, page)
}

/// Walks one user's video list in page order, inserting every entry.
///
/// Stops on the first empty page (the end of the user's pagination; never
/// retried) or once the duplicate budget is exceeded. Entries are inserted as
/// they parse, so a malformed entry aborts the cycle with the entries before
/// it already persisted.
pub async fn crawl_user<F: PageSource, S: VideoStore>(
    fetcher: &F,
    store: &S,
    uid: i64,
) -> Result<(), AppError> {
    let mut page = 1u32;
    let mut duplicates = 0u32;

    loop {
        let url = video_list_url(uid, page);
        let html = fetcher.fetch(&url).await?;
        let entries = parse_video_entries(&html, &url);
        if entries.is_empty() {
            break;
        }

        for entry in entries {
            let entry = entry?;
            let outcome = store
                .insert(&NewVideo {
                    id: entry.id,
                    title: entry.title,
                    image: entry.image,
                    uid: Some(uid),
                })
                .await?;
            if outcome == InsertOutcome::Duplicate {
                duplicates += 1;
            }
        }

        if duplicates > DUPLICATE_BUDGET {
            debug!(uid, duplicates, "back catalog already indexed, stopping");
            break;
        }
        page += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::{video_page_html, FakePages, MemStore};

    #[tokio::test]
    async fn crawls_until_the_first_empty_page() {
        let page1: Vec<i64> = (1..=20).collect();
        let page2: Vec<i64> = (21..=35).collect();
        let pages = FakePages::new()
            .with(&video_list_url(7, 1), &video_page_html(&page1))
            .with(&video_list_url(7, 2), &video_page_html(&page2))
            .with(&video_list_url(7, 3), &video_page_html(&[]));
        let store = MemStore::new();

        crawl_user(&pages, &store, 7).await.unwrap();

        assert_eq!(store.len(), 35);
        assert_eq!(pages.requests(), 3);
    }

    #[tokio::test]
    async fn stops_once_duplicates_exceed_the_budget() {
        let page1: Vec<i64> = (1..=10).collect();
        let page2: Vec<i64> = (11..=55).collect();
        let known: Vec<i64> = (1..=55).collect();

        // Page 1 contributes 10 duplicates, page 2 another 45; 55 > 50, so
        // page 3 must never be requested even though page 2 was non-empty.
        let pages = FakePages::new()
            .with(&video_list_url(7, 1), &video_page_html(&page1))
            .with(&video_list_url(7, 2), &video_page_html(&page2));
        let store = MemStore::preloaded(&known);

        crawl_user(&pages, &store, 7).await.unwrap();

        assert_eq!(pages.requests(), 2);
        assert_eq!(store.len(), 55);
    }

    #[tokio::test]
    async fn a_budget_not_yet_exceeded_keeps_crawling() {
        let page1: Vec<i64> = (1..=50).collect();
        let pages = FakePages::new()
            .with(&video_list_url(7, 1), &video_page_html(&page1))
            .with(&video_list_url(7, 2), &video_page_html(&[]));
        let store = MemStore::preloaded(&page1);

        // Exactly 50 duplicates is within budget; the crawl proceeds to the
        // empty page 2 and ends normally.
        crawl_user(&pages, &store, 7).await.unwrap();

        assert_eq!(pages.requests(), 2);
    }

    #[tokio::test]
    async fn tags_inserted_videos_with_the_owning_uid() {
        let pages = FakePages::new()
            .with(&video_list_url(7, 1), &video_page_html(&[100]))
            .with(&video_list_url(7, 2), &video_page_html(&[]));
        let store = MemStore::new();

        crawl_user(&pages, &store, 7).await.unwrap();

        assert_eq!(store.get(100).unwrap().uid, Some(7));
    }

    #[tokio::test]
    async fn malformed_entry_aborts_after_persisting_the_entries_before_it() {
        let html = r#"
            <ul class="vd-list">
                <li>
                    <a class="title" href="/video/av1/">One</a>
                    <a href="/video/av1/"><img src="http://img.example/1.jpg"></a>
                </li>
                <li>
                    <a class="title" href="/video/av2/">Two</a>
                </li>
                <li>
                    <a class="title" href="/video/av3/">Three</a>
                    <a href="/video/av3/"><img src="http://img.example/3.jpg"></a>
                </li>
            </ul>
        "#;
        let pages = FakePages::new().with(&video_list_url(7, 1), html);
        let store = MemStore::new();

        let err = crawl_user(&pages, &store, 7).await.unwrap_err();

        assert!(matches!(err, AppError::PageStructure(_)));
        assert!(store.get(1).is_some());
        assert!(store.get(2).is_none());
        assert!(store.get(3).is_none());
    }
}
