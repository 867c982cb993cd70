//! In-memory stand-ins for the network and the store, shared by the crawler
//! tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::crawler::fetch::PageSource;
use crate::errors::AppError;
use crate::store::{InsertOutcome, NewVideo, VideoStore};

/// Canned pages keyed by URL. A URL may carry a sequence of bodies served one
/// per request, with the last body repeating; fetching an unregistered URL
/// fails, which doubles as proof that a crawler never asked for it.
#[derive(Clone, Default)]
pub struct FakePages {
    inner: Arc<FakePagesInner>,
}

#[derive(Default)]
struct FakePagesInner {
    pages: Mutex<HashMap<String, Vec<String>>>,
    served: Mutex<HashMap<String, usize>>,
    log: Mutex<Vec<String>>,
}

impl FakePages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, body: &str) -> Self {
        self.with_sequence(url, &[body])
    }

    pub fn with_sequence<S: AsRef<str>>(self, url: &str, bodies: &[S]) -> Self {
        self.inner.pages.lock().unwrap().insert(
            url.to_string(),
            bodies.iter().map(|b| b.as_ref().to_string()).collect(),
        );
        self
    }

    /// Total number of fetches served so far.
    pub fn requests(&self) -> usize {
        self.inner.log.lock().unwrap().len()
    }

    /// Every fetched URL, in request order.
    pub fn requested(&self) -> Vec<String> {
        self.inner.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for FakePages {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.inner.log.lock().unwrap().push(url.to_string());

        let pages = self.inner.pages.lock().unwrap();
        let bodies = pages
            .get(url)
            .ok_or_else(|| AppError::NotFound(format!("no canned page for {}", url)))?;

        let mut served = self.inner.served.lock().unwrap();
        let position = served.entry(url.to_string()).or_insert(0);
        let body = bodies
            .get(*position)
            .or_else(|| bodies.last())
            .expect("registered URL has at least one body")
            .clone();
        *position += 1;
        Ok(body)
    }
}

/// Store backed by a map, reporting duplicates exactly like the SQL store.
#[derive(Clone, Default)]
pub struct MemStore {
    rows: Arc<Mutex<HashMap<i64, NewVideo>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already contains rows for `ids`, as if discovered by an
    /// earlier cycle.
    pub fn preloaded(ids: &[i64]) -> Self {
        let store = Self::new();
        {
            let mut rows = store.rows.lock().unwrap();
            for &id in ids {
                rows.insert(
                    id,
                    NewVideo {
                        id,
                        title: "already indexed".to_string(),
                        image: "already indexed".to_string(),
                        uid: None,
                    },
                );
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn get(&self, id: i64) -> Option<NewVideo> {
        self.rows.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl VideoStore for MemStore {
    async fn insert(&self, video: &NewVideo) -> Result<InsertOutcome, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&video.id) {
            return Ok(InsertOutcome::Duplicate);
        }
        rows.insert(video.id, video.clone());
        Ok(InsertOutcome::Inserted)
    }
}

/// Builds one video-list page holding an entry per id.
pub fn video_page_html(ids: &[i64]) -> String {
    let mut html = String::from(r#"<ul class="vd-list">"#);
    for id in ids {
        html.push_str(&format!(
            r#"<li>
                <a class="title" href="/video/av{0}/">video {0}</a>
                <a href="/video/av{0}/"><img src="http://img.example/{0}.jpg"></a>
            </li>"#,
            id
        ));
    }
    html.push_str("</ul>");
    html
}

#[tokio::test]
async fn inserting_the_same_id_twice_keeps_one_row() {
    let store = MemStore::new();
    let video = NewVideo {
        id: 42,
        title: "first".to_string(),
        image: "first.jpg".to_string(),
        uid: Some(7),
    };
    let reinsert = NewVideo {
        title: "second".to_string(),
        ..video.clone()
    };

    assert_eq!(store.insert(&video).await.unwrap(), InsertOutcome::Inserted);
    assert_eq!(
        store.insert(&reinsert).await.unwrap(),
        InsertOutcome::Duplicate
    );

    // First-discovered metadata wins.
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(42).unwrap().title, "first");
}
