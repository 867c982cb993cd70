//! Selector contracts for the origin site's listing pages.
//!
//! The contracts are deliberately brittle: a missing or malformed required
//! field anywhere on a page means the markup has drifted and the whole page
//! fails, rather than silently indexing partial entries.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::errors::AppError;

static VIDEO_ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ul.vd-list li").expect("valid selector"));
static VIDEO_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.title").expect("valid selector"));
static VIDEO_IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("a img").expect("valid selector"));

static FOLLOW_ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ul.attention-list li").expect("valid selector"));
static FOLLOW_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.name").expect("valid selector"));
static PAGE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.pagination a").expect("valid selector"));

/// One listing item: title anchor with an `av<digits>` href plus a thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: i64,
    pub title: String,
    pub image: String,
}

/// One page of an account's follow list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowPage {
    /// Page count as rendered by the pagination control; 0 when the control
    /// has not rendered at all.
    pub page_count: u32,
    pub uids: Vec<i64>,
}

/// Parses a video-list or hot-list page into per-entry results.
///
/// Entries are parsed independently so callers can persist the entries that
/// precede a malformed one before aborting on it.
pub fn parse_video_entries(html: &str, url: &str) -> Vec<Result<Entry, AppError>> {
    let document = Html::parse_document(html);
    document
        .select(&VIDEO_ITEM)
        .enumerate()
        .map(|(index, item)| parse_video_entry(item, url, index))
        .collect()
}

fn parse_video_entry(item: ElementRef, url: &str, index: usize) -> Result<Entry, AppError> {
    let title_link = item
        .select(&VIDEO_TITLE)
        .next()
        .ok_or_else(|| invalid_entry(url, index))?;

    let title = title_link.text().collect::<String>().trim().to_string();
    if title.is_empty() {
        return Err(invalid_entry(url, index));
    }

    let href = title_link
        .value()
        .attr("href")
        .ok_or_else(|| invalid_entry(url, index))?;
    let id = video_id_from_href(href).ok_or_else(|| invalid_entry(url, index))?;

    let image = item
        .select(&VIDEO_IMAGE)
        .next()
        .and_then(|img| img.value().attr("src"))
        .ok_or_else(|| invalid_entry(url, index))?;

    Ok(Entry {
        id,
        title,
        image: image.to_string(),
    })
}

/// Parses one follow-list page: the rendered page count and the uids of every
/// listed account, in document order.
pub fn parse_follow_page(html: &str, url: &str) -> Result<FollowPage, AppError> {
    let document = Html::parse_document(html);

    let mut uids = Vec::new();
    for (index, item) in document.select(&FOLLOW_ITEM).enumerate() {
        let href = item
            .select(&FOLLOW_LINK)
            .next()
            .and_then(|link| link.value().attr("href"))
            .ok_or_else(|| invalid_entry(url, index))?;
        let uid = uid_from_profile_href(href).ok_or_else(|| invalid_entry(url, index))?;
        uids.push(uid);
    }

    let page_count = document
        .select(&PAGE_LINK)
        .filter_map(|link| link.text().collect::<String>().trim().parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    Ok(FollowPage { page_count, uids })
}

/// Extracts the numeric video id from the `av<digits>` token of an href.
fn video_id_from_href(href: &str) -> Option<i64> {
    let start = href.rfind("av")? + 2;
    let rest = &href[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    rest[..end].parse().ok()
}

/// The uid is the last path segment of a profile link.
fn uid_from_profile_href(href: &str) -> Option<i64> {
    href.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

fn invalid_entry(url: &str, index: usize) -> AppError {
    AppError::PageStructure(format!("invalid entry in {} # {}", url, index))
}
