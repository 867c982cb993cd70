use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::FromRow;

use crate::errors::AppError;
use crate::InnerState;

#[derive(Serialize, FromRow)]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub image: String,
}

/// Videos nobody has clicked yet, newest first.
pub async fn newest(State(inner): State<InnerState>) -> Result<Json<Vec<Video>>, AppError> {
    let fetch_feed_timeout = tokio::time::Duration::from_millis(10000);
    let InnerState { db } = inner;

    let videos = tokio::time::timeout(
        fetch_feed_timeout,
        sqlx::query_as::<_, Video>(
            r#"SELECT id, title, image FROM video
               WHERE view < 1
               ORDER BY id DESC, added DESC LIMIT 50"#,
        )
        .fetch_all(&db),
    )
    .await??;

    Ok(Json(videos))
}

/// Videos with a recorded visit, most recently visited first.
pub async fn recently(State(inner): State<InnerState>) -> Result<Json<Vec<Video>>, AppError> {
    let fetch_feed_timeout = tokio::time::Duration::from_millis(10000);
    let InnerState { db } = inner;

    let videos = tokio::time::timeout(
        fetch_feed_timeout,
        sqlx::query_as::<_, Video>(
            r#"SELECT id, title, image FROM video
               WHERE last_visit IS NOT NULL
               ORDER BY last_visit DESC LIMIT 20"#,
        )
        .fetch_all(&db),
    )
    .await??;

    Ok(Json(videos))
}
