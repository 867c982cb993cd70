use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::errors::AppError;

/// A video discovered by a crawl, not yet persisted.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub id: i64,
    pub title: String,
    pub image: String,
    /// Owning account when discovered through a followed-user crawl,
    /// `None` for hot-list discoveries.
    pub uid: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

/// Idempotent keyed insert of video records.
///
/// A duplicate primary key is never an error; the `Duplicate` outcome is the
/// signal the user-video crawl uses to decide when a back catalog has already
/// been indexed. Every other persistence failure is fatal to the running cycle.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn insert(&self, video: &NewVideo) -> Result<InsertOutcome, AppError>;
}

pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VideoStore for PgStore {
    async fn insert(&self, video: &NewVideo) -> Result<InsertOutcome, AppError> {
        let result = sqlx::query(
            r#"INSERT INTO video (id, title, image, added, uid)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (id) DO NOTHING"#,
        )
        .bind(video.id)
        .bind(&video.title)
        .bind(&video.image)
        .bind(Utc::now())
        .bind(video.uid)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::Duplicate)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }
}
