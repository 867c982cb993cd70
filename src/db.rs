use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connects to PostgreSQL and bootstraps the `video` table.
///
/// `view` and `last_visit` are owned by the serving surface; the crawl task
/// only ever inserts new rows.
pub async fn init_db() -> Result<PgPool, anyhow::Error> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("Could not connect to the database")?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS video (
            id         BIGINT PRIMARY KEY,
            title      TEXT NOT NULL,
            view       BIGINT NOT NULL DEFAULT 0,
            last_visit TIMESTAMPTZ,
            image      TEXT NOT NULL,
            added      TIMESTAMPTZ NOT NULL,
            uid        BIGINT
        )"#,
    )
    .execute(&db)
    .await
    .context("Could not create the video table")?;

    Ok(db)
}
