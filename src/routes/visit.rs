use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::InnerState;

#[derive(Deserialize)]
pub struct VisitParams {
    id: i64,
}

/// Records a click and bounces the visitor to the origin site's canonical
/// video page. Unknown ids still redirect; the origin serves its own 404.
pub async fn go(
    State(inner): State<InnerState>,
    Query(params): Query<VisitParams>,
) -> Result<Response, AppError> {
    let InnerState { db } = inner;

    record_visit(&db, params.id).await?;

    Response::builder()
        .status(StatusCode::TEMPORARY_REDIRECT)
        .header(
            "Location",
            format!("http://www.bilibili.com/video/av{}/", params.id),
        )
        .body(Body::empty())
        .map_err(|e| {
            AppError::Unexpected(anyhow::Error::new(e).context("Failed to build redirect response"))
        })
}

/// Same click accounting as `go`, without the redirect.
pub async fn mark(
    State(inner): State<InnerState>,
    Query(params): Query<VisitParams>,
) -> Result<Json<Value>, AppError> {
    let InnerState { db } = inner;

    record_visit(&db, params.id).await?;

    Ok(Json(json!({ "ok": true })))
}

async fn record_visit(db: &PgPool, id: i64) -> Result<(), AppError> {
    let update_timeout = tokio::time::Duration::from_millis(10000);

    tokio::time::timeout(
        update_timeout,
        sqlx::query(r#"UPDATE video SET view = view + 1, last_visit = $1 WHERE id = $2"#)
            .bind(Utc::now())
            .bind(id)
            .execute(db),
    )
    .await??;

    Ok(())
}
