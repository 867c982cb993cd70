mod crawler;
mod db;
mod errors;
mod routes;
mod store;

use std::time::Duration;

use axum::routing::get;
use axum::Router;
use axum_prometheus::PrometheusMetricLayer;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::crawler::fetch::HttpFetcher;
use crate::crawler::CrawlConfig;
use crate::db::init_db;
use crate::routes::{go, health_check, mark, newest, recently};
use crate::store::PgStore;

const DEFAULT_SEED_UID: i64 = 19415;
const DEFAULT_CRAWL_INTERVAL_SECS: u64 = 300;

#[derive(Clone)]
struct InnerState {
    pub db: PgPool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bilifeed=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = init_db().await?;

    let config = CrawlConfig {
        seed_uid: env_or("SEED_UID", DEFAULT_SEED_UID)?,
        interval: Duration::from_secs(env_or(
            "CRAWL_INTERVAL_SECS",
            DEFAULT_CRAWL_INTERVAL_SECS,
        )?),
    };
    let fetcher = HttpFetcher::new()?;
    tokio::spawn(crawler::run(fetcher, PgStore::new(db.clone()), config));

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let web_root = std::env::var("WEB_ROOT").unwrap_or_else(|_| "./web".to_string());
    tracing::debug!("web root {}", web_root);

    let app_state = InnerState { db };

    let app = Router::new()
        .route("/newest.json", get(newest))
        .route("/recently.json", get(recently))
        .route("/latest.json", get(recently))
        .route("/go", get(go))
        .route("/mark", get(mark))
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .route("/health", get(health_check))
        .fallback_service(ServeDir::new(web_root))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer)
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:19870")
        .await
        .expect("Could not initialize TcpListener");

    tracing::debug!(
        "listening on {}",
        listener
            .local_addr()
            .expect("Could not convert listener address to local address")
    );

    axum::serve(listener, app)
        .await
        .expect("Could not successfully connect");

    Ok(())
}

fn env_or<T>(name: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|e| format!("invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}
