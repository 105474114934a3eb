//! Review Insights Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and metrics.

use std::sync::Arc;

use app_review_insights::api::{self, AppState};
use app_review_insights::config::ai::AiConfig;
use app_review_insights::config::apps::load_reviews_config_default;
use app_review_insights::metrics::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - REVIEWS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("REVIEWS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("app_review_insights=info,warn"));

    // Shuttle may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let ai = AiConfig::load_default()?;
    let reviews = load_reviews_config_default()?;
    tracing::info!(
        apps = reviews.apps.len(),
        apple_mode = ?reviews.apple.mode,
        ai_enabled = ai.credential().is_some(),
        "review config loaded"
    );

    let aggregator = app_review_insights::build_aggregator(&ai, &reviews)?;
    let metrics = Metrics::init()?;

    let state = AppState {
        aggregator: Arc::new(aggregator),
        config: Arc::new(reviews),
    };
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
