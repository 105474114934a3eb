use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::aggregate::{AggregateInput, Aggregator};
use crate::config::apps::{AppProfile, ReviewsConfig};
use crate::report::{Dashboard, DASHBOARD_RECENT, MAX_CSV_UPLOAD_BYTES};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub config: Arc<ReviewsConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/apps", get(list_apps))
        .route("/reviews", post(reviews))
        .route("/apps/{key}/reviews", post(app_reviews))
        .layer(DefaultBodyLimit::max(MAX_CSV_UPLOAD_BYTES))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize, Default)]
struct ReviewsQuery {
    #[serde(default)]
    app_id: Option<String>,
    #[serde(default)]
    country: Option<String>,
    // how many entries go into `recent`
    #[serde(default)]
    recent: Option<usize>,
}

async fn list_apps(State(state): State<AppState>) -> Json<Vec<AppProfile>> {
    Json(state.config.apps.clone())
}

/// Body is the raw Google Play CSV export; an empty body means "no Google source".
async fn reviews(
    State(state): State<AppState>,
    Query(q): Query<ReviewsQuery>,
    body: Bytes,
) -> Json<Dashboard> {
    Json(run(&state, q.app_id, q.country, q.recent, body).await)
}

async fn app_reviews(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(q): Query<ReviewsQuery>,
    body: Bytes,
) -> Result<Json<Dashboard>, (StatusCode, String)> {
    let Some(app) = state.config.app(&key) else {
        return Err((StatusCode::NOT_FOUND, format!("unknown app '{key}'")));
    };
    let app_id = Some(app.apple_id.clone());
    Ok(Json(run(&state, app_id, q.country, q.recent, body).await))
}

async fn run(
    state: &AppState,
    app_id: Option<String>,
    country: Option<String>,
    recent: Option<usize>,
    body: Bytes,
) -> Dashboard {
    let input = AggregateInput {
        app_id,
        country,
        google_csv: (!body.is_empty()).then(|| body.to_vec()),
    };
    let report = state.aggregator.run(&input).await;
    Dashboard::from_report(report, recent.unwrap_or(DASHBOARD_RECENT))
}
