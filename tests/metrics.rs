// tests/metrics.rs
// Own test binary: installs the process-wide Prometheus recorder once.

use app_review_insights::ingest::providers::apple_feed::AppleFeedProvider;
use app_review_insights::ingest::providers::google_csv::parse_google_csv;
use app_review_insights::ingest::types::ReviewProvider;
use app_review_insights::metrics::Metrics;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use tower::ServiceExt as _;

#[tokio::test]
async fn ingest_series_show_up_on_metrics_route() {
    let metrics = Metrics::init().expect("recorder");

    let out = parse_google_csv(b"Star Rating,Review Text\n5,fine\n");
    assert_eq!(out.len(), 1);
    let broken = AppleFeedProvider::from_fixture("not json");
    assert!(broken.fetch_or_empty().await.is_empty());

    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let resp = metrics.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = String::from_utf8(
        body::to_bytes(resp.into_body(), 1 << 20)
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap();

    assert!(text.contains("reviews_ingested_total"));
    assert!(text.contains(r#"source="google""#));
    assert!(text.contains("review_provider_errors_total"));
    assert!(text.contains("ingest_parse_ms"));
}
