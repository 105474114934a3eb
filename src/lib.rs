// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod aggregate;
pub mod analyze;
pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod report;
pub mod review;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{aggregate, AggregateInput, AggregateReport, Aggregator};
pub use crate::api::router;
pub use crate::review::{Insight, Review, Source, Verdict};

use std::time::Duration;

use crate::analyze::Synthesizer;
use crate::config::ai::AiConfig;
use crate::config::apps::ReviewsConfig;

/// HTTP client shared by the Apple adapters.
pub fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent("app-review-insights/0.1")
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

/// Wire an [`Aggregator`] from loaded configuration.
pub fn build_aggregator(ai: &AiConfig, reviews: &ReviewsConfig) -> anyhow::Result<Aggregator> {
    let synthesizer = Synthesizer::from_config(ai)?;
    Ok(Aggregator::new(
        http_client()?,
        reviews.apple.clone(),
        synthesizer,
    ))
}
