// src/ingest/types.rs
use anyhow::Result;
use metrics::counter;

use crate::review::{Review, Source};

/// One storefront's reviews for one app.
///
/// `fetch_reviews` reports transport/format failures as errors; callers that must
/// not fail go through `fetch_or_empty`, which logs and swallows them.
#[async_trait::async_trait]
pub trait ReviewProvider: Send + Sync {
    async fn fetch_reviews(&self) -> Result<Vec<Review>>;

    fn source(&self) -> Source;

    fn name(&self) -> &'static str;

    async fn fetch_or_empty(&self) -> Vec<Review> {
        match self.fetch_reviews().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = ?e, provider = self.name(), "provider error");
                counter!("review_provider_errors_total", "source" => self.source().as_str())
                    .increment(1);
                Vec::new()
            }
        }
    }
}
