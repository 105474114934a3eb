//! # Aggregation
//! Fan-in for one app: run the Apple and Google adapters side by side, concatenate
//! their reviews, and summarize each non-empty source group separately.
//!
//! Adapters already fail soft, so nothing here branches on adapter failure; only the
//! presence of inputs decides what runs. Sorting is left to the caller (see `report`).

use std::collections::BTreeMap;
use std::sync::Arc;

use metrics::counter;
use serde::Serialize;

use crate::analyze::Synthesizer;
use crate::config::apps::{AppleMode, AppleSettings};
use crate::ingest::providers::apple_connect::{AppleConnectProvider, StaticToken};
use crate::ingest::providers::apple_feed::AppleFeedProvider;
use crate::ingest::providers::google_csv::GoogleCsvProvider;
use crate::ingest::types::ReviewProvider;
use crate::review::{Insight, Review, Source};

/// What the caller has for one app.
#[derive(Debug, Clone, Default)]
pub struct AggregateInput {
    pub app_id: Option<String>,
    /// Storefront for the Apple feed; falls back to the configured default.
    pub country: Option<String>,
    pub google_csv: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub reviews: Vec<Review>,
    pub insights: BTreeMap<Source, Insight>,
}

impl AggregateReport {
    pub fn reviews_from(&self, source: Source) -> impl Iterator<Item = &Review> {
        self.reviews.iter().filter(move |r| r.source() == source)
    }
}

async fn fetch(provider: Option<&dyn ReviewProvider>) -> Vec<Review> {
    match provider {
        Some(p) => p.fetch_or_empty().await,
        None => Vec::new(),
    }
}

async fn summarize(
    synthesizer: &Synthesizer,
    source: Source,
    reviews: &[Review],
) -> Option<(Source, Insight)> {
    if reviews.is_empty() {
        return None;
    }
    counter!("insight_requests_total", "source" => source.as_str()).increment(1);
    Some((source, synthesizer.synthesize(reviews).await))
}

/// Core fan-in over whichever providers are present.
pub async fn aggregate(
    apple: Option<&dyn ReviewProvider>,
    google: Option<&dyn ReviewProvider>,
    synthesizer: &Synthesizer,
) -> AggregateReport {
    crate::ingest::ensure_metrics_described();

    let (apple_reviews, google_reviews) = tokio::join!(fetch(apple), fetch(google));
    tracing::info!(
        apple = apple_reviews.len(),
        google = google_reviews.len(),
        "reviews ingested"
    );

    let mut insights = BTreeMap::new();
    if synthesizer.is_configured() {
        let (a, g) = tokio::join!(
            summarize(synthesizer, Source::Apple, &apple_reviews),
            summarize(synthesizer, Source::Google, &google_reviews),
        );
        insights.extend(a);
        insights.extend(g);
    }

    let mut reviews = apple_reviews;
    reviews.extend(google_reviews);
    AggregateReport { reviews, insights }
}

/// App Store ids are numeric. Anything else is treated as no Apple input, so it
/// never reaches a request path.
fn apple_app_id(raw: &str) -> Option<&str> {
    let id = raw.trim();
    (!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())).then_some(id)
}

/// Builds providers from an [`AggregateInput`] and runs [`aggregate`].
pub struct Aggregator {
    http: reqwest::Client,
    apple: AppleSettings,
    synthesizer: Synthesizer,
}

impl Aggregator {
    pub fn new(http: reqwest::Client, apple: AppleSettings, synthesizer: Synthesizer) -> Self {
        Self {
            http,
            apple,
            synthesizer,
        }
    }

    fn apple_provider(&self, app_id: &str, country: Option<&str>) -> Box<dyn ReviewProvider> {
        match self.apple.mode {
            AppleMode::Feed => {
                let country = country
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .unwrap_or(&self.apple.country);
                Box::new(AppleFeedProvider::new(
                    self.http.clone(),
                    &self.apple.feed_base_url,
                    country,
                    app_id,
                ))
            }
            AppleMode::Connect => Box::new(AppleConnectProvider::new(
                self.http.clone(),
                &self.apple.connect_base_url,
                app_id,
                Arc::new(StaticToken(self.apple.connect_token.clone())),
            )),
        }
    }

    pub async fn run(&self, input: &AggregateInput) -> AggregateReport {
        let apple = input
            .app_id
            .as_deref()
            .and_then(apple_app_id)
            .map(|id| self.apple_provider(id, input.country.as_deref()));
        let google = input
            .google_csv
            .as_ref()
            .filter(|b| !b.is_empty())
            .map(|b| GoogleCsvProvider::from_bytes(b.clone()));

        aggregate(
            apple.as_deref(),
            google.as_ref().map(|g| g as &dyn ReviewProvider),
            &self.synthesizer,
        )
        .await
    }
}
