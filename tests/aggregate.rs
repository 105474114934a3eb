// tests/aggregate.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use app_review_insights::analyze::{MockGenerator, Synthesizer};
use app_review_insights::config::apps::AppleSettings;
use app_review_insights::ingest::types::ReviewProvider;
use app_review_insights::report::{recent, sort_newest_first};
use app_review_insights::{aggregate, AggregateInput, Aggregator, Review, Source, Verdict};
use chrono::{TimeZone, Utc};

const REPLY: &str = r#"{"sentiment":"ok","top_positive":["a"],"top_negative":[],"advice":["do x"],"verdict":"POSITIVE"}"#;

struct Fixed {
    source: Source,
    reviews: Vec<Review>,
    calls: AtomicUsize,
}

impl Fixed {
    fn new(source: Source, days: &[u32]) -> Self {
        let reviews = days
            .iter()
            .map(|d| {
                Review::new(
                    source,
                    "someone",
                    4.0,
                    format!("{source} day {d}"),
                    Utc.with_ymd_and_hms(2024, 3, *d, 12, 0, 0).unwrap(),
                )
            })
            .collect();
        Self {
            source,
            reviews,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReviewProvider for Fixed {
    async fn fetch_reviews(&self) -> Result<Vec<Review>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reviews.clone())
    }
    fn source(&self) -> Source {
        self.source
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
}

struct Broken;

#[async_trait]
impl ReviewProvider for Broken {
    async fn fetch_reviews(&self) -> Result<Vec<Review>> {
        Err(anyhow!("connection reset"))
    }
    fn source(&self) -> Source {
        Source::Apple
    }
    fn name(&self) -> &'static str {
        "broken"
    }
}

fn synth(mock: &Arc<MockGenerator>) -> Synthesizer {
    Synthesizer::new(Some(mock.clone()), "German")
}

#[tokio::test]
async fn concatenates_sources_and_summarizes_each_group() {
    let apple = Fixed::new(Source::Apple, &[3, 1]);
    let google = Fixed::new(Source::Google, &[2]);
    let mock = Arc::new(MockGenerator::replying(REPLY));

    let report = aggregate(Some(&apple), Some(&google), &synth(&mock)).await;

    assert_eq!(report.reviews.len(), 3);
    // within-source order preserved, apple block first
    let order: Vec<&str> = report.reviews.iter().map(|r| r.content()).collect();
    assert_eq!(order, vec!["apple day 3", "apple day 1", "google day 2"]);
    assert_eq!(report.reviews_from(Source::Google).count(), 1);

    // one synthesis per non-empty source group, never a combined one
    let prompts = mock.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts.iter().any(|p| p.contains("[apple]") && !p.contains("[google]")));
    assert!(prompts.iter().any(|p| p.contains("[google]") && !p.contains("[apple]")));

    assert_eq!(report.insights.len(), 2);
    assert_eq!(report.insights[&Source::Apple].verdict, Verdict::Positive);
    assert_eq!(apple.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn absent_inputs_are_not_fetched() {
    let mock = Arc::new(MockGenerator::replying(REPLY));
    let google = Fixed::new(Source::Google, &[5]);

    let report = aggregate(None, Some(&google), &synth(&mock)).await;
    assert_eq!(report.reviews.len(), 1);
    assert_eq!(report.insights.keys().copied().collect::<Vec<_>>(), vec![Source::Google]);

    let report = aggregate(None, None, &synth(&mock)).await;
    assert!(report.reviews.is_empty());
    assert!(report.insights.is_empty());
}

#[tokio::test]
async fn failing_adapter_yields_partial_result() {
    let mock = Arc::new(MockGenerator::replying(REPLY));
    let google = Fixed::new(Source::Google, &[5, 6]);

    let report = aggregate(Some(&Broken), Some(&google), &synth(&mock)).await;
    assert_eq!(report.reviews.len(), 2);
    assert!(report.insights.get(&Source::Apple).is_none());
    assert!(report.insights.contains_key(&Source::Google));
}

#[tokio::test]
async fn no_credential_means_no_insights() {
    let apple = Fixed::new(Source::Apple, &[1]);
    let report = aggregate(Some(&apple), None, &Synthesizer::new(None, "German")).await;
    assert_eq!(report.reviews.len(), 1);
    assert!(report.insights.is_empty());
}

#[tokio::test]
async fn report_serializes_to_reviews_and_insights() {
    let apple = Fixed::new(Source::Apple, &[1]);
    let mock = Arc::new(MockGenerator::replying(REPLY));
    let report = aggregate(Some(&apple), None, &synth(&mock)).await;

    let v = serde_json::to_value(&report).unwrap();
    assert_eq!(v["reviews"][0]["source"], "apple");
    assert_eq!(v["insights"]["apple"]["verdict"], "POSITIVE");
    assert!(v["insights"].get("google").is_none());
}

#[tokio::test]
async fn sorting_is_a_separate_caller_step() {
    let apple = Fixed::new(Source::Apple, &[1, 9]);
    let google = Fixed::new(Source::Google, &[5]);
    let report = aggregate(Some(&apple), Some(&google), &Synthesizer::new(None, "German")).await;

    // orchestrator output is source-blocked, not date-sorted
    assert_eq!(report.reviews[0].content(), "apple day 1");

    let mut sorted = report.reviews.clone();
    sort_newest_first(&mut sorted);
    let days: Vec<&str> = sorted.iter().map(|r| r.content()).collect();
    assert_eq!(days, vec!["apple day 9", "google day 5", "apple day 1"]);
    assert_eq!(recent(&report.reviews, 1)[0].content(), "apple day 9");
}

#[tokio::test]
async fn aggregator_runs_google_csv_without_app_id() {
    let mock = Arc::new(MockGenerator::replying(REPLY));
    let agg = Aggregator::new(reqwest::Client::new(), AppleSettings::default(), synth(&mock));

    let input = AggregateInput {
        app_id: Some("   ".into()),
        country: None,
        google_csv: Some(b"Star Rating,Review Text\n5,Love it\n1,Hate it\n".to_vec()),
    };
    let report = agg.run(&input).await;

    assert_eq!(report.reviews.len(), 2);
    assert!(report.reviews.iter().all(|r| r.source() == Source::Google));
    assert_eq!(report.insights.len(), 1);
    assert_eq!(mock.prompts().len(), 1);

    let empty = agg.run(&AggregateInput::default()).await;
    assert!(empty.reviews.is_empty() && empty.insights.is_empty());
}
