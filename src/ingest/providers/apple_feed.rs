// src/ingest/providers/apple_feed.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::types::ReviewProvider;
use crate::ingest::{parse_date_or_now, parse_rating, record_parsed};
use crate::review::{Review, Source};

pub const DEFAULT_FEED_BASE: &str = "https://itunes.apple.com";
pub const DEFAULT_COUNTRY: &str = "ch";
pub const APPLE_ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Deserialize)]
struct FeedDoc {
    feed: Option<Feed>,
}

#[derive(Debug, Deserialize)]
struct Feed {
    entry: Option<OneOrMany<Entry>>,
}

/// The feed unwraps `entry` when there is exactly one review.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(x) => vec![x],
        }
    }
}

#[derive(Debug, Deserialize)]
struct Label {
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<Label>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    author: Option<Author>,
    title: Option<Label>,
    content: Option<Label>,
    #[serde(rename = "im:rating")]
    rating: Option<Label>,
    updated: Option<Label>,
}

fn label(l: &Option<Label>) -> Option<&str> {
    l.as_ref()
        .and_then(|l| l.label.as_deref())
        .filter(|s| !s.is_empty())
}

impl Entry {
    fn into_review(self) -> Review {
        let author = self
            .author
            .as_ref()
            .and_then(|a| label(&a.name))
            .unwrap_or(APPLE_ANONYMOUS)
            .to_string();
        let body = label(&self.content).unwrap_or_default();
        let content = match label(&self.title) {
            Some(title) => format!("{title}\n{body}"),
            None => body.to_string(),
        };
        Review::new(
            Source::Apple,
            author,
            parse_rating(label(&self.rating).unwrap_or("0")),
            content,
            parse_date_or_now(label(&self.updated)),
        )
    }
}

/// Normalize an already-fetched feed document. A document without `feed` or
/// `feed.entry` is an empty result.
pub fn parse_feed_json(body: &str) -> Result<Vec<Review>> {
    let t0 = std::time::Instant::now();
    let doc: FeedDoc = serde_json::from_str(body).context("parsing apple review feed json")?;
    let entries = doc
        .feed
        .and_then(|f| f.entry)
        .map(OneOrMany::into_vec)
        .unwrap_or_default();
    let out: Vec<Review> = entries.into_iter().map(Entry::into_review).collect();
    record_parsed(Source::Apple, out.len(), t0);
    Ok(out)
}

pub fn feed_url(base: &str, country: &str, app_id: &str) -> String {
    format!(
        "{}/{}/rss/customerreviews/id={}/sortBy=mostRecent/json",
        base.trim_end_matches('/'),
        country,
        app_id
    )
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

/// Public customer-review feed, no credentials needed.
pub struct AppleFeedProvider {
    mode: Mode,
}

impl AppleFeedProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn new(client: reqwest::Client, base: &str, country: &str, app_id: &str) -> Self {
        Self {
            mode: Mode::Http {
                url: feed_url(base, country, app_id),
                client,
            },
        }
    }
}

#[async_trait]
impl ReviewProvider for AppleFeedProvider {
    async fn fetch_reviews(&self) -> Result<Vec<Review>> {
        match &self.mode {
            Mode::Fixture(s) => parse_feed_json(s),
            Mode::Http { url, client } => {
                tracing::info!(provider = "apple_feed", %url, "fetching apple reviews");
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("apple feed http get()")?
                    .error_for_status()
                    .context("apple feed non-2xx")?
                    .text()
                    .await
                    .context("apple feed http .text()")?;
                parse_feed_json(&body)
            }
        }
    }

    fn source(&self) -> Source {
        Source::Apple
    }

    fn name(&self) -> &'static str {
        "apple_feed"
    }
}
