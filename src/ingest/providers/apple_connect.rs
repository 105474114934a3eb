// src/ingest/providers/apple_connect.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::providers::apple_feed::APPLE_ANONYMOUS;
use crate::ingest::types::ReviewProvider;
use crate::ingest::{parse_date_or_now, record_parsed};
use crate::review::{Review, Source};

pub const DEFAULT_CONNECT_BASE: &str = "https://api.appstoreconnect.apple.com";

/// Page size requested from the server; nothing beyond the first page is fetched.
pub const CONNECT_PAGE_SIZE: usize = 50;

/// Supplies the bearer token for App Store Connect. Signing the JWT is somebody
/// else's job; this only hands out the finished token.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Result<String>;
}

/// Pre-minted token, e.g. from `APPLE_CONNECT_TOKEN`.
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Result<String> {
        if self.0.trim().is_empty() {
            return Err(anyhow!("App Store Connect token is empty"));
        }
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    data: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    attributes: Option<Attributes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Attributes {
    reviewer_nickname: Option<String>,
    rating: Option<f64>,
    title: Option<String>,
    body: Option<String>,
    created_date: Option<String>,
}

impl Attributes {
    fn into_review(self) -> Review {
        let author = self
            .reviewer_nickname
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| APPLE_ANONYMOUS.to_string());
        let body = self.body.unwrap_or_default();
        let content = match self.title.filter(|t| !t.is_empty()) {
            Some(title) => format!("{title}\n{body}"),
            None => body,
        };
        Review::new(
            Source::Apple,
            author,
            self.rating.unwrap_or(0.0),
            content,
            parse_date_or_now(self.created_date.as_deref()),
        )
    }
}

/// Normalize one page of `customerReviews`.
pub fn parse_connect_json(body: &str) -> Result<Vec<Review>> {
    let t0 = std::time::Instant::now();
    let page: Page = serde_json::from_str(body).context("parsing app store connect json")?;
    let out: Vec<Review> = page
        .data
        .into_iter()
        .filter_map(|it| it.attributes)
        .map(Attributes::into_review)
        .collect();
    record_parsed(Source::Apple, out.len(), t0);
    Ok(out)
}

pub fn connect_url(base: &str, app_id: &str) -> String {
    format!(
        "{}/v1/apps/{}/customerReviews?sort=-createdDate&limit={}",
        base.trim_end_matches('/'),
        app_id,
        CONNECT_PAGE_SIZE
    )
}

/// Authenticated App Store Connect reviews endpoint.
pub struct AppleConnectProvider {
    url: String,
    client: reqwest::Client,
    token: std::sync::Arc<dyn TokenSource>,
}

impl AppleConnectProvider {
    pub fn new(
        client: reqwest::Client,
        base: &str,
        app_id: &str,
        token: std::sync::Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            url: connect_url(base, app_id),
            client,
            token,
        }
    }
}

#[async_trait]
impl ReviewProvider for AppleConnectProvider {
    async fn fetch_reviews(&self) -> Result<Vec<Review>> {
        let token = self.token.bearer_token()?;
        let resp = self
            .client
            .get(&self.url)
            .bearer_auth(token)
            .send()
            .await
            .context("app store connect http get()")?;

        let status = resp.status();
        let body = resp.text().await.context("app store connect .text()")?;
        if !status.is_success() {
            return Err(anyhow!("app store connect returned {status}: {body}"));
        }
        parse_connect_json(&body)
    }

    fn source(&self) -> Source {
        Source::Apple
    }

    fn name(&self) -> &'static str {
        "apple_connect"
    }
}
