// src/ingest/providers/google_csv.rs
//! Google Play Console review export (CSV, often UTF-16LE).

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use crate::ingest::types::ReviewProvider;
use crate::ingest::{
    cap_reviews, csv_table, encoding, join_title_body, parse_date_or_now, parse_rating,
    record_parsed,
};
use crate::review::{Review, Source};

/// Play exports strip reviewer names.
pub const GOOGLE_AUTHOR: &str = "Google User";

/// Upper bound on reviews taken from one export.
pub const GOOGLE_REVIEW_CAP: usize = 50;

/// Column positions located by header substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    rating: usize,
    text: Option<usize>,
    title: Option<usize>,
    date: Option<usize>,
}

impl Columns {
    fn locate(header: &[String]) -> Option<Self> {
        let names: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |needle: &str| names.iter().position(|h| h.contains(needle));
        Some(Self {
            rating: find("star rating")?,
            text: find("review text"),
            title: find("review title"),
            date: find("submit date"),
        })
    }
}

fn cell(row: &[String], idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| row.get(i))
        .map(String::as_str)
        .filter(|s| !s.is_empty())
}

/// Decode + parse + normalize an export. A file without a star-rating column yields
/// an empty list rather than an error.
pub fn parse_google_csv(bytes: &[u8]) -> Vec<Review> {
    let t0 = std::time::Instant::now();
    let text = encoding::decode(bytes);
    let rows = csv_table::parse(&text);

    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };
    let Some(cols) = Columns::locate(header) else {
        tracing::warn!(provider = "google", "invalid Google CSV: missing star rating column");
        return Vec::new();
    };

    let mut out = Vec::new();
    for row in data {
        if row.len() <= cols.rating || row.iter().all(String::is_empty) {
            continue;
        }
        let rating = parse_rating(&row[cols.rating]);
        let content = join_title_body(cell(row, cols.title), cell(row, cols.text));
        let date = parse_date_or_now(cell(row, cols.date));
        out.push(Review::new(Source::Google, GOOGLE_AUTHOR, rating, content, date));
    }

    let out = cap_reviews(out, GOOGLE_REVIEW_CAP);
    record_parsed(Source::Google, out.len(), t0);
    out
}

enum Input {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// Locally supplied export; no network involved.
pub struct GoogleCsvProvider {
    input: Input,
}

impl GoogleCsvProvider {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            input: Input::Bytes(bytes.into()),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            input: Input::File(path.into()),
        }
    }
}

#[async_trait]
impl ReviewProvider for GoogleCsvProvider {
    async fn fetch_reviews(&self) -> Result<Vec<Review>> {
        match &self.input {
            Input::Bytes(b) => Ok(parse_google_csv(b)),
            Input::File(p) => {
                let b = tokio::fs::read(p)
                    .await
                    .with_context(|| format!("reading google csv from {}", p.display()))?;
                Ok(parse_google_csv(&b))
            }
        }
    }

    fn source(&self) -> Source {
        Source::Google
    }

    fn name(&self) -> &'static str {
        "google"
    }
}
