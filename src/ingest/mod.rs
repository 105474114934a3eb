// src/ingest/mod.rs
pub mod csv_table;
pub mod encoding;
pub mod providers;
pub mod types;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;

use crate::review::{Review, Source, MAX_RATING};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "reviews_ingested_total",
            "Reviews normalized from a source, by source."
        );
        describe_counter!(
            "review_provider_errors_total",
            "Provider fetch/parse errors absorbed into an empty result."
        );
        describe_histogram!("ingest_parse_ms", "Provider parse time in milliseconds.");
        describe_counter!(
            "insight_requests_total",
            "Synthesis calls issued per source group."
        );
        describe_counter!(
            "insight_failures_total",
            "Synthesis calls that ended in the failure sentinel."
        );
    });
}

/// Telemetry shared by all providers after a successful parse.
pub(crate) fn record_parsed(source: Source, count: usize, started: std::time::Instant) {
    ensure_metrics_described();
    let ms = started.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    counter!("reviews_ingested_total", "source" => source.as_str()).increment(count as u64);
}

/// Lenient star rating: trims, takes a leading number (`"4 stars"` -> 4), else 0.
/// Always finite and within `[0, 5]`.
pub fn parse_rating(raw: &str) -> f64 {
    let t = raw.trim();
    let value = t.parse::<f64>().ok().or_else(|| {
        let end = t
            .char_indices()
            .take_while(|&(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && matches!(c, '+' | '-')))
            .map(|(i, c)| i + c.len_utf8())
            .last()?;
        t[..end].parse::<f64>().ok()
    });
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, MAX_RATING),
        _ => 0.0,
    }
}

/// Parse a store timestamp; anything missing or unreadable becomes "now".
pub fn parse_date_or_now(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(parse_date).unwrap_or_else(Utc::now)
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `title\nbody` when both are present, otherwise whichever one is.
pub(crate) fn join_title_body(title: Option<&str>, body: Option<&str>) -> String {
    match (title.filter(|t| !t.is_empty()), body.filter(|b| !b.is_empty())) {
        (Some(t), Some(b)) => format!("{t}\n{b}"),
        (Some(t), None) => t.to_string(),
        (None, Some(b)) => b.to_string(),
        (None, None) => String::new(),
    }
}

/// Keep the first `cap` reviews, file order preserved.
pub(crate) fn cap_reviews(mut reviews: Vec<Review>, cap: usize) -> Vec<Review> {
    reviews.truncate(cap);
    reviews
}
