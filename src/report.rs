//! report.rs — caller-side views over an aggregate result.
//!
//! None of this runs inside the orchestrator: ordering across sources is not part of
//! its contract, so sorting happens here, explicitly, on the caller's copy.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::aggregate::AggregateReport;
use crate::review::{Insight, Review, Source};

pub const DASHBOARD_RECENT: usize = 5;
pub const DASHBOARD_ADVICE: usize = 4;
/// Upper bound for an uploaded Play Console export. UTF-16LE exports run about twice
/// the size of the same text in UTF-8.
pub const MAX_CSV_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Newest first. Stable, so equal dates keep their input order.
pub fn sort_newest_first(reviews: &mut [Review]) {
    reviews.sort_by(|a, b| b.date().cmp(&a.date()));
}

/// The `n` newest reviews across all sources.
pub fn recent(reviews: &[Review], n: usize) -> Vec<Review> {
    let mut v = reviews.to_vec();
    sort_newest_first(&mut v);
    v.truncate(n);
    v
}

/// Advice items in source order (apple, then google), first `n` only.
pub fn combined_advice(insights: &BTreeMap<Source, Insight>, n: usize) -> Vec<String> {
    insights
        .values()
        .flat_map(|i| i.advice.iter().cloned())
        .take(n)
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub reviews: Vec<Review>,
    pub insights: BTreeMap<Source, Insight>,
    pub recent: Vec<Review>,
    pub advice: Vec<String>,
}

impl Dashboard {
    pub fn from_report(report: AggregateReport, recent_n: usize) -> Self {
        let recent = recent(&report.reviews, recent_n);
        let advice = combined_advice(&report.insights, DASHBOARD_ADVICE);
        Self {
            reviews: report.reviews,
            insights: report.insights,
            recent,
            advice,
        }
    }
}
