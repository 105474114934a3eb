//! review.rs — canonical review record and the insight derived from a group of reviews.
//!
//! Every source adapter maps its own format into [`Review`]; the synthesizer turns a
//! slice of reviews into one [`Insight`]. Both are built fresh per call and never
//! mutated afterwards.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Shown instead of an empty review body.
pub const NO_WRITTEN_REVIEW: &str = "[No written review]";

/// Highest star rating a store hands out.
pub const MAX_RATING: f64 = 5.0;

/// Storefront a review came from. Set once by the adapter, never inferred later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Apple,
    Google,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Apple => "apple",
            Source::Google => "google",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized review.
///
/// Fields are private so the invariants set up by [`Review::new`] hold for the
/// lifetime of the value: rating is finite and in `[0, 5]`, content is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    source: Source,
    author: String,
    rating: f64,
    content: String,
    #[serde(serialize_with = "serialize_rfc3339")]
    date: DateTime<Utc>,
}

impl Review {
    pub fn new(
        source: Source,
        author: impl Into<String>,
        rating: f64,
        content: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        let rating = if rating.is_finite() {
            rating.clamp(0.0, MAX_RATING)
        } else {
            0.0
        };
        let mut content = content.into();
        if content.is_empty() {
            content = NO_WRITTEN_REVIEW.to_string();
        }
        Self {
            source,
            author: author.into(),
            rating,
            content,
            date,
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Line used inside the synthesis prompt: `- [apple] rating: 4, content: ...`.
    pub fn prompt_line(&self) -> String {
        format!(
            "- [{}] rating: {}, content: {}",
            self.source, self.rating, self.content
        )
    }
}

fn serialize_rfc3339<S: Serializer>(date: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Three-way classification attached to an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Positive,
    Negative,
    Neutral,
}

/// Summary of one source group, as produced by the generative model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub sentiment: String,
    #[serde(default)]
    pub top_positive: Vec<String>,
    #[serde(default)]
    pub top_negative: Vec<String>,
    #[serde(default)]
    pub advice: Vec<String>,
    pub verdict: Verdict,
}

impl Insight {
    fn neutral(sentiment: impl Into<String>) -> Self {
        Self {
            sentiment: sentiment.into(),
            top_positive: Vec::new(),
            top_negative: Vec::new(),
            advice: Vec::new(),
            verdict: Verdict::Neutral,
        }
    }

    /// Returned when there is nothing to summarize.
    pub fn no_data() -> Self {
        Self::neutral("No data.")
    }

    /// Returned when no generative-text credential is configured.
    pub fn credential_missing() -> Self {
        Self::failed("API key missing")
    }

    /// Returned when the call or the response parsing failed.
    pub fn failed(message: impl fmt::Display) -> Self {
        Self::neutral(format!("Analysis failed: {message}"))
    }
}
