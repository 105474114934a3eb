// src/analyze/synthesis.rs
//! Insight synthesis: bounded prompt in, strict JSON `Insight` out.
//!
//! `Synthesizer::synthesize` never returns an error. Empty input, a missing
//! credential, and any call/parse failure each map to a fixed NEUTRAL insight.

use anyhow::{Context, Result};
use metrics::counter;

use crate::analyze::ai_adapter::{build_generator, DynGenerator, ResponseFormat};
use crate::config::ai::AiConfig;
use crate::review::{Insight, Review};

/// Reviews beyond this many (in input order) are left out of the prompt.
pub const MAX_PROMPT_REVIEWS: usize = 50;

pub fn build_prompt(reviews: &[Review], language: &str) -> String {
    let lines: Vec<String> = reviews
        .iter()
        .take(MAX_PROMPT_REVIEWS)
        .map(Review::prompt_line)
        .collect();

    format!(
        r#"Analyze the following app reviews and return the result ONLY as valid JSON.
Write every text value in {language}. Do not answer in any other language.
Expected JSON format:
{{
    "sentiment": "Summary of the overall mood (max 2 sentences)",
    "top_positive": ["Point 1", "Point 2", "Point 3"],
    "top_negative": ["Point 1", "Point 2", "Point 3"],
    "advice": ["Advice 1", "Advice 2", "Advice 3"],
    "verdict": "POSITIVE" or "NEGATIVE" or "NEUTRAL"
}}

Reviews:
{}
"#,
        lines.join("\n")
    )
}

/// Drop every ```json / ``` fence and surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn parse_insight(text: &str) -> Result<Insight> {
    let clean = strip_code_fences(text);
    serde_json::from_str(&clean).context("model reply is not a valid insight JSON")
}

pub struct Synthesizer {
    generator: Option<DynGenerator>,
    language: String,
}

impl Synthesizer {
    pub fn new(generator: Option<DynGenerator>, language: impl Into<String>) -> Self {
        Self {
            generator,
            language: language.into(),
        }
    }

    pub fn from_config(cfg: &AiConfig) -> Result<Self> {
        let generator = build_generator(cfg)?;
        if let Some(g) = &generator {
            tracing::info!(provider = g.provider_name(), model = %cfg.model, "insight synthesis enabled");
        } else {
            tracing::info!("insight synthesis disabled: no credential configured");
        }
        Ok(Self::new(generator, cfg.output_language.clone()))
    }

    /// Whether a generative-text credential is available.
    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn synthesize(&self, reviews: &[Review]) -> Insight {
        if reviews.is_empty() {
            return Insight::no_data();
        }
        let Some(generator) = &self.generator else {
            return Insight::credential_missing();
        };

        let prompt = build_prompt(reviews, &self.language);
        let reply = generator.generate(&prompt, ResponseFormat::Json).await;
        match reply.and_then(|text| parse_insight(&text)) {
            Ok(insight) => insight,
            Err(e) => {
                tracing::warn!(error = ?e, provider = generator.provider_name(), "insight synthesis failed");
                counter!("insight_failures_total").increment(1);
                Insight::failed(format!("{e:#}"))
            }
        }
    }
}
