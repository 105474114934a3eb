//! AI adapter: generative-text provider abstraction (Gemini, mock, disabled).
//!
//! The synthesizer only ever sees [`TextGenerator`]; which concrete provider sits
//! behind it is decided once from [`AiConfig`] by [`build_generator`].

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::ai::AiConfig;

pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// How the provider should shape its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    Json,
}

pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// One prompt in, one text blob out. Call-level failures (network, auth, quota)
/// come back as `Err` with a readable message.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str, format: ResponseFormat) -> GenerateFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynGenerator = Arc<dyn TextGenerator>;

/// Factory: build a generator according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns a [`MockGenerator`] with a fixed NEUTRAL reply.
/// * Else if no credential is configured, returns `None` (a normal state).
/// * Else builds the real provider (Gemini).
pub fn build_generator(config: &AiConfig) -> Result<Option<DynGenerator>> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        let mock = MockGenerator::replying(
            r#"{"sentiment":"Neutral (mock)","top_positive":[],"top_negative":[],"advice":[],"verdict":"NEUTRAL"}"#,
        );
        return Ok(Some(Arc::new(mock)));
    }

    let Some(key) = config.credential() else {
        return Ok(None);
    };

    match config.provider.as_str() {
        "gemini" => {
            let provider = GeminiProvider::new(key, &config.model, &config.base_url)?;
            Ok(Some(Arc::new(provider)))
        }
        other => {
            tracing::warn!(provider = other, "unsupported AI provider, synthesis disabled");
            Ok(None)
        }
    }
}

// ------------------------------------------------------------
// Gemini
// ------------------------------------------------------------

/// Google Gemini `generateContent`.
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    url: String,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("app-review-insights/0.1")
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("building gemini http client")?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        );
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            url,
        })
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Req<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}
#[derive(Deserialize)]
struct Candidate {
    content: Option<RespContent>,
}
#[derive(Deserialize)]
struct RespContent {
    #[serde(default)]
    parts: Vec<RespPart>,
}
#[derive(Deserialize)]
struct RespPart {
    text: Option<String>,
}
#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}
#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn build_request(prompt: &str, format: ResponseFormat) -> Req<'_> {
    Req {
        contents: vec![Content {
            parts: vec![Part { text: prompt }],
        }],
        generation_config: match format {
            ResponseFormat::Json => Some(GenerationConfig {
                response_mime_type: "application/json",
            }),
            ResponseFormat::Text => None,
        },
    }
}

/// Concatenated text of the first candidate.
fn extract_text(body: &str) -> Result<String> {
    let resp: Resp = serde_json::from_str(body).context("parsing gemini response")?;
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(anyhow!("gemini returned no candidates"));
    }
    Ok(text)
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(e) => format!("gemini {status}: {}", e.error.message),
        Err(_) => format!("gemini {status}"),
    }
}

impl TextGenerator for GeminiProvider {
    fn generate<'a>(&'a self, prompt: &'a str, format: ResponseFormat) -> GenerateFuture<'a> {
        Box::pin(async move {
            let resp = self
                .http
                .post(&self.url)
                .header("x-goog-api-key", &self.api_key)
                .json(&build_request(prompt, format))
                .send()
                .await
                .context("gemini request")?;

            let status = resp.status();
            let body = resp.text().await.context("gemini response body")?;
            if !status.is_success() {
                return Err(anyhow!(error_message(status, &body)));
            }
            extract_text(&body)
        })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Mock
// ------------------------------------------------------------

/// Deterministic generator for tests/local runs. Records every prompt it receives.
pub struct MockGenerator {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }
}

impl TextGenerator for MockGenerator {
    fn generate<'a>(&'a self, prompt: &'a str, _format: ResponseFormat) -> GenerateFuture<'a> {
        if let Ok(mut g) = self.prompts.lock() {
            g.push(prompt.to_string());
        }
        let out = self.reply.clone().map_err(|m| anyhow!(m));
        Box::pin(async move { out })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
