// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::analyze::ai_adapter::{DEFAULT_GEMINI_BASE, DEFAULT_GEMINI_MODEL};

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
const ENV_GEMINI_KEY: &str = "GEMINI_API_KEY";

fn default_enabled() -> bool {
    true
}
fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}
fn default_base_url() -> String {
    DEFAULT_GEMINI_BASE.to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_language() -> String {
    "German".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Only "gemini" is wired up (case-insensitive).
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// "ENV" means: read from GEMINI_API_KEY. Empty means no credential.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Language every text value of an insight must be written in.
    #[serde(default = "default_language")]
    pub output_language: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            api_key: default_api_key(),
            output_language: default_language(),
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: AiConfig = serde_json::from_str(&data)?;
        Ok(cfg.resolved())
    }

    /// Defaults with the key taken from the environment.
    pub fn from_env() -> Self {
        Self::default().resolved()
    }

    /// `config/ai.json` when present, otherwise [`AiConfig::from_env`].
    pub fn load_default() -> anyhow::Result<Self> {
        let p = Path::new(DEFAULT_AI_CONFIG_PATH);
        if p.exists() {
            Self::load_from_file(p)
        } else {
            Ok(Self::from_env())
        }
    }

    fn resolved(mut self) -> Self {
        self.provider = self.provider.trim().to_lowercase();
        // A missing key is a normal state: synthesis just stays off.
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(ENV_GEMINI_KEY).unwrap_or_default();
        }
        self.api_key = self.api_key.trim().to_string();
        if self.output_language.trim().is_empty() {
            self.output_language = default_language();
        }
        self
    }

    /// The key to call the model with, if synthesis can run at all.
    pub fn credential(&self) -> Option<&str> {
        if self.enabled && !self.api_key.is_empty() {
            Some(self.api_key.as_str())
        } else {
            None
        }
    }
}
