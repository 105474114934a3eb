// src/config/apps.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::providers::apple_connect::DEFAULT_CONNECT_BASE;
use crate::ingest::providers::apple_feed::{DEFAULT_COUNTRY, DEFAULT_FEED_BASE};

const ENV_PATH: &str = "REVIEWS_CONFIG_PATH";
const ENV_CONNECT_TOKEN: &str = "APPLE_CONNECT_TOKEN";

/// An app whose reviews can be pulled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppProfile {
    pub key: String,
    pub name: String,
    /// App Store id. Empty means "no Apple source for this app".
    #[serde(default)]
    pub apple_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppleMode {
    /// Public RSS/JSON customer-review feed.
    #[default]
    Feed,
    /// App Store Connect REST API (needs a bearer token).
    Connect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppleSettings {
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub mode: AppleMode,
    #[serde(default = "default_feed_base")]
    pub feed_base_url: String,
    #[serde(default = "default_connect_base")]
    pub connect_base_url: String,
    /// "ENV" means: read from APPLE_CONNECT_TOKEN.
    #[serde(default)]
    pub connect_token: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}
fn default_feed_base() -> String {
    DEFAULT_FEED_BASE.to_string()
}
fn default_connect_base() -> String {
    DEFAULT_CONNECT_BASE.to_string()
}

impl Default for AppleSettings {
    fn default() -> Self {
        Self {
            country: default_country(),
            mode: AppleMode::default(),
            feed_base_url: default_feed_base(),
            connect_base_url: default_connect_base(),
            connect_token: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewsConfig {
    #[serde(default = "default_apps")]
    pub apps: Vec<AppProfile>,
    #[serde(default)]
    pub apple: AppleSettings,
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            apps: default_apps(),
            apple: AppleSettings::default(),
        }
    }
}

fn default_apps() -> Vec<AppProfile> {
    vec![
        AppProfile {
            key: "app_a".into(),
            name: "Visana App".into(),
            apple_id: "1221367995".into(),
        },
        AppProfile {
            key: "app_b".into(),
            name: "myPoints".into(),
            apple_id: "6745941827".into(),
        },
    ]
}

impl ReviewsConfig {
    pub fn app(&self, key: &str) -> Option<&AppProfile> {
        self.apps.iter().find(|a| a.key.eq_ignore_ascii_case(key))
    }

    fn resolved(mut self) -> Self {
        if self.apple.connect_token.trim().eq_ignore_ascii_case("env") {
            self.apple.connect_token = std::env::var(ENV_CONNECT_TOKEN).unwrap_or_default();
        }
        for a in &mut self.apps {
            a.apple_id = a.apple_id.trim().to_string();
        }
        if self.apple.country.trim().is_empty() {
            self.apple.country = default_country();
        }
        self
    }
}

/// Load from an explicit path. Supports TOML or JSON formats.
pub fn load_reviews_config_from(path: &Path) -> Result<ReviewsConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading reviews config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg: ReviewsConfig = if ext == "json" {
        serde_json::from_str(&content).context("parsing reviews config json")?
    } else {
        toml::from_str(&content).context("parsing reviews config toml")?
    };
    Ok(cfg.resolved())
}

/// Load using env var + fallbacks:
/// 1) $REVIEWS_CONFIG_PATH
/// 2) config/reviews.toml
/// 3) config/reviews.json
/// 4) built-in defaults
pub fn load_reviews_config_default() -> Result<ReviewsConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_reviews_config_from(&pb);
        } else {
            return Err(anyhow!("REVIEWS_CONFIG_PATH points to non-existent path"));
        }
    }
    for candidate in ["config/reviews.toml", "config/reviews.json"] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return load_reviews_config_from(&p);
        }
    }
    Ok(ReviewsConfig::default().resolved())
}
