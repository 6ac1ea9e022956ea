use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};

pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Output shape the model is asked for, on top of the prompt's own instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ResponseFormat::Json),
            "text" => Ok(ResponseFormat::Text),
            other => Err(format!("unknown response format '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Fixed settings for every model invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub response_format: ResponseFormat,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1000,
            timeout: Duration::from_secs(25),
            response_format: ResponseFormat::Json,
        }
    }
}

/// Request-level bounds applied by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineLimits {
    pub max_query_chars: usize,
    pub max_recommendations: usize,
    pub max_catalog_items: usize,
    /// Drop recommendations naming books outside the catalog snapshot.
    pub enforce_catalog_membership: bool,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            max_query_chars: 1000,
            max_recommendations: 3,
            max_catalog_items: 500,
            enforce_catalog_membership: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogSource {
    /// Base URL of the books API; `/getBooks` is appended.
    Http { base_url: String, timeout: Duration },
    /// Local JSON file, re-read on every request.
    File(PathBuf),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Model provider
    pub anthropic_api_key: String,
    pub anthropic_base_url: Option<String>,
    pub model: ModelSettings,

    // Pipeline
    pub limits: PipelineLimits,
    pub catalog: CatalogSource,

    // Web server
    pub web_host: String,
    pub web_port: u16,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let anthropic_api_key =
            get("ANTHROPIC_API_KEY").ok_or_else(|| anyhow!("ANTHROPIC_API_KEY is required"))?;

        let defaults = ModelSettings::default();
        let model = ModelSettings {
            model: get("RECOMMEND_MODEL").unwrap_or(defaults.model),
            max_tokens: parse_or(&get, "RECOMMEND_MAX_TOKENS", defaults.max_tokens)?,
            timeout: Duration::from_secs(parse_or(
                &get,
                "RECOMMEND_MODEL_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
            response_format: parse_or(&get, "RECOMMEND_RESPONSE_FORMAT", defaults.response_format)?,
        };

        let defaults = PipelineLimits::default();
        let limits = PipelineLimits {
            max_query_chars: parse_or(&get, "RECOMMEND_MAX_QUERY_CHARS", defaults.max_query_chars)?,
            max_recommendations: parse_or(
                &get,
                "RECOMMEND_MAX_RESULTS",
                defaults.max_recommendations,
            )?,
            max_catalog_items: parse_or(
                &get,
                "RECOMMEND_MAX_CATALOG_ITEMS",
                defaults.max_catalog_items,
            )?,
            enforce_catalog_membership: parse_or(
                &get,
                "RECOMMEND_ENFORCE_CATALOG",
                defaults.enforce_catalog_membership,
            )?,
        };
        for (key, value) in [
            ("RECOMMEND_MAX_TOKENS", u64::from(model.max_tokens)),
            ("RECOMMEND_MODEL_TIMEOUT_SECS", model.timeout.as_secs()),
            ("RECOMMEND_MAX_QUERY_CHARS", limits.max_query_chars as u64),
            ("RECOMMEND_MAX_RESULTS", limits.max_recommendations as u64),
            ("RECOMMEND_MAX_CATALOG_ITEMS", limits.max_catalog_items as u64),
        ] {
            if value == 0 {
                bail!("{key} must be positive");
            }
        }

        let catalog = match (get("CATALOG_API_URL"), get("CATALOG_FILE")) {
            (Some(base_url), _) => {
                let timeout_secs = parse_or(&get, "CATALOG_TIMEOUT_SECS", 10u64)?;
                if timeout_secs == 0 {
                    bail!("CATALOG_TIMEOUT_SECS must be positive");
                }
                CatalogSource::Http {
                    base_url,
                    timeout: Duration::from_secs(timeout_secs),
                }
            }
            (None, Some(path)) => CatalogSource::File(PathBuf::from(path)),
            (None, None) => bail!("one of CATALOG_API_URL or CATALOG_FILE is required"),
        };

        Ok(Self {
            anthropic_api_key,
            anthropic_base_url: get("ANTHROPIC_BASE_URL"),
            model,
            limits,
            catalog,
            web_host: get("WEB_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            web_port: parse_or(&get, "WEB_PORT", 3000u16)?,
            log_format: parse_or(&get, "LOG_FORMAT", LogFormat::Pretty)?,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}
