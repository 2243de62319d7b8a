//! Runtime configuration read from the process environment.
//!
//! `main` loads `.env` through `dotenvy` first, so every key below may live
//! in either place. Missing keys take their defaults; present but unparsable
//! keys are a startup error.

use crate::error::ConfigError;
use crate::scoring::{FingerprintSpec, Scorer, ScoringPolicy};
use crate::sources::SourceConfig;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_FEED_URLS: &[&str] = &[
    "https://api.dexscreener.com/token-profiles/latest/v1",
    "https://api.dexscreener.com/token-boosts/latest/v1",
    "https://api.dexscreener.com/token-boosts/top/v1",
];
pub const DEFAULT_ENRICHMENT_BASE_URL: &str = "https://api.dexscreener.com/tokens/v1";
pub const DEFAULT_LINK: &str = "https://dexscreener.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub poll_interval: Duration,
    pub batch_size: usize,
    pub top_n: usize,
    pub scorer: Scorer,
    pub chain_namespace: String,
    pub sources: Vec<SourceConfig>,
    pub enrichment_base_url: String,
    pub enrichment_concurrency: usize,
    pub default_link: String,
    /// Alert destination handle. `None` is reported at dispatch time.
    pub alert_webhook_url: Option<String>,
    pub http_timeout: Duration,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let poll_secs: u64 = parse_or(&lookup, "POLL_INTERVAL_SECONDS", 180)?;
        if poll_secs == 0 {
            return Err(ConfigError::invalid("POLL_INTERVAL_SECONDS", "0", "must be at least 1"));
        }
        let timeout_secs: u64 = parse_or(&lookup, "HTTP_TIMEOUT_SECONDS", 10)?;
        if timeout_secs == 0 {
            return Err(ConfigError::invalid("HTTP_TIMEOUT_SECONDS", "0", "must be at least 1"));
        }
        let batch_size: usize = parse_or(&lookup, "BATCH_SIZE", 30)?;
        if batch_size == 0 {
            return Err(ConfigError::invalid("BATCH_SIZE", "0", "must be at least 1"));
        }
        let top_n: usize = parse_or(&lookup, "TOP_N", 10)?;
        let enrichment_concurrency: usize = parse_or(&lookup, "ENRICHMENT_CONCURRENCY", 4)?;
        if enrichment_concurrency == 0 {
            return Err(ConfigError::invalid("ENRICHMENT_CONCURRENCY", "0", "must be at least 1"));
        }

        let digits: usize = parse_or(&lookup, "FINGERPRINT_DIGITS", 4)?;
        if digits == 0 {
            return Err(ConfigError::invalid("FINGERPRINT_DIGITS", "0", "must be at least 1"));
        }
        let precision: usize = parse_or(&lookup, "FINGERPRINT_PRECISION", 12)?;

        let policy: ScoringPolicy = parse_or(&lookup, "SCORING_POLICY", ScoringPolicy::default())?;
        let policy = match policy {
            ScoringPolicy::Equality => ScoringPolicy::Equality,
            ScoringPolicy::DigitPrefix { .. } => ScoringPolicy::DigitPrefix {
                max_mismatch: parse_or(&lookup, "MAX_DIGIT_MISMATCH", 1)?,
            },
            ScoringPolicy::DigitThreshold { .. } => ScoringPolicy::DigitThreshold {
                threshold: parse_or(&lookup, "DIGIT_THRESHOLD", 10)?,
            },
            ScoringPolicy::ScaledMagnitude { .. } => {
                let alert_diff: f64 = parse_or(&lookup, "ALERT_DIFF", 1e-6)?;
                if !alert_diff.is_finite() || alert_diff < 0.0 {
                    return Err(ConfigError::invalid(
                        "ALERT_DIFF",
                        alert_diff.to_string(),
                        "must be a finite, non-negative number",
                    ));
                }
                ScoringPolicy::ScaledMagnitude { alert_diff }
            }
        };

        let chain_namespace = lookup("CHAIN_NAMESPACE")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "solana".into());

        let feed_urls = url_list(&lookup, "FEED_URLS")
            .unwrap_or_else(|| DEFAULT_FEED_URLS.iter().map(|u| u.to_string()).collect());
        let document_urls = url_list(&lookup, "DOCUMENT_URLS").unwrap_or_default();
        let sources = feed_urls
            .into_iter()
            .map(|url| SourceConfig::Feed { url })
            .chain(document_urls.into_iter().map(|url| SourceConfig::Document { url, top_n }))
            .collect();

        Ok(Self {
            poll_interval: Duration::from_secs(poll_secs),
            batch_size,
            top_n,
            scorer: Scorer::new(policy, FingerprintSpec { digits, precision }),
            chain_namespace,
            sources,
            enrichment_base_url: lookup("ENRICHMENT_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ENRICHMENT_BASE_URL.into()),
            enrichment_concurrency,
            default_link: lookup("DEFAULT_LINK").unwrap_or_else(|| DEFAULT_LINK.into()),
            alert_webhook_url: lookup("ALERT_WEBHOOK_URL")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            http_timeout: Duration::from_secs(timeout_secs),
            port: parse_or(&lookup, "PORT", 8080)?,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, raw.clone(), e)),
        _ => Ok(default),
    }
}

/// Comma separated list. `None` when the key is unset, so an explicitly
/// empty value disables the defaults.
fn url_list(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Vec<String>> {
    lookup(key).map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from)
            .collect()
    })
}
