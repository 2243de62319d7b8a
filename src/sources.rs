//! Source adapters producing candidate identifiers.
//!
//! Feed sources are JSON list endpoints of `{chainId, tokenAddress}` entries.
//! Document sources are ranking pages whose anchors link to
//! `.../{namespace}/{identifier}`. Both are best effort: a failing source is
//! logged and contributes nothing.

use crate::error::SourceError;
use crate::types::CandidateIdentifier;
use async_trait::async_trait;
use lazy_static::lazy_static;
use reqwest::header::ACCEPT;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

lazy_static! {
    static ref ANCHOR: Selector = Selector::parse("a[href]").expect("anchor selector");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    Feed { url: String },
    Document { url: String, top_n: usize },
}

impl SourceConfig {
    pub fn url(&self) -> &str {
        match self {
            Self::Feed { url } | Self::Document { url, .. } => url,
        }
    }
}

/// Anything discovery can poll for identifiers. Implementations never fail:
/// errors are logged and yield an empty list.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Vec<CandidateIdentifier>;
}

#[derive(Clone)]
pub struct SourceAdapter {
    client: Client,
    config: SourceConfig,
    namespace: String,
}

impl SourceAdapter {
    pub fn new(client: Client, config: SourceConfig, namespace: &str) -> Self {
        Self {
            client,
            config,
            namespace: namespace.to_string(),
        }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub async fn try_fetch(&self) -> Result<Vec<CandidateIdentifier>, SourceError> {
        let accept = match self.config {
            SourceConfig::Feed { .. } => "application/json",
            SourceConfig::Document { .. } => "text/html",
        };
        let response = self
            .client
            .get(self.config.url())
            .header(ACCEPT, accept)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status { status });
        }

        match &self.config {
            SourceConfig::Feed { .. } => {
                let body = response.text().await?;
                let payload: Value = serde_json::from_str(&body)
                    .map_err(|e| SourceError::Malformed(format!("invalid JSON: {}", e)))?;
                extract_feed_identifiers(&payload, &self.namespace)
            }
            SourceConfig::Document { top_n, .. } => {
                let body = response.text().await?;
                Ok(extract_document_identifiers(&body, &self.namespace, *top_n))
            }
        }
    }
}

#[async_trait]
impl CandidateSource for SourceAdapter {
    fn name(&self) -> &str {
        self.config.url()
    }

    async fn fetch(&self) -> Vec<CandidateIdentifier> {
        match self.try_fetch().await {
            Ok(ids) => {
                debug!("[Source] {} returned {} identifier(s)", self.name(), ids.len());
                ids
            }
            Err(e) => {
                warn!("[Source] {} unavailable: {}", self.name(), e);
                Vec::new()
            }
        }
    }
}

/// Entries outside the namespace or without a usable `tokenAddress` are
/// skipped silently; only a non-list payload is an error.
pub fn extract_feed_identifiers(
    payload: &Value,
    namespace: &str,
) -> Result<Vec<CandidateIdentifier>, SourceError> {
    let entries = payload
        .as_array()
        .ok_or_else(|| SourceError::Malformed("expected a JSON list".into()))?;

    let mut seen = HashSet::new();
    Ok(entries
        .iter()
        .filter(|entry| entry.get("chainId").and_then(Value::as_str) == Some(namespace))
        .filter_map(|entry| entry.get("tokenAddress").and_then(Value::as_str))
        .map(str::trim)
        .filter(|addr| !addr.is_empty() && seen.insert(addr.to_string()))
        .map(String::from)
        .collect())
}

/// First `top_n` distinct identifiers linked as `/{namespace}/{id}`.
pub fn extract_document_identifiers(
    html: &str,
    namespace: &str,
    top_n: usize,
) -> Vec<CandidateIdentifier> {
    let document = Html::parse_document(html);
    let marker = format!("/{}/", namespace);
    let mut seen = HashSet::new();

    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            let start = href.find(&marker)? + marker.len();
            let rest = &href[start..];
            let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
            let id = &rest[..end];
            (!id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())).then_some(id)
        })
        .filter(|id| seen.insert(id.to_string()))
        .take(top_n)
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn feed_keeps_matching_namespace_only() {
        let payload = json!([
            {"chainId": "solana", "tokenAddress": "AAA111"},
            {"chainId": "ethereum", "tokenAddress": "0xdead"},
            {"chainId": "solana"},
            {"chainId": "solana", "tokenAddress": 42},
            "not an object",
            {"chainId": "solana", "tokenAddress": "BBB222"},
            {"chainId": "solana", "tokenAddress": "AAA111"},
        ]);
        let ids = extract_feed_identifiers(&payload, "solana").expect("list payload");
        assert_eq!(ids, vec!["AAA111", "BBB222"]);
    }

    #[test]
    fn feed_rejects_non_list_payload() {
        let err = extract_feed_identifiers(&json!({"pairs": []}), "solana").unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn document_extracts_capped_namespace_links() {
        let html = r#"
            <html><body>
              <a href="/solana/Pair1">one</a>
              <a href="https://dexscreener.com/solana/Pair2?maker=x">two</a>
              <a href="/ethereum/0xabc">wrong chain</a>
              <a href="/solana/Pair1">dup</a>
              <a href="/solana/">empty</a>
              <a href="/solana/Pair3/chart">three</a>
              <a href="/solana/Pair4">four</a>
            </body></html>
        "#;
        assert_eq!(
            extract_document_identifiers(html, "solana", 3),
            vec!["Pair1", "Pair2", "Pair3"]
        );
        assert_eq!(extract_document_identifiers(html, "solana", 10).len(), 4);
        assert!(extract_document_identifiers("<p>nothing</p>", "solana", 10).is_empty());
    }
}
