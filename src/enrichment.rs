//! Batched valuation lookups.
//!
//! Endpoint: `{base}/{namespace}/{id1,id2,...}`, e.g.
//! `https://api.dexscreener.com/tokens/v1/solana/{mints}`.
//! Returns: array of pair records with a nested `baseToken` object.
//!
//! Every field except the base token address is untrusted. Each parse site
//! below names the value it falls back to.

use crate::error::EnrichmentError;
use crate::scoring::parse_price;
use crate::types::{CandidateIdentifier, EnrichedRecord};
use futures_util::{stream, StreamExt};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

pub struct EnrichmentClient {
    client: Client,
    base_url: String,
    namespace: String,
    batch_size: usize,
    concurrency: usize,
    default_link: String,
}

impl EnrichmentClient {
    pub fn new(client: Client, base_url: &str, namespace: &str, default_link: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace: namespace.to_string(),
            batch_size: 30,
            concurrency: 4,
            default_link: default_link.to_string(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Contiguous batches of at most `batch_size`, fetched with bounded
    /// concurrency. A failed batch contributes no records; the others are
    /// unaffected. Output keeps batch order.
    pub async fn enrich(&self, identifiers: &[CandidateIdentifier]) -> Vec<EnrichedRecord> {
        if identifiers.is_empty() {
            return Vec::new();
        }

        let per_batch: Vec<Vec<EnrichedRecord>> = stream::iter(
            identifiers
                .chunks(self.batch_size)
                .map(<[CandidateIdentifier]>::to_vec)
                .enumerate(),
        )
        .map(|(index, batch)| async move { self.fetch_batch_or_empty(index, &batch).await })
        .buffered(self.concurrency)
        .collect()
        .await;

        per_batch.into_iter().flatten().collect()
    }

    async fn fetch_batch_or_empty(
        &self,
        index: usize,
        batch: &[CandidateIdentifier],
    ) -> Vec<EnrichedRecord> {
        match self.fetch_batch(batch).await {
            Ok(records) => {
                debug!(
                    "[Enrichment] batch {} ({} id(s)) -> {} record(s)",
                    index,
                    batch.len(),
                    records.len()
                );
                records
            }
            Err(e) => {
                warn!(
                    "[Enrichment] batch {} ({} id(s)) skipped: {}",
                    index,
                    batch.len(),
                    e
                );
                Vec::new()
            }
        }
    }

    pub fn batch_url(&self, batch: &[CandidateIdentifier]) -> String {
        format!("{}/{}/{}", self.base_url, self.namespace, batch.join(","))
    }

    pub async fn fetch_batch(
        &self,
        batch: &[CandidateIdentifier],
    ) -> Result<Vec<EnrichedRecord>, EnrichmentError> {
        let response = self.client.get(self.batch_url(batch)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichmentError::Status { status });
        }

        let body = response.text().await?;
        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| EnrichmentError::Malformed(format!("invalid JSON: {}", e)))?;
        parse_records(&payload, &self.default_link)
    }
}

/// Entries without a base token address are skipped.
pub fn parse_records(
    payload: &Value,
    default_link: &str,
) -> Result<Vec<EnrichedRecord>, EnrichmentError> {
    let entries = payload
        .as_array()
        .ok_or_else(|| EnrichmentError::Malformed("expected a JSON list".into()))?;
    Ok(entries
        .iter()
        .filter_map(|entry| parse_record(entry, default_link))
        .collect())
}

fn parse_record(entry: &Value, default_link: &str) -> Option<EnrichedRecord> {
    let base = entry.get("baseToken")?;
    let identifier: CandidateIdentifier = base
        .get("address")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|a| !a.is_empty())?
        .to_string();

    // Fallback: the identifier itself.
    let display_name = base
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .unwrap_or_else(|| identifier.clone());

    // Fallback: empty string, which every policy reads as price 0.
    let price_usd = match entry.get("priceUsd") {
        Some(Value::String(s)) if parse_price(s).is_some() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) if s.trim().is_empty() => String::new(),
        Some(other) => {
            debug!(
                "[Enrichment] {} has unparsable priceUsd {}, using empty",
                identifier, other
            );
            String::new()
        }
    };

    // Fallback: the canonical site root.
    let link = entry
        .get("url")
        .and_then(Value::as_str)
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(default_link)
        .to_string();

    let market_cap = safe_int(entry.get("marketCap"));
    let fully_diluted_valuation = safe_int(entry.get("fdv"));
    if market_cap == 0 || fully_diluted_valuation == 0 {
        debug!(
            "[Enrichment] {} has no usable market cap or fdv",
            identifier
        );
    }

    Some(EnrichedRecord {
        identifier,
        display_name,
        price_usd,
        market_cap,
        fully_diluted_valuation,
        link,
    })
}

/// Truncating integer read of a numeric or numeric-string field.
/// Fallback: `0` for absent, malformed, negative or non-finite values.
pub fn safe_int(value: Option<&Value>) -> u64 {
    let parsed = match value {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(exact) => return exact,
            None => n.as_f64(),
        },
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() && v > 0.0 => v.trunc() as u64,
        _ => 0,
    }
}
