use crate::error::AlertError;
use crate::types::{AlertEvent, AnomalyVerdict};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

/// Delivers a formatted alert to a destination handle.
#[async_trait]
pub trait AlertTransport: Send + Sync {
    async fn send(&self, destination: &str, event: &AlertEvent) -> Result<(), AlertError>;
}

/// Posts chat embeds to a webhook URL; the URL is the destination handle.
#[derive(Clone)]
pub struct WebhookTransport {
    client: Client,
}

impl WebhookTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AlertTransport for WebhookTransport {
    async fn send(&self, destination: &str, event: &AlertEvent) -> Result<(), AlertError> {
        let response = self
            .client
            .post(destination)
            .header("Content-Type", "application/json")
            .json(&embed_payload(event))
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED => Err(
                AlertError::DestinationUnresolved(format!("webhook returned {}", response.status())),
            ),
            status => Err(AlertError::Rejected { status }),
        }
    }
}

pub fn embed_payload(event: &AlertEvent) -> Value {
    let mut fields = vec![
        json!({"name": "Token", "value": event.display_name, "inline": false}),
        json!({"name": "Price (USD)", "value": display_or_dash(&event.price_usd), "inline": true}),
        json!({"name": "FDV", "value": format_usd(event.fully_diluted_valuation), "inline": true}),
        json!({"name": "Market Cap", "value": format_usd(event.market_cap), "inline": true}),
    ];
    if let Some(digits) = &event.digit_summary {
        fields.push(json!({"name": "Price Digits", "value": digits.price_digits, "inline": true}));
        fields.push(json!({"name": "MCap Digits", "value": digits.market_cap_digits, "inline": true}));
    }
    fields.push(json!({"name": "Link", "value": event.link, "inline": false}));

    json!({
        "embeds": [{
            "title": "Token Alert",
            "color": 0xff9900,
            "fields": fields,
        }]
    })
}

fn display_or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

/// `$1,234,567`
pub fn format_usd(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Failed,
    Unresolved,
    /// Verdict was not triggered; nothing sent.
    Skipped,
}

pub struct AlertDispatcher {
    transport: Arc<dyn AlertTransport>,
    destination: Option<String>,
}

impl AlertDispatcher {
    pub fn new(transport: Arc<dyn AlertTransport>, destination: Option<String>) -> Self {
        Self { transport, destination }
    }

    /// Sends once, never retries and never returns an error.
    pub async fn dispatch(&self, verdict: &AnomalyVerdict) -> DispatchOutcome {
        if !verdict.triggered {
            return DispatchOutcome::Skipped;
        }
        let id = &verdict.record.identifier;

        let Some(destination) = self.destination.as_deref() else {
            error!("[Alert] No alert destination configured, dropping alert for {}", id);
            return DispatchOutcome::Unresolved;
        };

        let event = AlertEvent::from(verdict);
        match self.transport.send(destination, &event).await {
            Ok(()) => {
                info!("[Alert] Sent alert for {} ({}): {}", event.display_name, id, verdict.reason);
                DispatchOutcome::Sent
            }
            Err(AlertError::DestinationUnresolved(msg)) => {
                error!("[Alert] Destination unresolved for {}: {}", id, msg);
                DispatchOutcome::Unresolved
            }
            Err(e) => {
                error!("[Alert] Failed to send alert for {}: {}", id, e);
                DispatchOutcome::Failed
            }
        }
    }
}
