use serde::Serialize;
use std::time::Duration;

/// Address-like token naming one asset within a chain namespace.
pub type CandidateIdentifier = String;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    pub identifier: CandidateIdentifier,
    pub display_name: String,
    /// Raw price as reported; empty when absent.
    pub price_usd: String,
    pub market_cap: u64,
    pub fully_diluted_valuation: u64,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigitSummary { pub price_digits: String, pub market_cap_digits: String }

#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyVerdict { pub record: EnrichedRecord, pub triggered: bool, pub reason: String, pub digits: Option<DigitSummary> }

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub display_name: String,
    pub link: String,
    pub price_usd: String,
    pub market_cap: u64,
    pub fully_diluted_valuation: u64,
    pub digit_summary: Option<DigitSummary>,
}

impl From<&AnomalyVerdict> for AlertEvent {
    fn from(verdict: &AnomalyVerdict) -> Self {
        let r = &verdict.record;
        Self {
            display_name: r.display_name.clone(),
            link: r.link.clone(),
            price_usd: r.price_usd.clone(),
            market_cap: r.market_cap,
            fully_diluted_valuation: r.fully_diluted_valuation,
            digit_summary: verdict.digits.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum SchedulerState { #[default] Idle, CycleRunning, Sleeping, Stopped }

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::CycleRunning => "cycle_running",
            Self::Sleeping => "sleeping",
            Self::Stopped => "stopped",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub discovered: usize,
    pub enriched: usize,
    pub triggered: usize,
    pub dispatched: usize,
    pub failed: usize,
    pub unresolved: usize,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}
