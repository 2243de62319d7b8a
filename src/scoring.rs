//! Anomaly scoring over enriched valuation records.
//!
//! Every policy compares fully diluted valuation against market cap; the
//! digit-based policies additionally compare a short "significant digit"
//! fingerprint of the price with the leading digits of the market cap.
//! Missing or unparsable fields arrive here as `0` / empty and are never an
//! error: scoring is total.

use crate::types::{AnomalyVerdict, DigitSummary, EnrichedRecord};
use std::str::FromStr;

/// Multiplier between unit price and market cap for a one billion supply.
const SCALED_SUPPLY: f64 = 1e9;

/// How fingerprints are derived: `precision` fraction digits before the
/// separator is stripped, `digits` characters kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintSpec {
    pub digits: usize,
    pub precision: usize,
}

impl Default for FingerprintSpec {
    fn default() -> Self {
        Self { digits: 4, precision: 12 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoringPolicy {
    /// FDV differs from market cap, both strictly positive.
    Equality,
    /// FDV differs from market cap, or the fingerprints differ in more than
    /// `max_mismatch` positions.
    DigitPrefix { max_mismatch: usize },
    /// FDV differs from market cap, or the fingerprints read as integers are
    /// more than `threshold` apart.
    DigitThreshold { threshold: u64 },
    /// FDV differs from market cap by at least one, or price scaled to a
    /// billion supply disagrees with market cap in both prefix and magnitude.
    ScaledMagnitude { alert_diff: f64 },
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::DigitPrefix { max_mismatch: 1 }
    }
}

impl ScoringPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Equality => "equality",
            Self::DigitPrefix { .. } => "digit-prefix",
            Self::DigitThreshold { .. } => "digit-threshold",
            Self::ScaledMagnitude { .. } => "scaled-magnitude",
        }
    }
}

/// Parses a policy name with default tuning; callers override the tuning
/// fields afterwards.
impl FromStr for ScoringPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "equality" => Ok(Self::Equality),
            "digit-prefix" => Ok(Self::DigitPrefix { max_mismatch: 1 }),
            "digit-threshold" => Ok(Self::DigitThreshold { threshold: 10 }),
            "scaled-magnitude" => Ok(Self::ScaledMagnitude { alert_diff: 1e-6 }),
            other => Err(format!(
                "unknown scoring policy '{}' (expected equality, digit-prefix, digit-threshold or scaled-magnitude)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer {
    pub policy: ScoringPolicy,
    pub fingerprint: FingerprintSpec,
}

impl Scorer {
    pub fn new(policy: ScoringPolicy, fingerprint: FingerprintSpec) -> Self {
        Self { policy, fingerprint }
    }

    pub fn score(&self, record: &EnrichedRecord) -> AnomalyVerdict {
        let fdv = record.fully_diluted_valuation;
        let mcap = record.market_cap;

        let (triggered, reason, digits) = match self.policy {
            ScoringPolicy::Equality => {
                let triggered = fdv != mcap && fdv > 0 && mcap > 0;
                (triggered, valuation_reason(fdv, mcap), None)
            }
            ScoringPolicy::DigitPrefix { max_mismatch } => {
                let summary = self.digit_summary(record);
                let mismatches = mismatch_count(&summary.price_digits, &summary.market_cap_digits);
                let reason = if fdv != mcap {
                    valuation_reason(fdv, mcap)
                } else {
                    format!(
                        "price digits {} vs market cap digits {} ({} mismatched)",
                        summary.price_digits, summary.market_cap_digits, mismatches
                    )
                };
                (fdv != mcap || mismatches > max_mismatch, reason, Some(summary))
            }
            ScoringPolicy::DigitThreshold { threshold } => {
                let summary = self.digit_summary(record);
                // Fingerprints are digit strings; anything else reads as 0.
                let price_value = summary.price_digits.parse::<u64>().unwrap_or(0);
                let mcap_value = summary.market_cap_digits.parse::<u64>().unwrap_or(0);
                let gap = price_value.abs_diff(mcap_value);
                let reason = if fdv != mcap {
                    valuation_reason(fdv, mcap)
                } else {
                    format!(
                        "price digits {} vs market cap digits {} (gap {}, threshold {})",
                        summary.price_digits, summary.market_cap_digits, gap, threshold
                    )
                };
                (fdv != mcap || gap > threshold, reason, Some(summary))
            }
            ScoringPolicy::ScaledMagnitude { alert_diff } => {
                let width = self.fingerprint.digits;
                let scaled = parse_price(&record.price_usd).unwrap_or(0.0).abs() * SCALED_SUPPLY;
                let scaled_digits = fingerprint_digits(&format!("{:.0}", scaled.round()), width);
                let mcap_digits = market_cap_fingerprint(mcap, width);
                let magnitude_gap = (scaled - mcap as f64).abs();

                let valuation_gap = fdv.abs_diff(mcap) >= 1;
                let scaled_gap =
                    scaled_digits != mcap_digits && magnitude_gap >= alert_diff * SCALED_SUPPLY;
                let reason = if valuation_gap {
                    valuation_reason(fdv, mcap)
                } else {
                    format!(
                        "scaled price {:.0} vs market cap {} (prefix {} vs {})",
                        scaled, mcap, scaled_digits, mcap_digits
                    )
                };
                let summary = DigitSummary {
                    price_digits: scaled_digits,
                    market_cap_digits: mcap_digits,
                };
                (valuation_gap || scaled_gap, reason, Some(summary))
            }
        };

        AnomalyVerdict {
            record: record.clone(),
            triggered,
            reason,
            digits,
        }
    }

    fn digit_summary(&self, record: &EnrichedRecord) -> DigitSummary {
        DigitSummary {
            price_digits: price_fingerprint(&record.price_usd, self.fingerprint),
            market_cap_digits: market_cap_fingerprint(record.market_cap, self.fingerprint.digits),
        }
    }
}

fn valuation_reason(fdv: u64, mcap: u64) -> String {
    if fdv == mcap {
        format!("fdv equals market cap ({})", mcap)
    } else {
        format!("fdv {} differs from market cap {}", fdv, mcap)
    }
}

/// Parses a reported price. Fallback: `None` for empty, malformed or
/// non-finite input.
pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Strips the decimal separator and leading zeros, then truncates or
/// right-pads with `'0'` to exactly `width` characters.
pub fn fingerprint_digits(raw: &str, width: usize) -> String {
    let stripped: String = raw.chars().filter(|&c| c != '.').collect();
    let mut out: String = stripped.trim_start_matches('0').chars().take(width).collect();
    while out.chars().count() < width {
        out.push('0');
    }
    out
}

/// Fingerprint of a price string. Fallback: all zeros when the price is
/// zero or unparsable.
pub fn price_fingerprint(price: &str, spec: FingerprintSpec) -> String {
    match parse_price(price) {
        Some(p) if p != 0.0 => {
            fingerprint_digits(&format!("{:.*}", spec.precision, p.abs()), spec.digits)
        }
        _ => "0".repeat(spec.digits),
    }
}

pub fn market_cap_fingerprint(market_cap: u64, width: usize) -> String {
    fingerprint_digits(&market_cap.to_string(), width)
}

/// Position-wise mismatches. Strings of different length count as fully
/// mismatched: the result is the longer length.
pub fn mismatch_count(a: &str, b: &str) -> usize {
    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    if len_a != len_b {
        return len_a.max(len_b);
    }
    a.chars().zip(b.chars()).filter(|(x, y)| x != y).count()
}
