//! Category scorers. Each consumes one ticker plus fact-provider data and
//! produces a bounded composite score, or rejects the ticker.
//!
//! Failure semantics: a missing quote (or history too short for the base
//! indicators) rejects the ticker; a missing optional signal contributes
//! zero and is logged at debug. Neither is an error past this boundary.

pub mod day_trade;
pub mod longterm;
pub mod swing;

use crate::domain::{Category, ScoreBreakdown};

pub use day_trade::{DayTradeConfig, DayTradeScorer};
pub use longterm::{LongTermConfig, LongTermScorer};
pub use swing::{SwingConfig, SwingScorer};

/// A candidate that cleared its category threshold, before enrichment.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub ticker: String,
    pub category: Category,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub price: f64,
    pub atr: f64,
    pub support: f64,
    pub resistance: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target_price: f64,
}

/// Composite scores are clamped to [0, 100] after summing the independently
/// capped factors.
pub fn clamp_composite(raw: f64) -> f64 {
    raw.clamp(0.0, 100.0)
}

/// Unwraps an optional external signal: a failure means "signal missing",
/// contributing zero to the composite.
pub(crate) fn optional_signal<T>(
    res: anyhow::Result<T>,
    ticker: &str,
    signal: &'static str,
) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(err) => {
            tracing::debug!(ticker, signal, error = %err, "optional signal unavailable; omitted");
            None
        }
    }
}

/// Records a factor in the breakdown when it contributed points.
pub(crate) fn record(breakdown: &mut ScoreBreakdown, name: &str, points: f64) {
    if points != 0.0 {
        breakdown.insert(name.to_string(), points);
    }
}
