//! Long-term scorer: continuous curves over fundamentals (dividend yield,
//! P/E, 52-week range position, total return, volatility, payout sanity)
//! plus institutional-ownership and relative-valuation bonuses.

use crate::domain::{Category, ScoreBreakdown};
use crate::indicators;
use crate::providers::{InstitutionalSignal, QuoteProvider, RelativeValuation, SignalProvider};
use crate::ratelimit::Pacer;
use crate::scoring::{clamp_composite, optional_signal, record, ScoredCandidate};
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct LongTermConfig {
    pub min_score: f64,
    pub stop_pct: f64,
    pub target_pct: f64,
}

impl Default for LongTermConfig {
    fn default() -> Self {
        Self {
            min_score: 35.0,
            stop_pct: 0.85,
            target_pct: 1.25,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Inputs {
    dividend_yield_pct: Option<f64>,
    pe_ratio: Option<f64>,
    /// Fractional position in the 52-week range, 0 = at the low.
    range_position: Option<f64>,
    return_1y_pct: Option<f64>,
    daily_return_stdev_pct: Option<f64>,
    payout_ratio_pct: Option<f64>,
    institutional: Option<InstitutionalSignal>,
}

/// Linear up to 25 points at a 5% yield.
fn dividend_yield_points(yield_pct: f64) -> f64 {
    if yield_pct <= 0.0 {
        return 0.0;
    }
    (yield_pct / 5.0 * 25.0).min(25.0)
}

/// Triangular: 20 points across the 10-20 band, decaying to zero outside.
fn pe_points(pe: f64) -> f64 {
    if pe <= 0.0 {
        0.0
    } else if pe < 10.0 {
        20.0 * pe / 10.0
    } else if pe <= 20.0 {
        20.0
    } else {
        (20.0 - (pe - 20.0)).max(0.0)
    }
}

/// Full 20 points in the 0.2-0.5 band, decaying toward either extreme.
fn range_position_points(pos: f64) -> f64 {
    let pos = pos.clamp(0.0, 1.0);
    if (0.2..=0.5).contains(&pos) {
        20.0
    } else if pos < 0.2 {
        20.0 * pos / 0.2
    } else {
        (20.0 * (1.0 - (pos - 0.5) / 0.5)).max(0.0)
    }
}

fn total_return_points(ret_pct: f64) -> f64 {
    if ret_pct >= 0.0 {
        (ret_pct * 0.5).min(15.0)
    } else {
        (10.0 + ret_pct * 0.5).max(0.0)
    }
}

fn inverse_volatility_points(stdev_pct: f64) -> f64 {
    (10.0 - 3.0 * stdev_pct).max(0.0)
}

/// Full credit for a dividend with a 20-80% payout ratio; partial credit
/// for any dividend outside (or without) that band.
fn payout_points(pays_dividend: bool, payout_ratio_pct: Option<f64>) -> f64 {
    if !pays_dividend {
        return 0.0;
    }
    match payout_ratio_pct {
        Some(r) if (20.0..=80.0).contains(&r) => 10.0,
        _ => 5.0,
    }
}

fn institutional_bonus(signal: &InstitutionalSignal) -> (f64, f64) {
    let ownership = if signal.ownership_pct > 60.0 {
        10.0
    } else if signal.ownership_pct > 40.0 {
        5.0
    } else {
        0.0
    };
    let valuation = match signal.relative_valuation {
        RelativeValuation::Undervalued => 10.0,
        RelativeValuation::Overvalued => -5.0,
        RelativeValuation::Fair => 0.0,
    };
    (ownership, valuation)
}

fn evaluate(inputs: &Inputs, cfg: &LongTermConfig) -> Option<(f64, ScoreBreakdown)> {
    let mut breakdown = ScoreBreakdown::new();
    let pays_dividend = inputs.dividend_yield_pct.map(|y| y > 0.0).unwrap_or(false);

    if let Some(y) = inputs.dividend_yield_pct {
        record(&mut breakdown, "dividend_yield", dividend_yield_points(y));
    }
    if let Some(pe) = inputs.pe_ratio {
        record(&mut breakdown, "pe_ratio", pe_points(pe));
    }
    if let Some(pos) = inputs.range_position {
        record(&mut breakdown, "range_position", range_position_points(pos));
    }
    if let Some(ret) = inputs.return_1y_pct {
        record(&mut breakdown, "total_return", total_return_points(ret));
    }
    if let Some(stdev) = inputs.daily_return_stdev_pct {
        record(&mut breakdown, "low_volatility", inverse_volatility_points(stdev));
    }
    record(
        &mut breakdown,
        "payout_sanity",
        payout_points(pays_dividend, inputs.payout_ratio_pct),
    );

    // Bonuses sit on top of the base factors, then the composite is clamped.
    if let Some(signal) = &inputs.institutional {
        let (ownership, valuation) = institutional_bonus(signal);
        record(&mut breakdown, "institutional", ownership);
        record(&mut breakdown, "relative_valuation", valuation);
    }

    let score = clamp_composite(breakdown.values().sum());
    if score >= cfg.min_score {
        Some((score, breakdown))
    } else {
        None
    }
}

pub struct LongTermScorer<'a> {
    quotes: &'a dyn QuoteProvider,
    signals: &'a dyn SignalProvider,
    pacer: &'a Pacer,
    cfg: LongTermConfig,
}

impl<'a> LongTermScorer<'a> {
    pub fn new(
        quotes: &'a dyn QuoteProvider,
        signals: &'a dyn SignalProvider,
        pacer: &'a Pacer,
        cfg: LongTermConfig,
    ) -> Self {
        Self {
            quotes,
            signals,
            pacer,
            cfg,
        }
    }

    pub async fn score(&self, ticker: &str) -> Result<Option<ScoredCandidate>> {
        self.pacer.acquire().await;
        let quote = match self.quotes.get_quote(ticker).await {
            Ok(q) => q,
            Err(err) => {
                tracing::warn!(ticker, error = %err, "quote unavailable; rejecting candidate");
                return Ok(None);
            }
        };

        let bars = &quote.history;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        if closes.len() < 30 {
            return Ok(None);
        }

        let Some(atr) = indicators::atr(bars, indicators::ATR_PERIOD) else {
            return Ok(None);
        };
        let Some((support, resistance)) = indicators::support_resistance(bars, indicators::SR_LOOKBACK)
        else {
            return Ok(None);
        };

        self.pacer.acquire().await;
        let institutional = optional_signal(
            self.signals.institutional(ticker).await,
            ticker,
            "institutional",
        );

        let f = &quote.fundamentals;
        let inputs = Inputs {
            dividend_yield_pct: f.dividend_yield_pct,
            pe_ratio: f.pe_ratio,
            range_position: range_position(quote.price, f.week52_low, f.week52_high, &closes),
            return_1y_pct: return_1y_pct(&closes),
            daily_return_stdev_pct: daily_return_stdev_pct(&closes),
            payout_ratio_pct: f.payout_ratio_pct,
            institutional,
        };

        let Some((score, breakdown)) = evaluate(&inputs, &self.cfg) else {
            return Ok(None);
        };

        Ok(Some(ScoredCandidate {
            ticker: ticker.to_string(),
            category: Category::LongTerm,
            score,
            breakdown,
            price: quote.price,
            atr,
            support,
            resistance,
            entry_price: quote.price,
            stop_loss: quote.price * self.cfg.stop_pct,
            target_price: quote.price * self.cfg.target_pct,
        }))
    }
}

/// Position within the 52-week range, from fundamentals when available,
/// otherwise from the history extremes.
fn range_position(
    price: f64,
    week52_low: Option<f64>,
    week52_high: Option<f64>,
    closes: &[f64],
) -> Option<f64> {
    let (low, high) = match (week52_low, week52_high) {
        (Some(l), Some(h)) => (l, h),
        _ => {
            let low = closes.iter().cloned().fold(f64::MAX, f64::min);
            let high = closes.iter().cloned().fold(f64::MIN, f64::max);
            (low, high)
        }
    };
    if high <= low {
        return None;
    }
    Some((price - low) / (high - low))
}

fn return_1y_pct(closes: &[f64]) -> Option<f64> {
    let first = *closes.first()?;
    let last = *closes.last()?;
    if first <= 0.0 {
        return None;
    }
    Some((last / first - 1.0) * 100.0)
}

fn daily_return_stdev_pct(closes: &[f64]) -> Option<f64> {
    if closes.len() < 2 {
        return None;
    }
    let mut returns = Vec::with_capacity(closes.len() - 1);
    for w in closes.windows(2) {
        if w[0] <= 0.0 {
            return None;
        }
        returns.push(w[1] / w[0] - 1.0);
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    Some(var.sqrt() * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dividend_yield_scales_linearly_to_its_cap() {
        assert_eq!(dividend_yield_points(0.0), 0.0);
        assert_eq!(dividend_yield_points(2.5), 12.5);
        assert_eq!(dividend_yield_points(5.0), 25.0);
        assert_eq!(dividend_yield_points(9.0), 25.0);
    }

    #[test]
    fn pe_curve_peaks_in_the_value_band() {
        assert_eq!(pe_points(-3.0), 0.0);
        assert_eq!(pe_points(5.0), 10.0);
        assert_eq!(pe_points(15.0), 20.0);
        assert_eq!(pe_points(30.0), 10.0);
        assert_eq!(pe_points(45.0), 0.0);
    }

    #[test]
    fn range_position_rewards_the_lower_middle() {
        assert_eq!(range_position_points(0.3), 20.0);
        assert_eq!(range_position_points(0.1), 10.0);
        assert_eq!(range_position_points(1.0), 0.0);
        assert_eq!(range_position_points(0.75), 10.0);
    }

    #[test]
    fn negative_return_gets_partial_credit_with_a_floor() {
        assert_eq!(total_return_points(20.0), 10.0);
        assert_eq!(total_return_points(50.0), 15.0);
        assert_eq!(total_return_points(-10.0), 5.0);
        assert_eq!(total_return_points(-60.0), 0.0);
    }

    #[test]
    fn payout_band_gets_full_credit_outside_partial() {
        assert_eq!(payout_points(true, Some(50.0)), 10.0);
        assert_eq!(payout_points(true, Some(95.0)), 5.0);
        assert_eq!(payout_points(true, None), 5.0);
        assert_eq!(payout_points(false, Some(50.0)), 0.0);
    }

    #[test]
    fn threshold_is_inclusive_at_35() {
        // P/E 15 (20) + yield 2.0 (10) + payout outside band (5) = 35.0.
        let inputs = Inputs {
            pe_ratio: Some(15.0),
            dividend_yield_pct: Some(2.0),
            payout_ratio_pct: Some(90.0),
            ..Inputs::default()
        };
        let cfg = LongTermConfig::default();
        let (score, _) = evaluate(&inputs, &cfg).unwrap();
        assert_eq!(score, 35.0);

        let slightly_less = Inputs {
            dividend_yield_pct: Some(1.98), // 9.9 points -> 34.9 total
            ..inputs
        };
        assert!(evaluate(&slightly_less, &cfg).is_none());
    }

    #[test]
    fn bonuses_layer_on_top_and_overvaluation_subtracts() {
        let base = Inputs {
            pe_ratio: Some(15.0),
            dividend_yield_pct: Some(4.0),
            payout_ratio_pct: Some(50.0),
            ..Inputs::default()
        };
        let cfg = LongTermConfig::default();
        let (base_score, _) = evaluate(&base, &cfg).unwrap();
        assert_eq!(base_score, 50.0);

        let boosted = Inputs {
            institutional: Some(InstitutionalSignal {
                ownership_pct: 70.0,
                relative_valuation: RelativeValuation::Undervalued,
            }),
            ..base.clone()
        };
        let (score, breakdown) = evaluate(&boosted, &cfg).unwrap();
        assert_eq!(score, 70.0);
        assert_eq!(breakdown["institutional"], 10.0);
        assert_eq!(breakdown["relative_valuation"], 10.0);

        let dragged = Inputs {
            institutional: Some(InstitutionalSignal {
                ownership_pct: 50.0,
                relative_valuation: RelativeValuation::Overvalued,
            }),
            ..base
        };
        let (score, breakdown) = evaluate(&dragged, &cfg).unwrap();
        assert_eq!(score, 50.0); // +5 ownership, -5 valuation
        assert_eq!(breakdown["relative_valuation"], -5.0);
    }

    #[test]
    fn composite_is_clamped_to_100_with_bonuses() {
        let inputs = Inputs {
            dividend_yield_pct: Some(5.0),
            pe_ratio: Some(15.0),
            range_position: Some(0.3),
            return_1y_pct: Some(40.0),
            daily_return_stdev_pct: Some(0.5),
            payout_ratio_pct: Some(50.0),
            institutional: Some(InstitutionalSignal {
                ownership_pct: 70.0,
                relative_valuation: RelativeValuation::Undervalued,
            }),
        };
        // Base 25+20+20+15+8.5+10 = 98.5, bonuses +20 -> clamped.
        let (score, _) = evaluate(&inputs, &LongTermConfig::default()).unwrap();
        assert_eq!(score, 100.0);
    }

    #[test]
    fn stdev_helper_is_zero_for_constant_series() {
        let closes = vec![10.0; 40];
        assert_eq!(daily_return_stdev_pct(&closes), Some(0.0));
    }

    #[test]
    fn range_position_falls_back_to_history() {
        let closes: Vec<f64> = (0..10).map(|i| 10.0 + i as f64).collect();
        let pos = range_position(12.0, None, None, &closes).unwrap();
        assert!((pos - 2.0 / 9.0).abs() < 1e-9);
    }
}
