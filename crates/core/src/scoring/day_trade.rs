//! Day-trade scorer: volume surge, RSI zone, MACD cross, ATR range, news
//! buzz, and a short-squeeze composite.

use crate::domain::{Category, ScoreBreakdown};
use crate::indicators::{self, Macd};
use crate::providers::{QuoteProvider, ShortInterestSignals, SignalProvider};
use crate::ratelimit::Pacer;
use crate::scoring::{clamp_composite, optional_signal, record, ScoredCandidate};
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct DayTradeConfig {
    /// Inclusive qualification threshold.
    pub min_score: f64,
    pub volume_lookback: usize,
    pub stop_atr_mult: f64,
    pub target_atr_mult: f64,
}

impl Default for DayTradeConfig {
    fn default() -> Self {
        Self {
            min_score: 30.0,
            volume_lookback: 10,
            stop_atr_mult: 1.5,
            target_atr_mult: 2.5,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Inputs {
    volume_ratio: f64,
    rsi: f64,
    macd: Option<Macd>,
    atr_pct: f64,
    buzz: Option<f64>,
    squeeze: Option<ShortInterestSignals>,
}

fn volume_surge_points(ratio: f64) -> f64 {
    if ratio > 5.0 {
        25.0
    } else if ratio > 3.0 {
        20.0
    } else if ratio > 2.0 {
        15.0
    } else if ratio > 1.5 {
        10.0
    } else {
        0.0
    }
}

fn rsi_zone_points(rsi: f64) -> f64 {
    if (30.0..=45.0).contains(&rsi) {
        20.0
    } else if (25.0..30.0).contains(&rsi) {
        15.0
    } else if rsi > 45.0 && rsi <= 60.0 {
        10.0
    } else {
        0.0
    }
}

fn macd_points(macd: &Macd) -> f64 {
    if macd.golden_cross() {
        15.0
    } else if macd.macd > macd.signal && macd.macd > 0.0 {
        10.0
    } else if macd.macd > macd.signal {
        5.0
    } else {
        0.0
    }
}

fn atr_range_points(atr_pct: f64) -> f64 {
    if (3.0..=8.0).contains(&atr_pct) {
        10.0
    } else if (2.0..3.0).contains(&atr_pct) {
        7.0
    } else if atr_pct > 8.0 {
        3.0
    } else {
        0.0
    }
}

fn buzz_points(buzz: f64) -> f64 {
    if buzz > 10.0 {
        5.0
    } else if buzz > 5.0 {
        3.0
    } else if buzz > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Additive squeeze sub-signals, composite capped at 25.
fn squeeze_points(s: &ShortInterestSignals) -> f64 {
    let mut pts: f64 = 0.0;
    if s.short_pct_float > 20.0 {
        pts += 10.0;
    } else if s.short_pct_float > 10.0 {
        pts += 5.0;
    }
    if s.short_interest_growth_30d_pct > 50.0 {
        pts += 5.0;
    }
    if s.ftd_volume_significant {
        pts += 5.0;
    }
    if s.on_threshold_list {
        pts += 10.0;
    }
    if s.zero_borrow {
        pts += 10.0;
    } else if s.borrow_rate_pct > 50.0 {
        pts += 5.0;
    }
    pts.min(25.0)
}

fn evaluate(inputs: &Inputs, cfg: &DayTradeConfig) -> Option<(f64, ScoreBreakdown)> {
    let mut breakdown = ScoreBreakdown::new();
    record(&mut breakdown, "volume_surge", volume_surge_points(inputs.volume_ratio));
    record(&mut breakdown, "rsi_zone", rsi_zone_points(inputs.rsi));
    if let Some(macd) = &inputs.macd {
        record(&mut breakdown, "macd_cross", macd_points(macd));
    }
    record(&mut breakdown, "atr_range", atr_range_points(inputs.atr_pct));
    if let Some(buzz) = inputs.buzz {
        record(&mut breakdown, "news_buzz", buzz_points(buzz));
    }
    if let Some(squeeze) = &inputs.squeeze {
        record(&mut breakdown, "squeeze", squeeze_points(squeeze));
    }

    let score = clamp_composite(breakdown.values().sum());
    if score >= cfg.min_score {
        Some((score, breakdown))
    } else {
        None
    }
}

pub struct DayTradeScorer<'a> {
    quotes: &'a dyn QuoteProvider,
    signals: &'a dyn SignalProvider,
    pacer: &'a Pacer,
    cfg: DayTradeConfig,
}

impl<'a> DayTradeScorer<'a> {
    pub fn new(
        quotes: &'a dyn QuoteProvider,
        signals: &'a dyn SignalProvider,
        pacer: &'a Pacer,
        cfg: DayTradeConfig,
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

        let Some(atr) = indicators::atr(bars, indicators::ATR_PERIOD) else {
            return Ok(None);
        };
        let Some(rsi) = indicators::rsi(&closes, indicators::RSI_PERIOD) else {
            return Ok(None);
        };
        let Some((support, resistance)) = indicators::support_resistance(bars, indicators::SR_LOOKBACK)
        else {
            return Ok(None);
        };
        let Some(volume_ratio) = volume_ratio(bars, self.cfg.volume_lookback) else {
            return Ok(None);
        };

        self.pacer.acquire().await;
        let buzz = optional_signal(self.signals.news_buzz(ticker).await, ticker, "news_buzz");
        self.pacer.acquire().await;
        let squeeze = optional_signal(
            self.signals.short_interest(ticker).await,
            ticker,
            "short_interest",
        );

        let inputs = Inputs {
            volume_ratio,
            rsi,
            macd: indicators::macd(&closes),
            atr_pct: atr / quote.price * 100.0,
            buzz,
            squeeze,
        };

        let Some((score, breakdown)) = evaluate(&inputs, &self.cfg) else {
            return Ok(None);
        };

        Ok(Some(ScoredCandidate {
            ticker: ticker.to_string(),
            category: Category::DayTrade,
            score,
            breakdown,
            price: quote.price,
            atr,
            support,
            resistance,
            entry_price: quote.price,
            stop_loss: quote.price - self.cfg.stop_atr_mult * atr,
            target_price: quote.price + self.cfg.target_atr_mult * atr,
        }))
    }
}

/// Last bar's volume against the average of the `lookback` bars before it.
fn volume_ratio(bars: &[crate::providers::Ohlcv], lookback: usize) -> Option<f64> {
    if lookback == 0 || bars.len() < lookback + 1 {
        return None;
    }
    let last = bars.last()?.volume;
    let prior = &bars[bars.len() - 1 - lookback..bars.len() - 1];
    let avg = prior.iter().map(|b| b.volume).sum::<f64>() / lookback as f64;
    if avg <= 0.0 {
        return None;
    }
    Some(last / avg)
}
