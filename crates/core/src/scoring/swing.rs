//! Swing scorer: oversold RSI, MACD cross, price position against the
//! 20/50-day averages, sector catalysts, and options positioning.

use crate::domain::{Category, ScoreBreakdown};
use crate::indicators::{self, Macd};
use crate::providers::{QuoteProvider, SignalProvider};
use crate::ratelimit::Pacer;
use crate::scoring::{clamp_composite, optional_signal, record, ScoredCandidate};
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct SwingConfig {
    pub min_score: f64,
    /// Band around the 20-day average that counts as "testing support".
    pub ma_support_band_pct: f64,
    /// Points per sector catalyst signal, composite capped at 25.
    pub catalyst_points_per_signal: f64,
    pub stop_support_mult: f64,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            min_score: 30.0,
            ma_support_band_pct: 2.0,
            catalyst_points_per_signal: 8.0,
            stop_support_mult: 0.97,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Inputs {
    price: f64,
    prev_close: f64,
    rsi: f64,
    macd: Option<Macd>,
    ma20: f64,
    prev_ma20: f64,
    ma50: Option<f64>,
    catalyst_count: Option<u32>,
    max_pain: Option<f64>,
}

fn rsi_points(rsi: f64) -> f64 {
    if (25.0..=40.0).contains(&rsi) {
        25.0
    } else if rsi > 40.0 && rsi <= 55.0 {
        15.0
    } else if rsi < 25.0 {
        10.0
    } else {
        0.0
    }
}

fn macd_points(macd: &Macd) -> f64 {
    if macd.golden_cross() {
        20.0
    } else if macd.macd > macd.signal {
        10.0
    } else {
        0.0
    }
}

fn ma_position_points(inputs: &Inputs, cfg: &SwingConfig) -> f64 {
    // Freshly reclaimed 20-day average beats sitting on it.
    if inputs.prev_close <= inputs.prev_ma20 && inputs.price > inputs.ma20 {
        return 20.0;
    }
    let band = inputs.ma20 * cfg.ma_support_band_pct / 100.0;
    if (inputs.price - inputs.ma20).abs() <= band {
        return 15.0;
    }
    if let Some(ma50) = inputs.ma50 {
        if inputs.price > ma50 {
            return 10.0;
        }
    }
    0.0
}

fn catalyst_points(count: u32, cfg: &SwingConfig) -> f64 {
    (count as f64 * cfg.catalyst_points_per_signal).min(25.0)
}

fn options_points(price: f64, max_pain: f64) -> f64 {
    if price < max_pain {
        10.0
    } else if price > max_pain * 1.05 {
        -5.0
    } else {
        0.0
    }
}

fn evaluate(inputs: &Inputs, cfg: &SwingConfig) -> Option<(f64, ScoreBreakdown)> {
    let mut breakdown = ScoreBreakdown::new();
    record(&mut breakdown, "rsi_zone", rsi_points(inputs.rsi));
    if let Some(macd) = &inputs.macd {
        record(&mut breakdown, "macd_cross", macd_points(macd));
    }
    record(&mut breakdown, "ma_position", ma_position_points(inputs, cfg));
    if let Some(count) = inputs.catalyst_count {
        record(&mut breakdown, "sector_catalyst", catalyst_points(count, cfg));
    }
    if let Some(max_pain) = inputs.max_pain {
        record(
            &mut breakdown,
            "options_positioning",
            options_points(inputs.price, max_pain),
        );
    }

    let score = clamp_composite(breakdown.values().sum());
    if score >= cfg.min_score {
        Some((score, breakdown))
    } else {
        None
    }
}

pub struct SwingScorer<'a> {
    quotes: &'a dyn QuoteProvider,
    signals: &'a dyn SignalProvider,
    pacer: &'a Pacer,
    cfg: SwingConfig,
}

impl<'a> SwingScorer<'a> {
    pub fn new(
        quotes: &'a dyn QuoteProvider,
        signals: &'a dyn SignalProvider,
        pacer: &'a Pacer,
        cfg: SwingConfig,
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
        if closes.len() < 22 {
            return Ok(None);
        }

        let Some(rsi) = indicators::rsi(&closes, indicators::RSI_PERIOD) else {
            return Ok(None);
        };
        let Some(ma20) = indicators::sma(&closes, 20) else {
            return Ok(None);
        };
        let Some(prev_ma20) = indicators::sma(&closes[..closes.len() - 1], 20) else {
            return Ok(None);
        };
        let Some(atr) = indicators::atr(bars, indicators::ATR_PERIOD) else {
            return Ok(None);
        };
        let Some((support, resistance)) = indicators::support_resistance(bars, indicators::SR_LOOKBACK)
        else {
            return Ok(None);
        };

        let sector = quote.fundamentals.sector.as_deref();
        let industry = quote.fundamentals.industry.as_deref();

        self.pacer.acquire().await;
        let catalysts = optional_signal(
            self.signals.sector_catalysts(ticker, sector, industry).await,
            ticker,
            "sector_catalysts",
        );
        self.pacer.acquire().await;
        let max_pain = optional_signal(
            self.signals.options_max_pain(ticker).await,
            ticker,
            "options_max_pain",
        )
        .flatten();

        let inputs = Inputs {
            price: quote.price,
            prev_close: closes[closes.len() - 2],
            rsi,
            macd: indicators::macd(&closes),
            ma20,
            prev_ma20,
            ma50: indicators::sma(&closes, 50),
            catalyst_count: catalysts.map(|c| c.signal_count),
            max_pain,
        };

        let Some((score, breakdown)) = evaluate(&inputs, &self.cfg) else {
            return Ok(None);
        };

        Ok(Some(ScoredCandidate {
            ticker: ticker.to_string(),
            category: Category::Swing,
            score,
            breakdown,
            price: quote.price,
            atr,
            support,
            resistance,
            entry_price: quote.price,
            stop_loss: support * self.cfg.stop_support_mult,
            target_price: resistance,
        }))
    }
}
