//! Shared indicator math for the category scorers.
//!
//! All functions are pure and return `None` when the series is too short
//! for the requested period, so callers can treat "not enough history" the
//! same way as "quote unavailable".

use crate::providers::Ohlcv;

pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const SR_LOOKBACK: usize = 20;

pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    Some(values[values.len() - period..].iter().sum::<f64>() / period as f64)
}

pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = values[..period].iter().sum::<f64>() / period as f64;
    for v in &values[period..] {
        ema = v * k + ema * (1.0 - k);
    }
    Some(ema)
}

/// Wilder-smoothed RSI: seed with the simple average of the first `period`
/// gains/losses, then `avg = (avg * (period - 1) + current) / period`.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss += -change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    for i in (period + 1)..closes.len() {
        let change = closes[i] - closes[i - 1];
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

#[derive(Debug, Clone, Copy)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub prev_macd: f64,
    pub prev_signal: f64,
}

impl Macd {
    /// Fast line crossed above the signal line between the two most recent bars.
    pub fn golden_cross(&self) -> bool {
        self.prev_macd - self.prev_signal <= 0.0 && self.macd - self.signal > 0.0
    }

    pub fn death_cross(&self) -> bool {
        self.prev_macd - self.prev_signal >= 0.0 && self.macd - self.signal < 0.0
    }
}

/// 12/26 EMA difference with a 9-period EMA signal line. Returns the last
/// two points of both lines so cross detection stays local to the result.
pub fn macd(closes: &[f64]) -> Option<Macd> {
    if closes.len() < MACD_SLOW + MACD_SIGNAL + 1 {
        return None;
    }

    let k_fast = 2.0 / (MACD_FAST as f64 + 1.0);
    let k_slow = 2.0 / (MACD_SLOW as f64 + 1.0);

    let mut fast = closes[..MACD_FAST].iter().sum::<f64>() / MACD_FAST as f64;
    let mut slow = closes[..MACD_SLOW].iter().sum::<f64>() / MACD_SLOW as f64;

    let mut macd_series = Vec::with_capacity(closes.len() - MACD_SLOW);
    for (i, v) in closes.iter().enumerate().skip(MACD_FAST) {
        fast = v * k_fast + fast * (1.0 - k_fast);
        if i >= MACD_SLOW {
            slow = v * k_slow + slow * (1.0 - k_slow);
            macd_series.push(fast - slow);
        }
    }

    if macd_series.len() < MACD_SIGNAL + 1 {
        return None;
    }

    let k_sig = 2.0 / (MACD_SIGNAL as f64 + 1.0);
    let mut signal = macd_series[..MACD_SIGNAL].iter().sum::<f64>() / MACD_SIGNAL as f64;
    let mut prev_signal = signal;
    for v in &macd_series[MACD_SIGNAL..] {
        prev_signal = signal;
        signal = v * k_sig + signal * (1.0 - k_sig);
    }

    let macd = *macd_series.last()?;
    let prev_macd = macd_series[macd_series.len() - 2];

    Some(Macd {
        macd,
        signal,
        prev_macd,
        prev_signal,
    })
}

fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

/// Rolling mean of true range over the trailing `period` bars.
pub fn atr(bars: &[Ohlcv], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }
    let start = bars.len() - period;
    let mut sum = 0.0;
    for i in start..bars.len() {
        sum += true_range(bars[i].high, bars[i].low, bars[i - 1].close);
    }
    Some(sum / period as f64)
}

/// Trailing `lookback`-bar low/high, used as 20-day support/resistance.
pub fn support_resistance(bars: &[Ohlcv], lookback: usize) -> Option<(f64, f64)> {
    if lookback == 0 || bars.len() < lookback {
        return None;
    }
    let window = &bars[bars.len() - lookback..];
    let mut support = f64::MAX;
    let mut resistance = f64::MIN;
    for bar in window {
        support = support.min(bar.low);
        resistance = resistance.max(bar.high);
    }
    Some((support, resistance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(high: f64, low: f64, close: f64, volume: f64) -> Ohlcv {
        Ohlcv {
            date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn sma_requires_enough_values() {
        assert_eq!(sma(&[1.0, 2.0], 3), None);
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0], 2), Some(3.5));
    }

    #[test]
    fn rsi_is_100_on_monotone_gains() {
        let closes: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
        assert_eq!(rsi(&closes, RSI_PERIOD), Some(100.0));
    }

    #[test]
    fn rsi_is_low_on_monotone_losses() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let v = rsi(&closes, RSI_PERIOD).unwrap();
        assert!(v < 1.0, "got {v}");
    }

    #[test]
    fn rsi_is_bounded() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 50.0 + ((i * 7) % 13) as f64 - 6.0)
            .collect();
        let v = rsi(&closes, RSI_PERIOD).unwrap();
        assert!((0.0..=100.0).contains(&v));
    }

    #[test]
    fn macd_none_on_short_series() {
        let closes: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert!(macd(&closes).is_none());
    }

    #[test]
    fn macd_detects_golden_cross_after_reversal() {
        // Long decline, then a sharp rally: the fast line crosses up through
        // the signal line somewhere in the rally.
        let mut closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        let mut crossed = false;
        for i in 0..30 {
            closes.push(140.0 + (i as f64) * 4.0);
            if let Some(m) = macd(&closes) {
                if m.golden_cross() {
                    crossed = true;
                    break;
                }
            }
        }
        assert!(crossed, "expected a golden cross during the rally");
    }

    #[test]
    fn atr_matches_constant_range() {
        let bars: Vec<Ohlcv> = (0..20).map(|_| bar(12.0, 10.0, 11.0, 1000.0)).collect();
        let v = atr(&bars, ATR_PERIOD).unwrap();
        assert!((v - 2.0).abs() < 1e-9);
    }

    #[test]
    fn support_resistance_is_trailing_window_extremes() {
        let mut bars: Vec<Ohlcv> = (0..30)
            .map(|i| bar(20.0 + i as f64 * 0.1, 19.0, 19.5, 1000.0))
            .collect();
        bars.push(bar(50.0, 5.0, 25.0, 1000.0));
        let (s, r) = support_resistance(&bars, SR_LOOKBACK).unwrap();
        assert_eq!(s, 5.0);
        assert_eq!(r, 50.0);
    }
}
