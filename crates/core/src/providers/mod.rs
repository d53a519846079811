//! Fact-provider contracts. Providers return structured facts only; all
//! scoring lives in `crate::scoring`.
//!
//! Callers decide how a failure propagates: quote errors make the scorer
//! reject the ticker, optional-signal errors are treated as missing and
//! contribute zero.

pub mod http;

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use http::HttpFactProvider;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ohlcv {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fundamentals {
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield_pct: Option<f64>,
    pub payout_ratio_pct: Option<f64>,
    pub week52_high: Option<f64>,
    pub week52_low: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: String,
    pub price: f64,
    /// Daily bars, oldest first. Scorers need ~1 year for the long-term
    /// factors and at least 36 bars for MACD.
    pub history: Vec<Ohlcv>,
    #[serde(default)]
    pub fundamentals: Fundamentals,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShortInterestSignals {
    pub short_pct_float: f64,
    pub short_interest_growth_30d_pct: f64,
    pub ftd_volume_significant: bool,
    pub on_threshold_list: bool,
    pub borrow_rate_pct: f64,
    pub zero_borrow: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectorCatalystSignals {
    pub signal_count: u32,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeValuation {
    Undervalued,
    Fair,
    Overvalued,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionalSignal {
    pub ownership_pct: f64,
    pub relative_valuation: RelativeValuation,
}

/// Live equity-screen filter used by the swing screener.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenCriteria {
    pub min_price: f64,
    pub min_market_cap: f64,
    pub max_market_cap: f64,
    pub rsi_below: f64,
}

impl Default for ScreenCriteria {
    fn default() -> Self {
        Self {
            min_price: 5.0,
            min_market_cap: 2_000_000_000.0,
            max_market_cap: 50_000_000_000.0,
            rsi_below: 40.0,
        }
    }
}

#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn get_quote(&self, ticker: &str) -> Result<Quote>;
}

/// Optional facts. Every method may fail for any given ticker; callers must
/// treat a failure as "signal missing", never as a scan-fatal error.
#[async_trait::async_trait]
pub trait SignalProvider: Send + Sync {
    async fn news_buzz(&self, ticker: &str) -> Result<f64>;

    async fn short_interest(&self, ticker: &str) -> Result<ShortInterestSignals>;

    async fn sector_catalysts(
        &self,
        ticker: &str,
        sector: Option<&str>,
        industry: Option<&str>,
    ) -> Result<SectorCatalystSignals>;

    async fn options_max_pain(&self, ticker: &str) -> Result<Option<f64>>;

    async fn institutional(&self, ticker: &str) -> Result<InstitutionalSignal>;
}

#[async_trait::async_trait]
pub trait EquityScreenProvider: Send + Sync {
    async fn screen(&self, criteria: &ScreenCriteria) -> Result<Vec<String>>;
}
