use crate::config::Settings;
use crate::providers::{
    EquityScreenProvider, InstitutionalSignal, Quote, QuoteProvider, ScreenCriteria,
    SectorCatalystSignals, ShortInterestSignals, SignalProvider,
};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_RETRIES: u32 = 2;

/// HTTP JSON client against the market-data gateway. One base URL serves the
/// quote, signal, and screen endpoints; authentication is a single
/// `x-api-key` header.
#[derive(Debug, Clone)]
pub struct HttpFactProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retries: u32,
}

impl HttpFactProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_market_data_base_url()?.to_string();
        let api_key = settings.market_data_api_key.clone();

        let timeout_secs = std::env::var("MARKET_DATA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("MARKET_DATA_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn get_json_once<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let res = self
            .http
            .get(self.url(path))
            .headers(self.headers()?)
            .query(query)
            .send()
            .await
            .with_context(|| format!("market data request failed: {path}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read market data response: {path}"))?;

        if !status.is_success() {
            anyhow::bail!("market data HTTP {status} for {path}: {text}");
        }

        serde_json::from_str::<T>(&text)
            .with_context(|| format!("failed to parse market data response for {path}: {text}"))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.get_json_once::<T>(path, query).await {
                Ok(v) => return Ok(v),
                Err(err) => {
                    if attempt > self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(path, attempt, ?backoff, error = %err, "market data fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct BuzzResponse {
    buzz_score: f64,
}

#[derive(Debug, Deserialize)]
struct MaxPainResponse {
    max_pain: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ScreenResponse {
    tickers: Vec<String>,
}

#[async_trait::async_trait]
impl QuoteProvider for HttpFactProvider {
    async fn get_quote(&self, ticker: &str) -> Result<Quote> {
        let quote: Quote = self
            .get_json("/v1/quote", &[("ticker", ticker.to_string())])
            .await?;
        anyhow::ensure!(quote.price > 0.0, "quote for {ticker} has no price");
        Ok(quote)
    }
}

#[async_trait::async_trait]
impl SignalProvider for HttpFactProvider {
    async fn news_buzz(&self, ticker: &str) -> Result<f64> {
        let res: BuzzResponse = self
            .get_json("/v1/news_buzz", &[("ticker", ticker.to_string())])
            .await?;
        Ok(res.buzz_score)
    }

    async fn short_interest(&self, ticker: &str) -> Result<ShortInterestSignals> {
        self.get_json("/v1/short_interest", &[("ticker", ticker.to_string())])
            .await
    }

    async fn sector_catalysts(
        &self,
        ticker: &str,
        sector: Option<&str>,
        industry: Option<&str>,
    ) -> Result<SectorCatalystSignals> {
        let mut query = vec![("ticker", ticker.to_string())];
        if let Some(sector) = sector {
            query.push(("sector", sector.to_string()));
        }
        if let Some(industry) = industry {
            query.push(("industry", industry.to_string()));
        }
        self.get_json("/v1/sector_catalysts", &query).await
    }

    async fn options_max_pain(&self, ticker: &str) -> Result<Option<f64>> {
        let res: MaxPainResponse = self
            .get_json("/v1/options/max_pain", &[("ticker", ticker.to_string())])
            .await?;
        Ok(res.max_pain)
    }

    async fn institutional(&self, ticker: &str) -> Result<InstitutionalSignal> {
        self.get_json("/v1/institutional", &[("ticker", ticker.to_string())])
            .await
    }
}

#[async_trait::async_trait]
impl EquityScreenProvider for HttpFactProvider {
    async fn screen(&self, criteria: &ScreenCriteria) -> Result<Vec<String>> {
        let query = vec![
            ("min_price", criteria.min_price.to_string()),
            ("min_market_cap", criteria.min_market_cap.to_string()),
            ("max_market_cap", criteria.max_market_cap.to_string()),
            ("rsi_below", criteria.rsi_below.to_string()),
        ];
        let res: ScreenResponse = self.get_json("/v1/screen", &query).await?;
        Ok(res.tickers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_quote_shape() {
        let v = json!({
            "ticker": "ACME",
            "price": 42.5,
            "history": [
                {"date": "2026-01-02", "open": 41.0, "high": 43.0, "low": 40.5, "close": 42.5, "volume": 1_200_000.0}
            ],
            "fundamentals": {"pe_ratio": 18.2, "dividend_yield_pct": 2.1}
        });
        let quote: Quote = serde_json::from_value(v).unwrap();
        assert_eq!(quote.ticker, "ACME");
        assert_eq!(quote.history.len(), 1);
        assert_eq!(quote.fundamentals.pe_ratio, Some(18.2));
        assert_eq!(quote.fundamentals.market_cap, None);
    }

    #[test]
    fn quote_fundamentals_default_when_absent() {
        let v = json!({"ticker": "ACME", "price": 10.0, "history": []});
        let quote: Quote = serde_json::from_value(v).unwrap();
        assert!(quote.fundamentals.sector.is_none());
    }

    #[test]
    fn parses_short_interest_signals() {
        let v = json!({
            "short_pct_float": 24.0,
            "short_interest_growth_30d_pct": 62.0,
            "ftd_volume_significant": true,
            "on_threshold_list": true,
            "borrow_rate_pct": 80.0,
            "zero_borrow": false
        });
        let s: ShortInterestSignals = serde_json::from_value(v).unwrap();
        assert!(s.on_threshold_list);
        assert_eq!(s.short_pct_float, 24.0);
    }
}
