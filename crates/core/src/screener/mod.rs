//! Candidate supply, one source per category.
//!
//! Screener failures degrade (fallback universe or empty pool); they never
//! abort a run.

mod universe;

use crate::domain::{Candidate, Category};
use crate::providers::{EquityScreenProvider, ScreenCriteria};
use anyhow::Result;
use chrono::NaiveDate;

pub use universe::{LONG_TERM_UNIVERSE, SWING_FALLBACK_UNIVERSE};

pub struct Screener<'a> {
    pool: &'a sqlx::PgPool,
    screen_provider: &'a dyn EquityScreenProvider,
    criteria: ScreenCriteria,
}

impl<'a> Screener<'a> {
    pub fn new(pool: &'a sqlx::PgPool, screen_provider: &'a dyn EquityScreenProvider) -> Self {
        Self {
            pool,
            screen_provider,
            criteria: ScreenCriteria::default(),
        }
    }

    pub fn with_criteria(mut self, criteria: ScreenCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub async fn source_candidates(
        &self,
        category: Category,
        as_of_date: NaiveDate,
        pool_limit: usize,
    ) -> Result<Vec<Candidate>> {
        let tickers = match category {
            Category::DayTrade => self.day_trade_pool(as_of_date, pool_limit).await,
            Category::Swing => self.swing_pool(pool_limit).await,
            Category::LongTerm => Ok(curated(LONG_TERM_UNIVERSE, pool_limit)),
        };

        let tickers = match tickers {
            Ok(t) => t,
            Err(err) => {
                tracing::warn!(%category, error = %err, "screener failed; continuing with empty pool");
                Vec::new()
            }
        };

        Ok(tickers
            .into_iter()
            .map(|ticker| Candidate { ticker, category })
            .collect())
    }

    /// Precomputed news-buzz ranking maintained by the sentiment ingest.
    /// An empty table for the date is a valid (empty) pool.
    async fn day_trade_pool(&self, as_of_date: NaiveDate, limit: usize) -> Result<Vec<String>> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT ticker FROM news_buzz_daily \
             WHERE as_of_date = $1 \
             ORDER BY buzz_score DESC, ticker ASC \
             LIMIT $2",
        )
        .persistent(false)
        .bind(as_of_date)
        .bind(limit as i64)
        .fetch_all(self.pool)
        .await?;

        if rows.is_empty() {
            tracing::warn!(%as_of_date, "no news buzz rows for date; day trade pool is empty");
        }

        Ok(rows.into_iter().map(|(t,)| t).collect())
    }

    /// Live screen with a curated fallback. The chosen source is logged for
    /// observability.
    async fn swing_pool(&self, limit: usize) -> Result<Vec<String>> {
        match self.screen_provider.screen(&self.criteria).await {
            Ok(tickers) if !tickers.is_empty() => {
                tracing::info!(source = "live", count = tickers.len(), "swing screen");
                Ok(tickers.into_iter().take(limit).collect())
            }
            Ok(_) => {
                tracing::warn!(source = "fallback", "swing screen returned no tickers; using curated universe");
                Ok(curated(SWING_FALLBACK_UNIVERSE, limit))
            }
            Err(err) => {
                tracing::warn!(source = "fallback", error = %err, "swing screen failed; using curated universe");
                Ok(curated(SWING_FALLBACK_UNIVERSE, limit))
            }
        }
    }
}

fn curated(universe: &[&str], limit: usize) -> Vec<String> {
    universe
        .iter()
        .take(limit)
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curated_respects_the_pool_limit() {
        let pool = curated(LONG_TERM_UNIVERSE, 3);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool[0], LONG_TERM_UNIVERSE[0]);
    }

    #[test]
    fn curated_universes_have_no_duplicates() {
        for universe in [LONG_TERM_UNIVERSE, SWING_FALLBACK_UNIVERSE] {
            let mut seen = std::collections::BTreeSet::new();
            for t in universe {
                assert!(seen.insert(*t), "duplicate ticker {t}");
            }
        }
    }
}
