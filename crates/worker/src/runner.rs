//! Orchestrates one scan run: per selected category, screen, score each
//! candidate sequentially behind the shared pacer, enrich, rank, persist,
//! notify. A category failure never stops the remaining categories; a
//! persistence failure surfaces in the summary and fails the process.

use chrono::NaiveDate;
use sqlx::PgPool;
use tickerscan_core::domain::{Category, Recommendation};
use tickerscan_core::enrich::Enricher;
use tickerscan_core::narrative::NarrativeClient;
use tickerscan_core::notify::PushNotifier;
use tickerscan_core::providers::{EquityScreenProvider, QuoteProvider, SignalProvider};
use tickerscan_core::ratelimit::Pacer;
use tickerscan_core::scoring::{
    DayTradeConfig, DayTradeScorer, LongTermConfig, LongTermScorer, ScoredCandidate, SwingConfig,
    SwingScorer,
};
use tickerscan_core::screener::Screener;
use tickerscan_core::storage::{lock, scans};

const TOP_N: usize = 5;
const POOL_LIMIT: usize = 30;
const TEST_POOL_LIMIT: usize = 3;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub categories: Vec<Category>,
    pub as_of_date: NaiveDate,
    pub test_mode: bool,
    pub dry_run: bool,
}

impl RunOptions {
    fn pool_limit(&self) -> usize {
        if self.test_mode {
            TEST_POOL_LIMIT
        } else {
            POOL_LIMIT
        }
    }
}

#[derive(Debug)]
pub struct CategoryResult {
    pub category: Category,
    pub persisted: usize,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: Vec<CategoryResult>,
    pub failures: Vec<(Category, String)>,
}

pub struct Runner<'a> {
    pub pool: &'a PgPool,
    pub quotes: &'a dyn QuoteProvider,
    pub signals: &'a dyn SignalProvider,
    pub screen: &'a dyn EquityScreenProvider,
    pub pacer: &'a Pacer,
    pub narrative: Option<&'a dyn NarrativeClient>,
    pub notifier: &'a PushNotifier,
    pub opts: RunOptions,
}

impl<'a> Runner<'a> {
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        for &category in &self.opts.categories {
            match self.run_category(category).await {
                Ok(persisted) => summary.completed.push(CategoryResult {
                    category,
                    persisted,
                }),
                Err(err) => summary.failures.push((category, format!("{err:#}"))),
            }
        }

        summary
    }

    async fn run_category(&self, category: Category) -> anyhow::Result<usize> {
        let as_of_date = self.opts.as_of_date;

        let acquired = lock::try_acquire_category_lock(self.pool, as_of_date, category).await?;
        if !acquired {
            tracing::warn!(%category, %as_of_date, "category lock not acquired; another run in progress");
            return Ok(0);
        }

        let result = self.scan_category(category).await;

        let _ = lock::release_category_lock(self.pool, as_of_date, category).await;
        result
    }

    async fn scan_category(&self, category: Category) -> anyhow::Result<usize> {
        let as_of_date = self.opts.as_of_date;

        let screener = Screener::new(self.pool, self.screen);
        let candidates = screener
            .source_candidates(category, as_of_date, self.opts.pool_limit())
            .await?;

        tracing::info!(%category, candidates = candidates.len(), "screening complete");

        // Sequential on purpose: the pacer inside each scorer spaces out the
        // upstream fetches.
        let mut qualifying: Vec<ScoredCandidate> = Vec::new();
        for candidate in &candidates {
            let scored = match self.score_one(category, &candidate.ticker).await {
                Ok(s) => s,
                Err(err) => {
                    tracing::warn!(ticker = %candidate.ticker, %category, error = %err, "scoring failed; skipping ticker");
                    continue;
                }
            };
            if let Some(scored) = scored {
                tracing::debug!(ticker = %scored.ticker, score = scored.score, "candidate qualified");
                qualifying.push(scored);
            }
        }

        let enricher = Enricher::new(self.narrative);
        let mut enriched = Vec::with_capacity(qualifying.len());
        for scored in qualifying {
            enriched.push(enricher.enrich(scored).await);
        }

        let top = rank_and_truncate(enriched, TOP_N);
        let count = top.len();

        if self.opts.dry_run {
            tracing::info!(%category, count, dry_run = true, "skipping persistence");
            return Ok(count);
        }

        match scans::upsert_category(self.pool, as_of_date, category, &top).await {
            Ok(()) => {
                scans::record_scan_run(
                    self.pool,
                    as_of_date,
                    category,
                    "success",
                    Some(count as i32),
                    None,
                )
                .await?;
            }
            Err(err) => {
                // Stale results in the store are worse than a loud failure.
                let _ = scans::record_scan_run(
                    self.pool,
                    as_of_date,
                    category,
                    "error",
                    None,
                    Some(&format!("{err:#}")),
                )
                .await;
                return Err(err);
            }
        }

        self.notifier.notify(category, count, as_of_date).await;

        Ok(count)
    }

    async fn score_one(
        &self,
        category: Category,
        ticker: &str,
    ) -> anyhow::Result<Option<ScoredCandidate>> {
        match category {
            Category::DayTrade => {
                DayTradeScorer::new(self.quotes, self.signals, self.pacer, DayTradeConfig::default())
                    .score(ticker)
                    .await
            }
            Category::Swing => {
                SwingScorer::new(self.quotes, self.signals, self.pacer, SwingConfig::default())
                    .score(ticker)
                    .await
            }
            Category::LongTerm => {
                LongTermScorer::new(self.quotes, self.signals, self.pacer, LongTermConfig::default())
                    .score(ticker)
                    .await
            }
        }
    }
}

/// Stable sort by score descending, then keep the top `n`. Equal scores keep
/// their arrival order.
fn rank_and_truncate(mut recs: Vec<Recommendation>, n: usize) -> Vec<Recommendation> {
    recs.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    recs.truncate(n);
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickerscan_core::domain::{EntryTranche, Rating, ScoreBreakdown};

    fn rec(ticker: &str, score: f64) -> Recommendation {
        Recommendation {
            ticker: ticker.to_string(),
            category: Category::Swing,
            score,
            breakdown: ScoreBreakdown::new(),
            rating: Rating::B,
            risk_reward: 1.0,
            current_price: 10.0,
            entry_price: 10.0,
            stop_loss: 9.0,
            target_price: 12.0,
            support: 9.0,
            resistance: 12.0,
            split_entries: std::array::from_fn(|i| EntryTranche {
                price: 10.0 - i as f64 * 0.3,
                pct_of_position: if i == 0 { 40.0 } else { 30.0 },
                label: "t".to_string(),
            }),
            rationale: String::new(),
        }
    }

    #[test]
    fn keeps_the_five_highest_scores_sorted_descending() {
        let recs = vec![
            rec("A", 31.0),
            rec("B", 88.0),
            rec("C", 45.0),
            rec("D", 72.0),
            rec("E", 55.0),
            rec("F", 39.0),
            rec("G", 64.0),
            rec("H", 50.0),
        ];
        let top = rank_and_truncate(recs, 5);
        let tickers: Vec<&str> = top.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["B", "D", "G", "E", "H"]);
        for pair in top.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn ties_keep_arrival_order() {
        let recs = vec![rec("FIRST", 50.0), rec("SECOND", 50.0), rec("TOP", 60.0)];
        let top = rank_and_truncate(recs, 5);
        let tickers: Vec<&str> = top.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["TOP", "FIRST", "SECOND"]);
    }

    #[test]
    fn fewer_than_n_pass_through() {
        let recs = vec![rec("A", 40.0), rec("B", 35.0)];
        assert_eq!(rank_and_truncate(recs, 5).len(), 2);
    }
}
