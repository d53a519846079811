//! Post-processing of a scored candidate: letter rating, implied
//! risk/reward, split-entry plan, and a best-effort rationale.

use crate::domain::{Category, EntryTranche, Rating, Recommendation, SplitEntryPlan};
use crate::narrative::{NarrativeClient, RationaleInput};
use crate::scoring::ScoredCandidate;

/// Rating ladder with the implied risk/reward divisor per rung.
pub fn rating_for_score(score: f64) -> (Rating, f64) {
    if score >= 80.0 {
        (Rating::APlus, score / 25.0)
    } else if score >= 65.0 {
        (Rating::A, score / 30.0)
    } else if score >= 50.0 {
        (Rating::BPlus, score / 35.0)
    } else if score >= 40.0 {
        (Rating::B, score / 40.0)
    } else {
        (Rating::C, score / 50.0)
    }
}

/// Three-tranche staged entry. Day/swing ladder down through one ATR unit to
/// the support level; long-term ladders fixed percentages below the current
/// price.
pub fn split_entry_plan(scored: &ScoredCandidate) -> SplitEntryPlan {
    match scored.category {
        Category::DayTrade | Category::Swing => [
            EntryTranche {
                price: scored.price,
                pct_of_position: 40.0,
                label: "initial".to_string(),
            },
            EntryTranche {
                price: scored.price - scored.atr,
                pct_of_position: 30.0,
                label: "pullback".to_string(),
            },
            EntryTranche {
                price: scored.support,
                pct_of_position: 30.0,
                label: "support".to_string(),
            },
        ],
        Category::LongTerm => [
            EntryTranche {
                price: scored.price,
                pct_of_position: 30.0,
                label: "initial".to_string(),
            },
            EntryTranche {
                price: scored.price * 0.95,
                pct_of_position: 40.0,
                label: "dip 5%".to_string(),
            },
            EntryTranche {
                price: scored.price * 0.90,
                pct_of_position: 30.0,
                label: "dip 10%".to_string(),
            },
        ],
    }
}

fn fallback_rationale(scored: &ScoredCandidate) -> String {
    format!(
        "{}: composite score {:.1} ({})",
        scored.ticker,
        scored.score,
        scored.category.label()
    )
}

pub struct Enricher<'a> {
    narrative: Option<&'a dyn NarrativeClient>,
}

impl<'a> Enricher<'a> {
    pub fn new(narrative: Option<&'a dyn NarrativeClient>) -> Self {
        Self { narrative }
    }

    /// Never fails: narrative generation degrades to a template.
    pub async fn enrich(&self, scored: ScoredCandidate) -> Recommendation {
        let (rating, risk_reward) = rating_for_score(scored.score);
        let split_entries = split_entry_plan(&scored);

        let rationale = match self.narrative {
            Some(client) => {
                let input = RationaleInput {
                    ticker: scored.ticker.clone(),
                    category: scored.category,
                    score: scored.score,
                    price: scored.price,
                    factors: scored
                        .breakdown
                        .iter()
                        .map(|(k, v)| (k.clone(), *v))
                        .collect(),
                };
                match client.generate_rationale(&input).await {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::warn!(ticker = %scored.ticker, error = %err, "rationale generation failed; using template");
                        fallback_rationale(&scored)
                    }
                }
            }
            None => fallback_rationale(&scored),
        };

        Recommendation {
            ticker: scored.ticker,
            category: scored.category,
            score: scored.score,
            breakdown: scored.breakdown,
            rating,
            risk_reward,
            current_price: scored.price,
            entry_price: scored.entry_price,
            stop_loss: scored.stop_loss,
            target_price: scored.target_price,
            support: scored.support,
            resistance: scored.resistance,
            split_entries,
            rationale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScoreBreakdown;

    fn scored(category: Category, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            ticker: "ACME".to_string(),
            category,
            score,
            breakdown: ScoreBreakdown::new(),
            price: 100.0,
            atr: 3.0,
            support: 92.0,
            resistance: 110.0,
            entry_price: 100.0,
            stop_loss: 95.5,
            target_price: 107.5,
        }
    }

    #[test]
    fn rating_ladder_boundaries() {
        assert_eq!(rating_for_score(80.0).0, Rating::APlus);
        assert_eq!(rating_for_score(79.9).0, Rating::A);
        assert_eq!(rating_for_score(65.0).0, Rating::A);
        assert_eq!(rating_for_score(50.0).0, Rating::BPlus);
        assert_eq!(rating_for_score(40.0).0, Rating::B);
        assert_eq!(rating_for_score(39.9).0, Rating::C);
    }

    #[test]
    fn rating_is_monotone_in_score() {
        let scores = [0.0, 10.0, 39.9, 40.0, 49.9, 50.0, 64.9, 65.0, 79.9, 80.0, 100.0];
        for pair in scores.windows(2) {
            let (lo, _) = rating_for_score(pair[0]);
            let (hi, _) = rating_for_score(pair[1]);
            assert!(lo <= hi, "rating not monotone between {} and {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn risk_reward_divisor_matches_the_rung() {
        let (_, rr) = rating_for_score(90.0);
        assert!((rr - 90.0 / 25.0).abs() < 1e-9);
        let (_, rr) = rating_for_score(45.0);
        assert!((rr - 45.0 / 40.0).abs() < 1e-9);
    }

    #[test]
    fn day_swing_plan_ladders_through_atr_and_support() {
        let plan = split_entry_plan(&scored(Category::Swing, 55.0));
        assert_eq!(plan[0].price, 100.0);
        assert_eq!(plan[0].pct_of_position, 40.0);
        assert_eq!(plan[1].price, 97.0);
        assert_eq!(plan[2].price, 92.0);
        let total: f64 = plan.iter().map(|t| t.pct_of_position).sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn long_term_plan_uses_fixed_discounts() {
        let plan = split_entry_plan(&scored(Category::LongTerm, 55.0));
        assert_eq!(plan[0].pct_of_position, 30.0);
        assert!((plan[1].price - 95.0).abs() < 1e-9);
        assert!((plan[2].price - 90.0).abs() < 1e-9);
        let total: f64 = plan.iter().map(|t| t.pct_of_position).sum();
        assert_eq!(total, 100.0);
    }

    #[tokio::test]
    async fn enrich_without_narrative_uses_template() {
        let enricher = Enricher::new(None);
        let rec = enricher.enrich(scored(Category::DayTrade, 42.0)).await;
        assert_eq!(rec.rating, Rating::B);
        assert_eq!(rec.rationale, "ACME: composite score 42.0 (day trade)");
    }

    #[tokio::test]
    async fn enrich_survives_narrative_failure() {
        struct Down;

        #[async_trait::async_trait]
        impl NarrativeClient for Down {
            async fn generate_rationale(
                &self,
                _input: &crate::narrative::RationaleInput,
            ) -> anyhow::Result<String> {
                anyhow::bail!("narrative service down")
            }
        }

        let down = Down;
        let enricher = Enricher::new(Some(&down));
        let rec = enricher.enrich(scored(Category::Swing, 70.0)).await;
        assert_eq!(rec.rating, Rating::A);
        assert!(rec.rationale.contains("composite score 70.0"));
    }
}
