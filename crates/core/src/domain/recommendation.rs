use crate::domain::Category;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A ticker entering one scan run. Never persisted.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub ticker: String,
    pub category: Category,
}

/// Named score components. Only non-zero contributions are recorded, so the
/// breakdown doubles as a "which factors fired" summary.
pub type ScoreBreakdown = BTreeMap<String, f64>;

/// Letter rating derived from the composite score. Ordinal: C < B < B+ < A < A+.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "C")]
    C,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A+")]
    APlus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryTranche {
    pub price: f64,
    /// Share of the total position allocated to this tranche, in percent.
    pub pct_of_position: f64,
    pub label: String,
}

pub type SplitEntryPlan = [EntryTranche; 3];

/// Final output unit of one scan pipeline. Created once per run per
/// qualifying candidate; superseded, never merged, on the next run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub ticker: String,
    pub category: Category,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub rating: Rating,
    pub risk_reward: f64,
    pub current_price: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target_price: f64,
    pub support: f64,
    pub resistance: f64,
    pub split_entries: SplitEntryPlan,
    pub rationale: String,
}

/// One row per calendar date; each category owns exactly one array.
/// A missing document means "no category has run today"; an empty array
/// means "that category ran and found nothing".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyScanDocument {
    pub as_of_date: NaiveDate,
    pub day_trade: Vec<Recommendation>,
    pub swing: Vec<Recommendation>,
    pub longterm: Vec<Recommendation>,
    pub updated_at: DateTime<Utc>,
}

impl DailyScanDocument {
    pub fn recommendations(&self, category: Category) -> &[Recommendation] {
        match category {
            Category::DayTrade => &self.day_trade,
            Category::Swing => &self.swing,
            Category::LongTerm => &self.longterm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_order_follows_the_ladder() {
        assert!(Rating::C < Rating::B);
        assert!(Rating::B < Rating::BPlus);
        assert!(Rating::BPlus < Rating::A);
        assert!(Rating::A < Rating::APlus);
    }

    #[test]
    fn rating_serializes_with_plus_suffix() {
        assert_eq!(serde_json::to_string(&Rating::BPlus).unwrap(), "\"B+\"");
        assert_eq!(serde_json::to_string(&Rating::APlus).unwrap(), "\"A+\"");
        let back: Rating = serde_json::from_str("\"A+\"").unwrap();
        assert_eq!(back, Rating::APlus);
    }

    #[test]
    fn document_accessor_picks_the_matching_category_array() {
        let doc = DailyScanDocument {
            as_of_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            day_trade: Vec::new(),
            swing: vec![Recommendation {
                ticker: "XYZ".to_string(),
                category: Category::Swing,
                score: 44.0,
                breakdown: ScoreBreakdown::new(),
                rating: Rating::B,
                risk_reward: 1.1,
                current_price: 20.0,
                entry_price: 20.0,
                stop_loss: 18.5,
                target_price: 23.0,
                support: 19.0,
                resistance: 23.0,
                split_entries: std::array::from_fn(|i| EntryTranche {
                    price: 20.0 - i as f64 * 0.5,
                    pct_of_position: if i == 0 { 40.0 } else { 30.0 },
                    label: "t".to_string(),
                }),
                rationale: String::new(),
            }],
            longterm: Vec::new(),
            updated_at: Utc::now(),
        };
        assert!(doc.recommendations(Category::DayTrade).is_empty());
        assert_eq!(doc.recommendations(Category::Swing)[0].ticker, "XYZ");
        assert!(doc.recommendations(Category::LongTerm).is_empty());
    }
}
