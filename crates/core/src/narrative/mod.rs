//! Narrative generation for recommendation rationales. Best-effort: callers
//! fall back to a templated string when generation fails.

pub mod anthropic;

use crate::domain::Category;

#[derive(Debug, Clone)]
pub struct RationaleInput {
    pub ticker: String,
    pub category: Category,
    pub score: f64,
    pub price: f64,
    /// Factor name -> contributed points, non-zero factors only.
    pub factors: Vec<(String, f64)>,
}

#[async_trait::async_trait]
pub trait NarrativeClient: Send + Sync {
    async fn generate_rationale(&self, input: &RationaleInput) -> anyhow::Result<String>;
}
