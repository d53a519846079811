pub mod category;
pub mod recommendation;

pub use category::Category;
pub use recommendation::{
    Candidate, DailyScanDocument, EntryTranche, Rating, Recommendation, ScoreBreakdown,
    SplitEntryPlan,
};
