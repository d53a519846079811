use serde::{Deserialize, Serialize};

/// Scan category. One pipeline (screener + scorer + enricher) per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "day_trade")]
    DayTrade,
    #[serde(rename = "swing")]
    Swing,
    #[serde(rename = "longterm")]
    LongTerm,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::DayTrade, Category::Swing, Category::LongTerm];

    /// Stable identifier; also the column name in `daily_scans`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::DayTrade => "day_trade",
            Category::Swing => "swing",
            Category::LongTerm => "longterm",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::DayTrade => "day trade",
            Category::Swing => "swing",
            Category::LongTerm => "long term",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_names_match_storage_columns() {
        for cat in Category::ALL {
            let json = serde_json::to_value(cat).unwrap();
            assert_eq!(json, serde_json::json!(cat.as_str()));
        }
    }

    #[test]
    fn round_trips_through_serde() {
        for cat in Category::ALL {
            let s = serde_json::to_string(&cat).unwrap();
            let back: Category = serde_json::from_str(&s).unwrap();
            assert_eq!(back, cat);
        }
    }
}
