/// Hand-curated large-cap, typically dividend-paying names. The long-term
/// screener is deterministic: no external query is made.
pub const LONG_TERM_UNIVERSE: &[&str] = &[
    "AAPL", "MSFT", "JNJ", "PG", "KO", "PEP", "JPM", "V", "HD", "MCD", "ABBV", "MRK", "CVX",
    "XOM", "T", "VZ", "CSCO", "IBM", "MMM", "CAT", "UNH", "WMT", "COST", "LOW", "TXN",
];

/// Fallback pool for the swing screener when the live screen is down or
/// empty: historically volatile mid-caps.
pub const SWING_FALLBACK_UNIVERSE: &[&str] = &[
    "RIVN", "PLTR", "SOFI", "DKNG", "RBLX", "COIN", "AFRM", "HOOD", "ETSY", "ROKU", "U",
    "LYFT", "PINS", "CHWY", "ZI", "DOCU", "TWLO", "NET", "DDOG", "CRWD",
];
