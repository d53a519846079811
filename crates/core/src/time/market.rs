use anyhow::Context;
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use std::collections::HashSet;

const ET_OFFSET_SECS: i32 = -5 * 3600;

/// Whether a scan run should proceed for a given date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Open,
    /// Weekend or configured holiday; the run is an intentional no-op.
    Closed { reason: String },
}

impl GateDecision {
    pub fn is_open(&self) -> bool {
        matches!(self, GateDecision::Open)
    }
}

/// Resolves the scan date: an explicit `--as-of-date`, otherwise today in
/// US Eastern (fixed offset; DST skew of an hour does not move the date at
/// the times the job is scheduled).
pub fn resolve_as_of_date(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?);
    }
    let et = chrono::FixedOffset::east_opt(ET_OFFSET_SECS).context("invalid ET offset")?;
    Ok(now_utc.with_timezone(&et).date_naive())
}

/// Weekend/holiday gate. `force` overrides a closed market (manual reruns).
pub fn gate(date: NaiveDate, force: bool) -> GateDecision {
    if force {
        return GateDecision::Open;
    }
    if is_weekend(date) {
        return GateDecision::Closed {
            reason: format!("{date} is a weekend"),
        };
    }
    if configured_holidays().contains(&date) {
        return GateDecision::Closed {
            reason: format!("{date} is a market holiday"),
        };
    }
    GateDecision::Open
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn configured_holidays() -> HashSet<NaiveDate> {
    // Fixed-date NYSE closures only. Floating holidays (Thanksgiving, Good
    // Friday, ...) go through MARKET_HOLIDAYS="YYYY-MM-DD,YYYY-MM-DD".
    let mut out = HashSet::new();
    let years = [2024, 2025, 2026, 2027, 2028, 2029, 2030];
    for y in years {
        for (m, d) in [(1, 1), (6, 19), (7, 4), (12, 25)] {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                out.insert(date);
            }
        }
    }

    if let Ok(s) = std::env::var("MARKET_HOLIDAYS") {
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Ok(d) = NaiveDate::parse_from_str(part, "%Y-%m-%d") {
                out.insert(d);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn closed_on_weekend() {
        // 2026-01-03 is a Saturday.
        let d = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        assert!(!gate(d, false).is_open());
    }

    #[test]
    fn closed_on_fixed_holiday() {
        let d = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        assert!(!gate(d, false).is_open());
    }

    #[test]
    fn force_overrides_the_gate() {
        let d = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        assert!(gate(d, true).is_open());
    }

    #[test]
    fn open_on_ordinary_weekday() {
        // 2026-01-06 is a Tuesday.
        let d = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        assert!(gate(d, false).is_open());
    }

    #[test]
    fn resolves_explicit_date() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let d = resolve_as_of_date(Some("2026-01-02"), now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
    }

    #[test]
    fn resolves_eastern_date_across_midnight_utc() {
        // 02:00 UTC is still the previous day in US Eastern.
        let now = Utc.with_ymd_and_hms(2026, 1, 6, 2, 0, 0).unwrap();
        let d = resolve_as_of_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
    }
}
