//! Result store: one `daily_scans` row per calendar date with one jsonb
//! column per category. A category write is a single
//! `INSERT .. ON CONFLICT DO UPDATE` of its own column, so concurrent writes
//! for different categories never interfere, and the first write of a date
//! creates the row with all three arrays present and empty.

use crate::domain::{Category, DailyScanDocument, Recommendation};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

pub async fn upsert_category(
    pool: &sqlx::PgPool,
    as_of_date: NaiveDate,
    category: Category,
    recommendations: &[Recommendation],
) -> anyhow::Result<()> {
    let payload = serde_json::to_value(recommendations)
        .context("failed to serialize recommendations")?;

    sqlx::query(&upsert_sql(category))
        .persistent(false)
        .bind(as_of_date)
        .bind(payload)
        .execute(pool)
        .await
        .with_context(|| {
            format!("upsert daily_scans.{} failed for {as_of_date}", category.as_str())
        })?;

    Ok(())
}

/// Column name comes from the closed Category enum, never from input.
fn upsert_sql(category: Category) -> String {
    let col = category.as_str();
    format!(
        "INSERT INTO daily_scans (as_of_date, {col}) VALUES ($1, $2) \
         ON CONFLICT (as_of_date) DO UPDATE \
         SET {col} = EXCLUDED.{col}, updated_at = now()"
    )
}

/// `None` means no category has run for the date. A present document with an
/// empty array means that category ran and found nothing.
pub async fn read_scan(
    pool: &sqlx::PgPool,
    as_of_date: NaiveDate,
) -> anyhow::Result<Option<DailyScanDocument>> {
    let row = sqlx::query_as::<
        _,
        (
            NaiveDate,
            serde_json::Value,
            serde_json::Value,
            serde_json::Value,
            DateTime<Utc>,
        ),
    >(
        "SELECT as_of_date, day_trade, swing, longterm, updated_at \
         FROM daily_scans WHERE as_of_date = $1",
    )
    .persistent(false)
    .bind(as_of_date)
    .fetch_optional(pool)
    .await?;

    row.map(document_from_row).transpose()
}

pub async fn read_latest_scan(pool: &sqlx::PgPool) -> anyhow::Result<Option<DailyScanDocument>> {
    let row = sqlx::query_as::<
        _,
        (
            NaiveDate,
            serde_json::Value,
            serde_json::Value,
            serde_json::Value,
            DateTime<Utc>,
        ),
    >(
        "SELECT as_of_date, day_trade, swing, longterm, updated_at \
         FROM daily_scans ORDER BY as_of_date DESC LIMIT 1",
    )
    .persistent(false)
    .fetch_optional(pool)
    .await?;

    row.map(document_from_row).transpose()
}

fn document_from_row(
    row: (
        NaiveDate,
        serde_json::Value,
        serde_json::Value,
        serde_json::Value,
        DateTime<Utc>,
    ),
) -> anyhow::Result<DailyScanDocument> {
    let (as_of_date, day_trade, swing, longterm, updated_at) = row;
    Ok(DailyScanDocument {
        as_of_date,
        day_trade: parse_category(day_trade, Category::DayTrade)?,
        swing: parse_category(swing, Category::Swing)?,
        longterm: parse_category(longterm, Category::LongTerm)?,
        updated_at,
    })
}

fn parse_category(
    value: serde_json::Value,
    category: Category,
) -> anyhow::Result<Vec<Recommendation>> {
    serde_json::from_value(value)
        .with_context(|| format!("invalid stored recommendations for {category}"))
}

/// Run log, one row per (run, category).
pub async fn record_scan_run(
    pool: &sqlx::PgPool,
    as_of_date: NaiveDate,
    category: Category,
    status: &str,
    count: Option<i32>,
    error: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let started_at: DateTime<Utc> = Utc::now();

    sqlx::query(
        "INSERT INTO scan_runs (id, as_of_date, category, started_at, status, item_count, error) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .persistent(false)
    .bind(id)
    .bind(as_of_date)
    .bind(category.as_str())
    .bind(started_at)
    .bind(status)
    .bind(count)
    .bind(error)
    .execute(pool)
    .await
    .context("insert scan_runs failed")?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryTranche, Rating, ScoreBreakdown};

    fn rec(ticker: &str, category: Category, score: f64) -> Recommendation {
        Recommendation {
            ticker: ticker.to_string(),
            category,
            score,
            breakdown: ScoreBreakdown::new(),
            rating: Rating::B,
            risk_reward: 1.2,
            current_price: 10.0,
            entry_price: 10.0,
            stop_loss: 9.0,
            target_price: 12.0,
            support: 9.2,
            resistance: 11.8,
            split_entries: [
                EntryTranche {
                    price: 10.0,
                    pct_of_position: 40.0,
                    label: "initial".to_string(),
                },
                EntryTranche {
                    price: 9.7,
                    pct_of_position: 30.0,
                    label: "pullback".to_string(),
                },
                EntryTranche {
                    price: 9.2,
                    pct_of_position: 30.0,
                    label: "support".to_string(),
                },
            ],
            rationale: "test".to_string(),
        }
    }

    #[test]
    fn stored_recommendations_round_trip() {
        let recs = vec![rec("AAA", Category::Swing, 55.0), rec("BBB", Category::Swing, 41.0)];
        let value = serde_json::to_value(&recs).unwrap();
        let back = parse_category(value, Category::Swing).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].ticker, "AAA");
        assert_eq!(back[1].score, 41.0);
    }

    #[test]
    fn empty_array_parses_to_empty_vec() {
        let back = parse_category(serde_json::json!([]), Category::DayTrade).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn upsert_sql_touches_exactly_one_category_column() {
        // The statement only references the written category's column,
        // which is what keeps independent pipelines isolated.
        for cat in Category::ALL {
            let sql = upsert_sql(cat);
            for other in Category::ALL {
                if other != cat {
                    assert!(
                        !sql.contains(other.as_str()),
                        "{cat} upsert must not mention {other}"
                    );
                }
            }
        }
    }
}
