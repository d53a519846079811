use crate::domain::Category;
use anyhow::Context;
use chrono::{Datelike, NaiveDate};

// Advisory locks are scoped to the Postgres session. Best-effort guard
// against two workers scanning the same (date, category) at once.
const LOCK_NAMESPACE: i64 = 0x5449_434B_5343; // "TICKSC" as hex-ish namespace.

fn lock_key(as_of_date: NaiveDate, category: Category) -> i64 {
    let cat_tag = match category {
        Category::DayTrade => 1_i64,
        Category::Swing => 2,
        Category::LongTerm => 3,
    };
    LOCK_NAMESPACE ^ (as_of_date.num_days_from_ce() as i64) ^ (cat_tag << 32)
}

pub async fn try_acquire_category_lock(
    pool: &sqlx::PgPool,
    as_of_date: NaiveDate,
    category: Category,
) -> anyhow::Result<bool> {
    let key = lock_key(as_of_date, category);
    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(key)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to acquire advisory lock (key={key})"))?;
    Ok(acquired.0)
}

pub async fn release_category_lock(
    pool: &sqlx::PgPool,
    as_of_date: NaiveDate,
    category: Category,
) -> anyhow::Result<()> {
    let key = lock_key(as_of_date, category);
    sqlx::query("SELECT pg_advisory_unlock($1)")
        .persistent(false)
        .bind(key)
        .execute(pool)
        .await
        .with_context(|| format!("failed to release advisory lock (key={key})"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_keys_differ_per_category_and_date() {
        let d1 = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
        let mut keys = std::collections::BTreeSet::new();
        for cat in Category::ALL {
            assert!(keys.insert(lock_key(d1, cat)));
            assert!(keys.insert(lock_key(d2, cat)));
        }
        assert_eq!(keys.len(), 6);
    }
}
