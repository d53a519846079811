//! Best-effort push notification after a category persists. Failures are
//! logged and never affect the persisted results.

use crate::config::Settings;
use crate::domain::Category;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct PushPayload<'a> {
    category: Category,
    count: usize,
    as_of_date: &'a NaiveDate,
}

#[derive(Debug, Clone)]
pub struct PushNotifier {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl PushNotifier {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build notifier http client")?;
        Ok(Self {
            http,
            webhook_url: settings.push_webhook_url.clone(),
        })
    }

    /// No-op when no webhook is configured.
    pub async fn notify(&self, category: Category, count: usize, as_of_date: NaiveDate) {
        let Some(url) = &self.webhook_url else {
            tracing::debug!(%category, "no push webhook configured; skipping notification");
            return;
        };

        let payload = PushPayload {
            category,
            count,
            as_of_date: &as_of_date,
        };

        match self.http.post(url).json(&payload).send().await {
            Ok(res) if res.status().is_success() => {
                tracing::info!(%category, count, "push notification sent");
            }
            Ok(res) => {
                tracing::warn!(%category, status = %res.status(), "push notification rejected");
            }
            Err(err) => {
                tracing::warn!(%category, error = %err, "push notification failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_category_name() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        let payload = PushPayload {
            category: Category::DayTrade,
            count: 4,
            as_of_date: &date,
        };
        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["category"], "day_trade");
        assert_eq!(v["count"], 4);
    }
}
