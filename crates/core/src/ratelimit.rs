use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const DEFAULT_MIN_GAP_MS: u64 = 350;

/// Minimum-gap pacer for one upstream provider. Shared (via `Arc`) across
/// everything that talks to that provider, so concurrent pipelines still
/// respect a single rate budget.
#[derive(Debug)]
pub struct Pacer {
    min_gap: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last: Mutex::new(None),
        }
    }

    /// Gap from `MARKET_DATA_MIN_GAP_MS`, defaulting to 350 ms.
    pub fn from_env() -> Self {
        let ms = std::env::var("MARKET_DATA_MIN_GAP_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_MIN_GAP_MS);
        Self::new(Duration::from_millis(ms))
    }

    /// Waits until at least `min_gap` has passed since the previous permit.
    /// The lock is held across the sleep so permits are serialized.
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.min_gap;
            let now = Instant::now();
            if ready_at > now {
                tokio::time::sleep(ready_at - now).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enforces_minimum_gap_between_permits() {
        let pacer = Pacer::new(Duration::from_millis(40));
        let start = Instant::now();
        pacer.acquire().await;
        pacer.acquire().await;
        pacer.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn first_permit_is_immediate() {
        let pacer = Pacer::new(Duration::from_secs(5));
        let start = Instant::now();
        pacer.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
