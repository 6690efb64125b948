use crate::core::error::PersistError;
use crate::core::quote::Quote;
use crate::core::store::QuoteStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory quote store.
///
/// Used for dry runs (`store.kind: memory`) and by tests, which can slow its
/// writes down or make them fail to exercise the persist deadline.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Quote>>,
    attempts: AtomicUsize,
    write_delay: Option<Duration>,
    fail_with: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every insert sleeps for `delay` before writing.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Every insert fails with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    /// Number of inserts started, including ones that failed or were cancelled.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn rows(&self) -> Vec<Quote> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl QuoteStore for MemoryStore {
    async fn insert(&self, quote: &Quote) -> Result<i64, PersistError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.fail_with {
            return Err(PersistError::Store(message.clone()));
        }

        let mut rows = self.rows.lock().await;
        rows.push(quote.clone());
        let id = rows.len() as i64;
        debug!(id, "Quote stored in memory");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quote() -> Quote {
        Quote {
            code: "USD".to_string(),
            codein: "BRL".to_string(),
            name: "Dólar Americano/Real Brasileiro".to_string(),
            high: "5.2870".to_string(),
            low: "5.2290".to_string(),
            var_bid: "-0.0116".to_string(),
            pct_change: "-0.22".to_string(),
            bid: "5.25".to_string(),
            ask: "5.2510".to_string(),
            timestamp: "1718915399".to_string(),
            create_date: "2024-06-20 17:29:59".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = MemoryStore::new();

        assert_eq!(store.insert(&sample_quote()).await.unwrap(), 1);
        assert_eq!(store.insert(&sample_quote()).await.unwrap(), 2);
        assert_eq!(store.rows().await.len(), 2);
        assert_eq!(store.attempts(), 2);
    }

    #[tokio::test]
    async fn test_failing_store_counts_attempts() {
        let store = MemoryStore::new().failing("disk full");

        let err = store.insert(&sample_quote()).await.unwrap_err();
        assert!(matches!(err, PersistError::Store(ref m) if m == "disk full"));
        assert_eq!(store.attempts(), 1);
        assert!(store.rows().await.is_empty());
    }
}
