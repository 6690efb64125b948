//! The fetch, decode and persist sequence run for every quote request.

use crate::core::deadline::Deadline;
use crate::core::error::{PersistError, UpstreamError};
use crate::core::quote::{Quote, QuoteProvider};
use crate::core::store::QuoteStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A quote that was fetched, plus what happened when storing it.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub quote: Quote,
    pub persisted: Result<i64, PersistError>,
}

impl PipelineOutcome {
    /// Short label for the persist result: `ok`, `timeout` or `error`.
    pub fn persist_status(&self) -> &'static str {
        match &self.persisted {
            Ok(_) => "ok",
            Err(PersistError::Timeout(_)) => "timeout",
            Err(PersistError::Store(_)) => "error",
        }
    }
}

pub struct QuotePipeline {
    provider: Arc<dyn QuoteProvider>,
    store: Arc<dyn QuoteStore>,
    fetch_timeout: Duration,
    persist_timeout: Duration,
}

impl QuotePipeline {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        store: Arc<dyn QuoteStore>,
        fetch_timeout: Duration,
        persist_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            fetch_timeout,
            persist_timeout,
        }
    }

    /// Fetches a quote and then tries to store it.
    ///
    /// Both stage budgets count from the moment `run` is called, so a slow
    /// fetch eats into the persist budget. A fetch failure ends the run
    /// before the store is touched. A store failure is logged and returned
    /// inside the outcome; the quote is still handed back.
    pub async fn run(&self) -> Result<PipelineOutcome, UpstreamError> {
        let arrival = Instant::now();
        let fetch = Deadline::starting_at("fetch", arrival, self.fetch_timeout);
        let persist = Deadline::starting_at("persist", arrival, self.persist_timeout);

        let quote = fetch
            .run(self.provider.fetch_quote())
            .await
            .map_err(UpstreamError::Timeout)??;
        debug!(bid = %quote.bid, "Quote fetched");

        let persisted = persist
            .run(self.store.insert(&quote))
            .await
            .map_err(PersistError::Timeout)
            .and_then(|inserted| inserted);

        if let Err(e) = &persisted {
            warn!(error = %e, "Quote was not persisted");
        }

        Ok(PipelineOutcome { quote, persisted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

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

    enum Behavior {
        Answer(Duration),
        Fail(fn() -> UpstreamError),
    }

    struct FakeProvider {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl QuoteProvider for FakeProvider {
        async fn fetch_quote(&self) -> Result<Quote, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Answer(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(sample_quote())
                }
                Behavior::Fail(make_err) => Err(make_err()),
            }
        }
    }

    fn pipeline(provider: Arc<FakeProvider>, store: Arc<MemoryStore>) -> QuotePipeline {
        QuotePipeline::new(
            provider,
            store,
            Duration::from_millis(100),
            Duration::from_millis(20),
        )
    }

    #[tokio::test]
    async fn test_success_persists_once() {
        let provider = FakeProvider::new(Behavior::Answer(Duration::ZERO));
        let store = Arc::new(MemoryStore::new());

        let outcome = pipeline(provider, Arc::clone(&store)).run().await.unwrap();

        assert_eq!(outcome.quote, sample_quote());
        assert_eq!(outcome.persisted.unwrap(), 1);
        assert_eq!(store.attempts(), 1);
        assert_eq!(store.rows().await, vec![sample_quote()]);
    }

    #[tokio::test]
    async fn test_fetch_timeout_skips_persist() {
        let provider = FakeProvider::new(Behavior::Answer(Duration::from_millis(500)));
        let store = Arc::new(MemoryStore::new());

        let err = pipeline(provider, Arc::clone(&store)).run().await.unwrap_err();

        assert!(matches!(err, UpstreamError::Timeout(d) if d == Duration::from_millis(100)));
        assert_eq!(store.attempts(), 0);
    }

    #[tokio::test]
    async fn test_decode_error_skips_persist() {
        let provider = FakeProvider::new(Behavior::Fail(|| {
            UpstreamError::Decode("missing key USDBRL".to_string())
        }));
        let store = Arc::new(MemoryStore::new());

        let err = pipeline(Arc::clone(&provider), Arc::clone(&store))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::Decode(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.attempts(), 0);
    }

    #[tokio::test]
    async fn test_fast_transport_error_is_not_reported_as_timeout() {
        let provider = FakeProvider::new(Behavior::Fail(|| {
            UpstreamError::Transport("connection refused".to_string())
        }));
        let store = Arc::new(MemoryStore::new());

        let err = pipeline(provider, Arc::clone(&store)).run().await.unwrap_err();

        assert!(matches!(err, UpstreamError::Transport(_)));
        assert_eq!(store.attempts(), 0);
    }

    #[tokio::test]
    async fn test_persist_timeout_still_returns_quote() {
        let provider = FakeProvider::new(Behavior::Answer(Duration::ZERO));
        let store = Arc::new(MemoryStore::new().with_write_delay(Duration::from_millis(200)));

        let outcome = pipeline(provider, Arc::clone(&store)).run().await.unwrap();

        assert_eq!(outcome.quote.bid, "5.25");
        assert!(matches!(outcome.persisted, Err(PersistError::Timeout(_))));
        assert_eq!(outcome.persist_status(), "timeout");
        assert_eq!(store.attempts(), 1);
        assert!(store.rows().await.is_empty());
    }

    #[tokio::test]
    async fn test_persist_error_still_returns_quote() {
        let provider = FakeProvider::new(Behavior::Answer(Duration::ZERO));
        let store = Arc::new(MemoryStore::new().failing("database is locked"));

        let outcome = pipeline(provider, Arc::clone(&store)).run().await.unwrap();

        assert_eq!(outcome.quote.bid, "5.25");
        assert_eq!(outcome.persist_status(), "error");
        assert_eq!(store.attempts(), 1);
    }

    #[tokio::test]
    async fn test_slow_fetch_leaves_persist_out_of_time() {
        // Fetch ends ~80ms after arrival, past the 20ms persist deadline
        let provider = FakeProvider::new(Behavior::Answer(Duration::from_millis(80)));
        let store = Arc::new(MemoryStore::new().with_write_delay(Duration::from_millis(5)));

        let outcome = pipeline(provider, Arc::clone(&store)).run().await.unwrap();

        assert_eq!(outcome.quote.bid, "5.25");
        assert!(
            matches!(outcome.persisted, Err(PersistError::Timeout(d)) if d == Duration::from_millis(20))
        );
        assert_eq!(outcome.persist_status(), "timeout");
        assert!(store.rows().await.is_empty());
    }

    #[tokio::test]
    async fn test_quick_fetch_leaves_persist_the_rest_of_its_budget() {
        let provider = FakeProvider::new(Behavior::Answer(Duration::from_millis(2)));
        let store = Arc::new(MemoryStore::new().with_write_delay(Duration::from_millis(2)));
        let pipeline = QuotePipeline::new(
            provider,
            store.clone(),
            Duration::from_millis(100),
            Duration::from_millis(60),
        );

        let outcome = pipeline.run().await.unwrap();

        assert_eq!(outcome.persist_status(), "ok");
        assert_eq!(store.rows().await, vec![sample_quote()]);
    }
}
