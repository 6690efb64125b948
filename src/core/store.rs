//! Persistence abstraction for completed quotes

use crate::core::error::PersistError;
use crate::core::quote::Quote;
use async_trait::async_trait;

/// A sink that accepts one row per successfully fetched quote.
///
/// Implementations must be safe to call from concurrent requests; the
/// pipeline does no locking of its own.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Inserts `quote` and returns the new row id.
    async fn insert(&self, quote: &Quote) -> Result<i64, PersistError>;
}
