use crate::core::error::PersistError;
use crate::core::quote::Quote;
use crate::core::store::QuoteStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::Path;
use tracing::{debug, info};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS exchange (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT,
    codein TEXT,
    name TEXT,
    high TEXT,
    low TEXT,
    var_bid TEXT,
    pct_change TEXT,
    bid TEXT,
    ask TEXT,
    timestamp TEXT,
    create_date TEXT
)
"#;

const INSERT_QUOTE: &str = "INSERT INTO exchange \
    (code, codein, name, high, low, var_bid, pct_change, bid, ask, timestamp, create_date) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// SQLite backed store holding one `exchange` row per fetched quote.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and makes sure the
    /// `exchange` table exists. Called once at startup.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open store: {}", path.display()))?;

        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .context("Failed to create exchange table")?;
        info!(path = %path.display(), "Store ready");

        Ok(Self { pool })
    }

    /// Number of stored quotes.
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM exchange")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Most recently stored quotes, newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Quote>> {
        let rows = sqlx::query_as::<_, QuoteRow>(
            "SELECT code, codein, name, high, low, var_bid, pct_change, bid, ask, timestamp, create_date \
             FROM exchange ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Quote::from).collect())
    }
}

#[derive(sqlx::FromRow)]
struct QuoteRow {
    code: String,
    codein: String,
    name: String,
    high: String,
    low: String,
    var_bid: String,
    pct_change: String,
    bid: String,
    ask: String,
    timestamp: String,
    create_date: String,
}

impl From<QuoteRow> for Quote {
    fn from(row: QuoteRow) -> Self {
        Quote {
            code: row.code,
            codein: row.codein,
            name: row.name,
            high: row.high,
            low: row.low,
            var_bid: row.var_bid,
            pct_change: row.pct_change,
            bid: row.bid,
            ask: row.ask,
            timestamp: row.timestamp,
            create_date: row.create_date,
        }
    }
}

#[async_trait]
impl QuoteStore for SqliteStore {
    async fn insert(&self, quote: &Quote) -> Result<i64, PersistError> {
        let result = sqlx::query(INSERT_QUOTE)
            .bind(quote.code.as_str())
            .bind(quote.codein.as_str())
            .bind(quote.name.as_str())
            .bind(quote.high.as_str())
            .bind(quote.low.as_str())
            .bind(quote.var_bid.as_str())
            .bind(quote.pct_change.as_str())
            .bind(quote.bid.as_str())
            .bind(quote.ask.as_str())
            .bind(quote.timestamp.as_str())
            .bind(quote.create_date.as_str())
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        debug!(id, "Quote persisted");
        Ok(id)
    }
}
