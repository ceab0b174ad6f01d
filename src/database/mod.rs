use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::Result;
use crate::types::DailyRecord;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Daily records keyed by date. The full record is stored as JSON in `payload`;
/// `regime` and `score_total` are copied out for ad-hoc queries.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the store and make sure the schema exists.
    pub async fn new(db_path: &str) -> Result<Self> {
        info!("Initializing SQLite database at: {}", db_path);

        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);

        // Every connection to :memory: is its own database
        let max_connections = if db_path.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.create_schema().await?;

        info!("Database initialized successfully");
        Ok(db)
    }

    async fn create_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_records (
                date TEXT PRIMARY KEY,
                regime TEXT,
                score_total REAL,
                payload TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or overwrite records by date, in one transaction.
    pub async fn upsert_records(&self, records: &[DailyRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            let payload = serde_json::to_string(record)?;
            sqlx::query(
                r#"
                INSERT INTO daily_records (date, regime, score_total, payload)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(date) DO UPDATE SET
                    regime = excluded.regime,
                    score_total = excluded.score_total,
                    payload = excluded.payload
                "#,
            )
            .bind(record.date.format(DATE_FORMAT).to_string())
            .bind(record.regime.as_ref().map(|r| r.regime.as_str()))
            .bind(record.score_total())
            .bind(payload)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Upserted {} daily records", records.len());
        Ok(())
    }

    /// Up to `limit` records dated strictly before `date`, oldest first.
    pub async fn records_before(&self, date: NaiveDate, limit: u32) -> Result<Vec<DailyRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT payload FROM daily_records
            WHERE date < ?
            ORDER BY date DESC
            LIMIT ?
            "#,
        )
        .bind(date.format(DATE_FORMAT).to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut records = decode_rows(rows)?;
        records.reverse();
        Ok(records)
    }

    pub async fn latest_before(&self, date: NaiveDate) -> Result<Option<DailyRecord>> {
        Ok(self.records_before(date, 1).await?.pop())
    }

    pub async fn latest(&self) -> Result<Option<DailyRecord>> {
        let row = sqlx::query("SELECT payload FROM daily_records ORDER BY date DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| decode(r.get("payload"))).transpose()
    }

    pub async fn record_for(&self, date: NaiveDate) -> Result<Option<DailyRecord>> {
        let row = sqlx::query("SELECT payload FROM daily_records WHERE date = ?")
            .bind(date.format(DATE_FORMAT).to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| decode(r.get("payload"))).transpose()
    }

    /// Every stored record, oldest first.
    pub async fn all_records(&self) -> Result<Vec<DailyRecord>> {
        let rows = sqlx::query("SELECT payload FROM daily_records ORDER BY date ASC")
            .fetch_all(&self.pool)
            .await?;

        decode_rows(rows)
    }
}

fn decode(payload: &str) -> Result<DailyRecord> {
    Ok(serde_json::from_str(payload)?)
}

fn decode_rows(rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<DailyRecord>> {
    rows.iter().map(|row| decode(row.get("payload"))).collect()
}
