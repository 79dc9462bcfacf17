//! Database connection management

use std::time::Duration;

use sqlx::{
    PgPool, Postgres, Row, Transaction, migrate::MigrateError, postgres::PgPoolOptions,
    postgres::PgRow,
};

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction on the shared pool.
    ///
    /// # Errors
    ///
    /// Returns an error when no connection can be acquired.
    pub async fn begin_transaction(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }
}

/// Connection pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,

    /// How long a request waits for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 16,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Connect to `PostgreSQL` with the default pool settings.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    connect_with(database_url, PoolSettings::default()).await
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(database_url: &str, settings: PoolSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect(database_url)
        .await
}

/// Apply the bundled schema migrations.
///
/// # Errors
///
/// Returns an error when a migration fails or the history is inconsistent.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// Read a non-negative `BIGINT` minor-unit amount.
pub(crate) fn try_get_amount(row: &PgRow, column: &str) -> sqlx::Result<u64> {
    let value: i64 = row.try_get(column)?;

    u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Read a non-negative `INTEGER` count (stock, quantity).
pub(crate) fn try_get_count(row: &PgRow, column: &str) -> sqlx::Result<u32> {
    let value: i32 = row.try_get(column)?;

    u32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Convert an amount for binding as `BIGINT`.
pub(crate) fn amount_param(column: &str, amount: u64) -> sqlx::Result<i64> {
    i64::try_from(amount).map_err(|e| sqlx::Error::Encode(format!("{column}: {e}").into()))
}

/// Convert a count for binding as `INTEGER`.
pub(crate) fn count_param(column: &str, count: u32) -> sqlx::Result<i32> {
    i32::try_from(count).map_err(|e| sqlx::Error::Encode(format!("{column}: {e}").into()))
}

/// Read a non-negative `SMALLINT` (ratings).
pub(crate) fn try_get_small<T>(row: &PgRow, column: &str) -> sqlx::Result<T>
where
    T: TryFrom<i16>,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    let value: i16 = row.try_get(column)?;

    T::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Convert a rating for binding as `SMALLINT`.
pub(crate) fn small_param(column: &str, value: u16) -> sqlx::Result<i16> {
    i16::try_from(value).map_err(|e| sqlx::Error::Encode(format!("{column}: {e}").into()))
}
