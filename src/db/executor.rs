//! Query execution engine.
//!
//! This module provides query execution functionality with support for:
//! - Positional `?` parameters, checked against the argument count
//! - Row limits (enforced via streaming - only fetches needed rows)
//! - Statement timeouts
//! - Explicit transactions around writes when the pool is not in autocommit mode
//!
//! # Architecture
//!
//! The executor uses database-specific implementations organized in submodules:
//! - `mysql`: MySQL-specific read and write operations
//! - `sqlite`: SQLite-specific read and write operations
//!
//! Each submodule provides identical functionality adapted to the database's type system.

use crate::config::{DEFAULT_QUERY_TIMEOUT_SECS, RowCountPolicy};
use crate::db::pool::ConnectionPool;
use crate::db::sql::to_native;
use crate::db::types::RowToValues;
use crate::error::{DbError, DbResult};
use crate::impl_db_dispatch;
use crate::models::{Row, Value};
use futures_util::StreamExt;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Runs statements against a [`ConnectionPool`].
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    pool: ConnectionPool,
    query_timeout: Duration,
    row_count_policy: RowCountPolicy,
}

impl QueryExecutor {
    /// Create a new query executor with default settings.
    pub fn new(pool: ConnectionPool) -> Self {
        Self {
            pool,
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            row_count_policy: RowCountPolicy::default(),
        }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    pub fn with_row_count_policy(mut self, policy: RowCountPolicy) -> Self {
        self.row_count_policy = policy;
        self
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    pub fn row_count_policy(&self) -> RowCountPolicy {
        self.row_count_policy
    }

    /// Run a row-returning statement.
    ///
    /// With `limit`, at most that many rows are pulled from the driver.
    pub async fn select(
        &self,
        sql: &str,
        args: &[Value],
        limit: Option<usize>,
    ) -> DbResult<Vec<Row>> {
        let start = Instant::now();
        let sql = to_native(sql, self.pool.db_type(), args.len())?;

        debug!(
            sql = %sql,
            params = args.len(),
            limit = ?limit,
            timeout_ms = self.query_timeout.as_millis() as u64,
            "Executing query"
        );

        let mut conn = self.pool.acquire().await?;
        let rows = impl_db_dispatch!(PooledConnection, &mut conn, {
            MySql(c) => mysql::fetch_rows(c, &sql, args, limit, self.query_timeout).await?,
            SQLite(c) => sqlite::fetch_rows(c, &sql, args, limit, self.query_timeout).await?,
        });

        info!(
            rows = rows.len(),
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Query returned rows"
        );
        Ok(rows)
    }

    /// Run a write statement and return the affected-row count.
    ///
    /// When the pool is not in autocommit mode the statement runs inside a
    /// transaction: committed on success, rolled back on failure or timeout,
    /// in which case the original error is returned.
    pub async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        let start = Instant::now();
        let sql = to_native(sql, self.pool.db_type(), args.len())?;
        let autocommit = self.pool.autocommit();

        debug!(
            sql = %sql,
            params = args.len(),
            autocommit,
            timeout_ms = self.query_timeout.as_millis() as u64,
            "Executing statement"
        );

        let mut conn = self.pool.acquire().await?;
        let rows_affected = impl_db_dispatch!(PooledConnection, &mut conn, {
            MySql(c) => mysql::execute(c, &sql, args, autocommit, self.query_timeout).await?,
            SQLite(c) => sqlite::execute(c, &sql, args, autocommit, self.query_timeout).await?,
        });

        info!(
            rows_affected,
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Statement executed"
        );
        Ok(rows_affected)
    }

    /// Apply the row-count policy to a model operation that should touch exactly one row.
    pub(crate) fn check_row_count(&self, operation: &str, rows_affected: u64) -> DbResult<u64> {
        if rows_affected == 1 {
            return Ok(rows_affected);
        }
        match self.row_count_policy {
            RowCountPolicy::Warn => {
                warn!(
                    operation,
                    expected = 1,
                    actual = rows_affected,
                    "Unexpected affected row count"
                );
                Ok(rows_affected)
            }
            RowCountPolicy::Error => Err(DbError::row_count(operation, 1, rows_affected)),
        }
    }
}

// =============================================================================
// Common Helper Functions
// =============================================================================

fn collect_rows<R: RowToValues>(results: Vec<Result<R, sqlx::Error>>) -> DbResult<Vec<Row>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(DbError::from)?.to_row());
    }
    Ok(rows)
}

fn timeout_error(operation: &str, timeout: Duration) -> DbError {
    DbError::timeout(operation, timeout)
}

/// Roll back after a failed statement, keeping the statement's error.
async fn finish_failed<DB: sqlx::Database>(tx: sqlx::Transaction<'_, DB>, error: DbError) -> DbError {
    match tx.rollback().await {
        Ok(()) => debug!(error = %error, "Transaction rolled back"),
        Err(rollback_err) => warn!(
            error = %error,
            rollback_error = %rollback_err,
            "Rollback failed"
        ),
    }
    error
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.
// The code structure is intentionally parallel to make differences obvious.

mod mysql {
    use super::*;
    use crate::db::params::mysql_query;
    use sqlx::pool::PoolConnection;
    use sqlx::{Connection as _, MySql, MySqlConnection};

    pub async fn fetch_rows(
        conn: &mut PoolConnection<MySql>,
        sql: &str,
        params: &[Value],
        limit: Option<usize>,
        query_timeout: Duration,
    ) -> DbResult<Vec<Row>> {
        // When params is empty, use raw SQL to avoid prepared statement issues
        let stream = if params.is_empty() {
            use sqlx::Executor;
            (&mut **conn).fetch(sql)
        } else {
            mysql_query(sql, params).fetch(&mut **conn)
        };
        let rows_future = stream.take(limit.unwrap_or(usize::MAX)).collect::<Vec<_>>();

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute(
        conn: &mut PoolConnection<MySql>,
        sql: &str,
        params: &[Value],
        autocommit: bool,
        query_timeout: Duration,
    ) -> DbResult<u64> {
        if autocommit {
            return execute_write(conn, sql, params, query_timeout).await;
        }

        let mut tx = conn.begin().await?;
        debug!("Transaction started");
        match execute_write(&mut tx, sql, params, query_timeout).await {
            Ok(rows_affected) => {
                tx.commit().await?;
                debug!("Transaction committed");
                Ok(rows_affected)
            }
            Err(e) => Err(finish_failed(tx, e).await),
        }
    }

    async fn execute_write(
        conn: &mut MySqlConnection,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<u64> {
        // When params is empty, execute raw SQL directly to avoid prepared statement issues
        // (some SQL like CREATE PROCEDURE doesn't support prepared statements)
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(query_timeout, conn.execute(sql)).await
        } else {
            timeout(query_timeout, mysql_query(sql, params).execute(conn)).await
        };

        match result {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write operation", query_timeout)),
        }
    }
}

mod sqlite {
    use super::*;
    use crate::db::params::sqlite_query;
    use sqlx::pool::PoolConnection;
    use sqlx::{Connection as _, Sqlite, SqliteConnection};

    pub async fn fetch_rows(
        conn: &mut PoolConnection<Sqlite>,
        sql: &str,
        params: &[Value],
        limit: Option<usize>,
        query_timeout: Duration,
    ) -> DbResult<Vec<Row>> {
        let stream = if params.is_empty() {
            use sqlx::Executor;
            (&mut **conn).fetch(sql)
        } else {
            sqlite_query(sql, params).fetch(&mut **conn)
        };
        let rows_future = stream.take(limit.unwrap_or(usize::MAX)).collect::<Vec<_>>();

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute(
        conn: &mut PoolConnection<Sqlite>,
        sql: &str,
        params: &[Value],
        autocommit: bool,
        query_timeout: Duration,
    ) -> DbResult<u64> {
        if autocommit {
            return execute_write(conn, sql, params, query_timeout).await;
        }

        let mut tx = conn.begin().await?;
        debug!("Transaction started");
        match execute_write(&mut tx, sql, params, query_timeout).await {
            Ok(rows_affected) => {
                tx.commit().await?;
                debug!("Transaction committed");
                Ok(rows_affected)
            }
            Err(e) => Err(finish_failed(tx, e).await),
        }
    }

    async fn execute_write(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<u64> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(query_timeout, conn.execute(sql)).await
        } else {
            timeout(query_timeout, sqlite_query(sql, params).execute(conn)).await
        };

        match result {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write operation", query_timeout)),
        }
    }
}
