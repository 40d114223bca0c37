//! Read-only query execution.
//!
//! Given classifier-approved SQL, the executor acquires a session from the
//! current handle's pool, best-effort sets read-only transaction mode on
//! that session, executes, and materializes a capped result set before the
//! session is released. The pooled session is a scoped guard: it returns to
//! the pool on every exit path, including driver errors.
//!
//! # Architecture
//!
//! Database-specific fetch paths live in submodules (`mysql`, `postgres`,
//! `sqlite`) with intentionally parallel structure; a shared generic
//! projection step shapes the rows.

use crate::db::ident::quote_identifier;
use crate::db::manager::{ConnectionHandle, DbPool};
use crate::db::rows::RowToJson;
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, MAX_RESULT_ROWS, QueryResult};
use crate::tools::classifier::{ClassifierPolicy, Verdict, classify};
use futures_util::StreamExt;
use std::time::Instant;
use tracing::{debug, warn};

/// Executes validated read-only statements against the current handle.
pub struct QueryExecutor {
    policy: ClassifierPolicy,
    row_cap: usize,
}

impl QueryExecutor {
    /// Create an executor with the given classifier policy and the shared
    /// result-row cap.
    pub fn new(policy: ClassifierPolicy) -> Self {
        Self {
            policy,
            row_cap: MAX_RESULT_ROWS,
        }
    }

    /// Execute a caller-supplied SQL statement.
    ///
    /// The statement is classified first; a reject becomes a validation
    /// error whose message names the violated rule. One trailing `;` is
    /// stripped from approved SQL before execution (accepted by the gate,
    /// but not by every driver's prepared path).
    pub async fn execute(&self, handle: &ConnectionHandle, sql: &str) -> DbResult<QueryResult> {
        match classify(sql, &self.policy) {
            Verdict::Accept => {}
            Verdict::Reject(reason) => {
                debug!(reason = ?reason, "Statement rejected by read-only gate");
                return Err(DbError::validation(reason.message()));
            }
        }

        let sql_to_run = strip_trailing_semicolon(sql);
        self.run(handle, sql_to_run, None).await
    }

    /// Fetch up to `limit` rows from a catalog-validated table.
    ///
    /// The caller is responsible for validating `table` against the live
    /// catalog; this method quotes it for the dialect and binds the limit as
    /// a parameter. The generated statement bypasses the prefix gate — its
    /// shape is fixed here, and quoting neutralizes identifier content.
    pub async fn sample(
        &self,
        handle: &ConnectionHandle,
        table: &str,
        limit: i64,
    ) -> DbResult<QueryResult> {
        let quoted = quote_identifier(table, handle.db_type());
        let placeholder = match handle.db_type() {
            DatabaseType::PostgreSQL => "$1",
            DatabaseType::MySQL | DatabaseType::SQLite => "?",
        };
        let sql = format!("SELECT * FROM {} LIMIT {}", quoted, placeholder);
        self.run(handle, &sql, Some(limit)).await
    }

    async fn run(
        &self,
        handle: &ConnectionHandle,
        sql: &str,
        bind_limit: Option<i64>,
    ) -> DbResult<QueryResult> {
        let start = Instant::now();
        // One extra row distinguishes "exactly at the cap" from "truncated"
        let fetch_limit = self.row_cap + 1;

        debug!(sql = %sql, bind_limit = ?bind_limit, "Executing query");

        match handle.pool() {
            DbPool::MySql(p) => {
                let rows = mysql::fetch_rows(p, sql, bind_limit, fetch_limit).await?;
                Ok(project_rows(rows, self.row_cap, start))
            }
            DbPool::Postgres(p) => {
                let rows = postgres::fetch_rows(p, sql, bind_limit, fetch_limit).await?;
                Ok(project_rows(rows, self.row_cap, start))
            }
            DbPool::SQLite(p) => {
                let rows = sqlite::fetch_rows(p, sql, bind_limit, fetch_limit).await?;
                Ok(project_rows(rows, self.row_cap, start))
            }
        }
    }
}

/// Strip one optional trailing `;` and surrounding whitespace.
fn strip_trailing_semicolon(sql: &str) -> &str {
    let trimmed = sql.trim_end();
    match trimmed.strip_suffix(';') {
        Some(head) => head.trim_end(),
        None => trimmed,
    }
}

/// Project driver rows into a capped QueryResult.
fn project_rows<R: RowToJson>(rows: Vec<R>, row_cap: usize, start: Instant) -> QueryResult {
    let execution_time_ms = start.elapsed().as_millis() as u64;

    if rows.is_empty() {
        return QueryResult::empty(execution_time_ms);
    }

    let columns = rows[0].column_metadata();
    let truncated = rows.len() > row_cap;
    let json_rows: Vec<_> = rows
        .iter()
        .take(row_cap)
        .map(|r| r.to_json_map())
        .collect();

    if truncated {
        warn!(cap = row_cap, "Query result truncated at row cap");
    }

    QueryResult {
        columns,
        rows: json_rows,
        truncated,
        execution_time_ms,
    }
}

fn collect_rows<R>(results: Vec<Result<R, sqlx::Error>>) -> DbResult<Vec<R>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(DbError::from)?);
    }
    Ok(rows)
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module acquires a dedicated session so the read-only flag applies to
// the same session that runs the statement. The flag is best-effort: SQLite
// has no such statement, and its failure is logged and deliberately ignored
// (the statement gate and the read-only file open remain in effect).

mod mysql {
    use super::*;
    use sqlx::MySqlPool;
    use sqlx::mysql::MySqlRow;

    pub async fn fetch_rows(
        pool: &MySqlPool,
        sql: &str,
        bind_limit: Option<i64>,
        fetch_limit: usize,
    ) -> DbResult<Vec<MySqlRow>> {
        let mut conn = pool.acquire().await?;

        if let Err(e) = sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *conn)
            .await
        {
            debug!(error = %e, "Read-only session flag not supported; statement gate remains in effect");
        }

        let results = match bind_limit {
            Some(limit) => {
                let stream = sqlx::query(sql).bind(limit).fetch(&mut *conn);
                stream.take(fetch_limit).collect::<Vec<_>>().await
            }
            None => {
                use sqlx::Executor;
                let stream = (&mut *conn).fetch(sql);
                stream.take(fetch_limit).collect::<Vec<_>>().await
            }
        };

        collect_rows(results)
        // conn drops here and returns to the pool on every path
    }
}

mod postgres {
    use super::*;
    use sqlx::PgPool;
    use sqlx::postgres::PgRow;

    pub async fn fetch_rows(
        pool: &PgPool,
        sql: &str,
        bind_limit: Option<i64>,
        fetch_limit: usize,
    ) -> DbResult<Vec<PgRow>> {
        let mut conn = pool.acquire().await?;

        if let Err(e) = sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *conn)
            .await
        {
            debug!(error = %e, "Read-only session flag not supported; statement gate remains in effect");
        }

        let results = match bind_limit {
            Some(limit) => {
                let stream = sqlx::query(sql).bind(limit).fetch(&mut *conn);
                stream.take(fetch_limit).collect::<Vec<_>>().await
            }
            None => {
                use sqlx::Executor;
                let stream = (&mut *conn).fetch(sql);
                stream.take(fetch_limit).collect::<Vec<_>>().await
            }
        };

        collect_rows(results)
    }
}

mod sqlite {
    use super::*;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqliteRow;

    pub async fn fetch_rows(
        pool: &SqlitePool,
        sql: &str,
        bind_limit: Option<i64>,
        fetch_limit: usize,
    ) -> DbResult<Vec<SqliteRow>> {
        let mut conn = pool.acquire().await?;

        if let Err(e) = sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *conn)
            .await
        {
            debug!(error = %e, "Read-only session flag not supported; statement gate remains in effect");
        }

        let results = match bind_limit {
            Some(limit) => {
                let stream = sqlx::query(sql).bind(limit).fetch(&mut *conn);
                stream.take(fetch_limit).collect::<Vec<_>>().await
            }
            None => {
                use sqlx::Executor;
                let stream = (&mut *conn).fetch(sql);
                stream.take(fetch_limit).collect::<Vec<_>>().await
            }
        };

        collect_rows(results)
    }
}
