//! Statement execution over a pooled connection.
//!
//! Every call runs the same protocol:
//!
//! 1. acquire one connection;
//! 2. if a target schema is given, switch `search_path` on that connection;
//! 3. run the statement with bound parameters;
//! 4. reset `search_path` (if switched) and release the connection;
//! 5. return only the caller's statement result.
//!
//! The connection is owned by the calling method and handed to
//! [`Executor::finish`], which drops it before the result (or error) leaves,
//! so release happens exactly once per call.

use crate::client::GenericClient;
use crate::debug::DebugOptions;
use crate::error::CrudResult;
use crate::ident::quote_ident;
use crate::param::{Param, params_ref};
use crate::pool::ConnectionPool;
use crate::sql::Sql;
use tokio_postgres::Row;

const RESET_SEARCH_PATH: &str = "RESET search_path";

/// Runs statements against connections taken from `P`.
#[derive(Debug, Clone)]
pub struct Executor<P> {
    pool: P,
    debug: DebugOptions,
}

/// Build the namespace switch for a non-blank schema name.
pub(crate) fn switch_statement(schema: Option<&str>) -> CrudResult<Option<String>> {
    match schema.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => Ok(Some(format!("SET search_path TO {}", quote_ident(name)?))),
        None => Ok(None),
    }
}

async fn apply_switch<C: GenericClient>(conn: &C, switch: Option<&str>) -> CrudResult<()> {
    match switch {
        // Result of the switch is discarded; only the caller's statement counts.
        Some(s) => conn.batch_execute(s).await,
        None => Ok(()),
    }
}

impl<P: ConnectionPool> Executor<P> {
    pub fn new(pool: P, debug: DebugOptions) -> Self {
        Self { pool, debug }
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn debug(&self) -> &DebugOptions {
        &self.debug
    }

    /// Run a statement and return its rows.
    pub async fn query(&self, stmt: &Sql, schema: Option<&str>) -> CrudResult<Vec<Row>> {
        stmt.validate()?;
        self.query_raw(&stmt.to_sql(), &stmt.params(), schema).await
    }

    /// Run a statement and return the affected row count.
    pub async fn execute(&self, stmt: &Sql, schema: Option<&str>) -> CrudResult<u64> {
        stmt.validate()?;
        self.execute_raw(&stmt.to_sql(), &stmt.params(), schema).await
    }

    /// Run pre-numbered SQL (`$1, $2, ...`) and return its rows.
    pub async fn query_raw(
        &self,
        sql: &str,
        params: &[Param],
        schema: Option<&str>,
    ) -> CrudResult<Vec<Row>> {
        // Validated before acquiring, so a bad name never takes a connection.
        let switch = switch_statement(schema)?;
        let conn = self.pool.acquire().await?;
        let outcome = match apply_switch(&conn, switch.as_deref()).await {
            Ok(()) => conn.query(sql, &params_ref(params)).await,
            Err(err) => Err(err),
        };
        self.finish(conn, switch.as_deref(), sql, params.len(), outcome)
            .await
    }

    /// Run pre-numbered SQL (`$1, $2, ...`) and return the affected row count.
    pub async fn execute_raw(
        &self,
        sql: &str,
        params: &[Param],
        schema: Option<&str>,
    ) -> CrudResult<u64> {
        let switch = switch_statement(schema)?;
        let conn = self.pool.acquire().await?;
        let outcome = match apply_switch(&conn, switch.as_deref()).await {
            Ok(()) => conn.execute(sql, &params_ref(params)).await,
            Err(err) => Err(err),
        };
        self.finish(conn, switch.as_deref(), sql, params.len(), outcome)
            .await
    }

    /// Run a parameterless multi-statement batch.
    ///
    /// The schema switch, if any, is prefixed to the batch text on its own
    /// line; the reset is always sent as a separate call.
    pub async fn batch(&self, sql: &str, schema: Option<&str>) -> CrudResult<()> {
        let switch = switch_statement(schema)?;
        let batch = match &switch {
            Some(s) => format!("{s};\n{sql}"),
            None => sql.to_string(),
        };
        let conn = self.pool.acquire().await?;
        let outcome = conn.batch_execute(&batch).await;
        self.finish(conn, switch.as_deref(), sql, 0, outcome).await
    }

    /// Reset the search path if it was switched, release the connection and log.
    async fn finish<T>(
        &self,
        conn: P::Conn,
        switch: Option<&str>,
        sql: &str,
        param_count: usize,
        outcome: CrudResult<T>,
    ) -> CrudResult<T> {
        if switch.is_some() {
            if let Err(err) = conn.batch_execute(RESET_SEARCH_PATH).await {
                tracing::warn!(target: "pgcrud.sql", error = %err, "failed to reset search_path");
            }
        }
        drop(conn);

        let exec_sql = match switch {
            Some(s) => format!("{s}; {sql}"),
            None => sql.to_string(),
        };
        self.debug.log_sql(&exec_sql, param_count);
        if let Err(err) = &outcome {
            tracing::error!(
                target: "pgcrud.sql",
                sql = %exec_sql,
                error = %err,
                "statement failed"
            );
        }
        outcome
    }
}
