//! CRUD builders and the [`Db`] handle that runs them.
//!
//! Each operation takes a request value, builds one parameterized statement and
//! runs it through the [`Executor`] on its own pooled connection.
//!
//! ```ignore
//! use pgcrud::{Db, DbConfig, InsertRequest, SelectRequest, UpdateRequest, DeleteRequest, WhereMap};
//!
//! let db = Db::connect(DbConfig::from_file("pgcrud.toml")?)?;
//!
//! let id = db.insert(&InsertRequest::new("users").set("name", "alice")).await?;
//!
//! let rows = db
//!     .select(
//!         &SelectRequest::new("users")
//!             .fields(["id", "name"])
//!             .filter(WhereMap::new().eq("id", id))
//!             .order_by("name", None),
//!     )
//!     .await?;
//!
//! db.update(&UpdateRequest::new("users").set("name", "bob").filter(WhereMap::new().eq("id", id)))
//!     .await?;
//! db.delete(&DeleteRequest::new("users").filter("id = ?").bind(id)).await?;
//! ```
//!
//! Caller-written fragments (raw filters and `additions`) use `?` placeholders.
//! Parameters are bound in placeholder order: update SET values, then structured
//! filter values, then the request's explicit params.

mod delete;
mod insert;
mod order;
mod readers;
mod select;
mod update;


pub use delete::DeleteRequest;
pub use insert::InsertRequest;
pub use order::{Direction, OrderBy};
pub use select::SelectRequest;
pub use update::UpdateRequest;

use crate::config::DbConfig;
use crate::error::{CrudError, CrudResult};
use crate::executor::Executor;
use crate::ident::validate_identifier;
use crate::param::Param;
use crate::pool::{ConnectionPool, create_pool};
use crate::sql::Sql;
use std::sync::Arc;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// An ordered column → value mapping for inserts and updates.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: Vec<(String, Param)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `column = value`.
    pub fn set<T>(self, column: impl Into<String>, value: T) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.set_param(column, Param::new(value))
    }

    /// Add `column = param` for an already wrapped value.
    pub fn set_param(mut self, column: impl Into<String>, param: Param) -> Self {
        self.entries.push((column.into(), param));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.entries.iter().map(|(c, p)| (c.as_str(), p))
    }
}

impl FromIterator<(String, Param)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Param)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Entry point for all operations.
///
/// Cheap to clone; clones share the pool and configuration.
#[derive(Debug, Clone)]
pub struct Db<P> {
    executor: Executor<P>,
    config: Arc<DbConfig>,
}

impl Db<deadpool_postgres::Pool> {
    /// Build a `deadpool-postgres` pool from `config` and wrap it.
    ///
    /// No connection is opened until the first operation.
    pub fn connect(config: DbConfig) -> CrudResult<Self> {
        let pool = create_pool(&config)?;
        Ok(Self::new(pool, config))
    }
}

impl<P: ConnectionPool> Db<P> {
    pub fn new(pool: P, config: DbConfig) -> Self {
        Self {
            executor: Executor::new(pool, config.debug.clone()),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn executor(&self) -> &Executor<P> {
        &self.executor
    }

    /// The schema a request should run in: its own override, else the configured default.
    pub(crate) fn target_schema<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        requested.or(self.config.default_schema.as_deref())
    }

    /// Run arbitrary pre-built SQL with native `$1, $2, ...` placeholders.
    pub async fn run(
        &self,
        query: &str,
        params: &[Param],
        schema: Option<&str>,
    ) -> CrudResult<Vec<Row>> {
        if query.trim().is_empty() {
            return Err(CrudError::validation("query must not be empty"));
        }
        self.executor
            .query_raw(query, params, self.target_schema(schema))
            .await
    }

    /// Run arbitrary pre-built SQL with native placeholders and return the
    /// affected row count.
    pub async fn run_execute(
        &self,
        query: &str,
        params: &[Param],
        schema: Option<&str>,
    ) -> CrudResult<u64> {
        if query.trim().is_empty() {
            return Err(CrudError::validation("query must not be empty"));
        }
        self.executor
            .execute_raw(query, params, self.target_schema(schema))
            .await
    }

    /// Run a parameterless multi-statement batch.
    pub async fn run_batch(&self, sql: &str, schema: Option<&str>) -> CrudResult<()> {
        if sql.trim().is_empty() {
            return Err(CrudError::validation("batch must not be empty"));
        }
        self.executor.batch(sql, self.target_schema(schema)).await
    }
}

/// Validate a table name; empty names are a missing-table error.
pub(crate) fn table_name(table: &str) -> CrudResult<&str> {
    if table.trim().is_empty() {
        return Err(CrudError::validation("table name is required"));
    }
    validate_identifier(table)
}

/// Append free-form trailing SQL, if any.
pub(crate) fn push_additions(sql: &mut Sql, additions: &str) -> CrudResult<()> {
    let additions = additions.trim();
    if !additions.is_empty() {
        sql.push(" ");
        sql.push_fragment(additions)?;
    }
    Ok(())
}
