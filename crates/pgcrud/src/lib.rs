//! # pgcrud
//!
//! Small CRUD and schema helpers for PostgreSQL over a pooled connection.
//!
//! ## Features
//!
//! - **Request builders**: insert, select, update and delete from plain values
//! - **Two filter shapes**: a caller-written condition with `?` placeholders, or a
//!   column → value mapping bound automatically
//! - **Per-call schema targeting**: run any statement inside another schema
//!   without leaking `search_path` back into the pool
//! - **Safe defaults**: DELETE requires WHERE; every value is a bound parameter
//! - **Schema loading**: create and drop tables from a JSON description
//! - **SQL logging**: generated statements go to the `pgcrud.sql` tracing target
//!
//! ```ignore
//! use pgcrud::{Db, DbConfig, SelectRequest, WhereMap};
//!
//! let db = Db::connect(DbConfig::from_file("pgcrud.toml")?)?;
//!
//! let active = db
//!     .select(
//!         &SelectRequest::new("users")
//!             .filter(WhereMap::new().eq("status", "active"))
//!             .order_by("created_at", Some("desc"))
//!             .additions("LIMIT ?")
//!             .bind(10_i64),
//!     )
//!     .await?;
//!
//! let exists = db
//!     .does_exist("users", WhereMap::new().eq("email", "a@b.c"), None)
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod crud;
pub mod debug;
pub mod error;
pub mod executor;
pub mod filter;
pub mod ident;
pub mod param;
pub mod pool;
pub mod row;
pub mod schema;
pub mod sql;

#[cfg(test)]
mod testing;

pub use client::GenericClient;
pub use config::DbConfig;
pub use crud::{
    Db, DeleteRequest, Direction, Fields, InsertRequest, OrderBy, SelectRequest, UpdateRequest,
};
pub use debug::{DebugOptions, SqlLogLevel};
pub use error::{CrudError, CrudResult};
pub use executor::Executor;
pub use filter::{Connective, Filter, FilterFragment, Predicate, WhereMap};
pub use param::Param;
pub use pool::{ConnectionPool, create_pool, create_pool_with_manager_config, create_pool_with_tls};
pub use row::{FromRow, RowExt};
pub use schema::{ColumnDef, DefaultValue, Schema, TableDef, create_tables_sql, drop_tables_sql};
pub use sql::Sql;

// Driver types callers need for rows and parameters.
pub use tokio_postgres::Row;
pub use tokio_postgres::types::ToSql;
