//! Connection pool seam and `deadpool-postgres` construction helpers.

use crate::client::GenericClient;
use crate::config::DbConfig;
use crate::error::{CrudError, CrudResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolBuilder, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres::Socket;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};

/// Hands out connections, one per statement.
///
/// A connection is released by dropping it. The executor owns each connection
/// for exactly one dispatch, so release happens once on every path.
pub trait ConnectionPool: Send + Sync {
    /// The connection handle.
    type Conn: GenericClient;

    /// Take a connection from the pool, waiting if none is free.
    fn acquire(&self) -> impl std::future::Future<Output = CrudResult<Self::Conn>> + Send;
}

impl ConnectionPool for Pool {
    type Conn = deadpool_postgres::Client;

    async fn acquire(&self) -> CrudResult<Self::Conn> {
        Ok(self.get().await?)
    }
}

/// Create a pool from a [`DbConfig`] using `NoTls`.
///
/// # Example
///
/// ```ignore
/// let config = pgcrud::DbConfig::from_file("pgcrud.toml")?;
/// let pool = pgcrud::create_pool(&config)?;
/// let db = pgcrud::Db::new(pool, config);
/// ```
pub fn create_pool(config: &DbConfig) -> CrudResult<Pool> {
    create_pool_with_tls(config, NoTls)
}

/// Create a pool using a custom TLS connector.
pub fn create_pool_with_tls<T>(config: &DbConfig, tls: T) -> CrudResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let max_size = config.max_pool_size;
    create_pool_with_manager_config(&config.database_url, tls, default_manager_config(), |b| {
        b.max_size(max_size)
    })
}

/// Create a pool with an injected `ManagerConfig` and `PoolBuilder` tuning.
///
/// Prefer a recycling method that resets session state (`RecyclingMethod::Clean`),
/// since schema switches change `search_path` on the connection.
pub fn create_pool_with_manager_config<T>(
    database_url: &str,
    tls: T,
    manager_config: ManagerConfig,
    configure_pool: impl FnOnce(PoolBuilder) -> PoolBuilder,
) -> CrudResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| CrudError::Connection(e.to_string()))?;

    let mgr = Manager::from_config(pg_config, tls, manager_config);
    configure_pool(Pool::builder(mgr))
        .build()
        .map_err(|e| CrudError::Pool(e.to_string()))
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Clean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_url() {
        let config = DbConfig::new("definitely not a url ::");
        let err = create_pool(&config).unwrap_err();
        assert!(matches!(err, CrudError::Connection(_)));
    }

    #[test]
    fn builds_without_connecting() {
        let config = DbConfig::new("postgres://app@localhost:5432/app").with_max_pool_size(3);
        let pool = create_pool(&config).unwrap();
        assert_eq!(pool.status().max_size, 3);
    }
}
