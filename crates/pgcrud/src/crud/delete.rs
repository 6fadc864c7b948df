use super::{Db, push_additions, table_name};
use crate::error::{CrudError, CrudResult};
use crate::filter::Filter;
use crate::param::Param;
use crate::pool::ConnectionPool;
use crate::sql::Sql;
use tokio_postgres::types::ToSql;

/// `DELETE FROM <table> WHERE ... [additions]`
///
/// A filter is mandatory. An unrestricted delete looks exactly like a forgotten
/// filter, so it is refused before any connection is taken.
#[derive(Debug, Clone, Default)]
pub struct DeleteRequest {
    pub table: String,
    pub filter: Filter,
    pub params: Vec<Param>,
    pub additions: String,
    pub schema: Option<String>,
}

impl DeleteRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn bind<T: ToSql + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.params.push(Param::new(value));
        self
    }

    pub fn additions(mut self, additions: impl Into<String>) -> Self {
        self.additions = additions.into();
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn build(&self) -> CrudResult<Sql> {
        let table = table_name(&self.table)?;
        if self.filter.is_empty() {
            return Err(CrudError::validation(format!(
                "delete from '{table}' requires a WHERE condition"
            )));
        }

        let mut q = Sql::new("DELETE FROM ");
        q.push(table);
        self.filter.append_where(&mut q)?;
        push_additions(&mut q, &self.additions)?;

        q.bind_slots(self.params.iter().cloned());
        q.validate()?;
        Ok(q)
    }
}

impl<P: ConnectionPool> Db<P> {
    /// Run a delete and return the affected row count.
    pub async fn delete(&self, req: &DeleteRequest) -> CrudResult<u64> {
        let stmt = req.build()?;
        self.executor()
            .execute(&stmt, self.target_schema(req.schema.as_deref()))
            .await
    }
}
