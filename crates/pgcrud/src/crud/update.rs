use super::{Db, Fields, push_additions, table_name};
use crate::error::{CrudError, CrudResult};
use crate::filter::Filter;
use crate::ident::validate_identifier;
use crate::param::Param;
use crate::pool::ConnectionPool;
use crate::sql::Sql;
use tokio_postgres::types::ToSql;

/// `UPDATE <table> SET c1=$1,c2=$2,... [WHERE ...] [additions]`
///
/// An empty raw filter updates every row; the SET values are bound either way.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub table: String,
    pub fields: Fields,
    pub filter: Filter,
    /// Values for `?` placeholders in a raw filter and in `additions`.
    pub params: Vec<Param>,
    pub additions: String,
    pub schema: Option<String>,
}

impl UpdateRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Add `column = value` to the SET clause.
    pub fn set<T: ToSql + Send + Sync + 'static>(mut self, column: impl Into<String>, value: T) -> Self {
        self.fields = self.fields.set(column, value);
        self
    }

    pub fn fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
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
        if self.fields.is_empty() {
            return Err(CrudError::validation(format!(
                "update of '{table}' requires at least one field"
            )));
        }

        let mut q = Sql::new("UPDATE ");
        q.push(table).push(" SET ");
        for (i, (column, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                q.push(",");
            }
            q.push(validate_identifier(column)?)
                .push("=")
                .push_param(value.clone());
        }

        self.filter.append_where(&mut q)?;
        push_additions(&mut q, &self.additions)?;

        q.bind_slots(self.params.iter().cloned());
        q.validate()?;
        Ok(q)
    }
}

impl<P: ConnectionPool> Db<P> {
    /// Run an update and return the affected row count.
    pub async fn update(&self, req: &UpdateRequest) -> CrudResult<u64> {
        let stmt = req.build()?;
        self.executor()
            .execute(&stmt, self.target_schema(req.schema.as_deref()))
            .await
    }
}
