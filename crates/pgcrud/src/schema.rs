//! Table creation and removal from a declarative schema description.
//!
//! The description is a JSON object of tables, each an object of columns:
//!
//! ```json
//! {
//!   "users": {
//!     "id":    { "type": "BIGINT", "isID": true },
//!     "name":  { "type": "TEXT" },
//!     "bio":   { "type": "TEXT", "allowNull": true },
//!     "role":  { "type": "TEXT", "default": "member" },
//!     "cache": { "type": "TEXT", "dbIgnore": true }
//!   }
//! }
//! ```
//!
//! Table and column order is kept as written.

use crate::crud::Db;
use crate::error::{CrudError, CrudResult};
use crate::ident::{escape_identifier, quote_literal, validate_identifier};
use crate::pool::ConnectionPool;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;

const DISABLE_STRICT_MODE: &str = "ALTER ROLE CURRENT_USER SET check_function_bodies = off; \
                                   SET SESSION check_function_bodies = off;";

/// Literal default value for a column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl DefaultValue {
    fn as_literal(&self) -> String {
        match self {
            DefaultValue::Bool(b) => quote_literal(&b.to_string()),
            DefaultValue::Int(n) => quote_literal(&n.to_string()),
            DefaultValue::Float(f) => quote_literal(&f.to_string()),
            DefaultValue::Text(s) => quote_literal(s),
        }
    }
}

/// One column of a table description.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnDef {
    /// SQL type, written into the DDL as given.
    #[serde(rename = "type")]
    pub sql_type: String,
    /// Identity primary key.
    #[serde(rename = "isID")]
    pub is_id: bool,
    /// `Some(true)` allows NULL; anything else adds `NOT NULL`.
    pub allow_null: Option<bool>,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub default: Option<DefaultValue>,
    /// Skipped when creating the table.
    pub db_ignore: bool,
}

impl ColumnDef {
    pub fn new(sql_type: impl Into<String>) -> Self {
        Self {
            sql_type: sql_type.into(),
            ..Self::default()
        }
    }

    pub fn id(mut self) -> Self {
        self.is_id = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.allow_null = Some(true);
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn ignored(mut self) -> Self {
        self.db_ignore = true;
        self
    }

    /// Render the column clause, e.g. `"name" TEXT NOT NULL DEFAULT 'x'`.
    pub fn to_sql(&self, name: &str) -> CrudResult<String> {
        let sql_type = self.sql_type.trim();
        if sql_type.is_empty() {
            return Err(CrudError::validation(format!("column '{name}' has no type")));
        }
        if sql_type.contains(';') {
            return Err(CrudError::validation(format!(
                "column '{name}' has an invalid type: {sql_type}"
            )));
        }

        let mut out = format!("{} {sql_type}", ddl_name(name)?);
        if self.is_id {
            out.push_str(" GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY NOT NULL");
            return Ok(out);
        }
        if self.auto_increment {
            out.push_str(" GENERATED BY DEFAULT AS IDENTITY");
        }
        if self.primary_key {
            out.push_str(" PRIMARY KEY");
        }
        if self.allow_null != Some(true) {
            out.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            out.push_str(" DEFAULT ");
            out.push_str(&default.as_literal());
        }
        Ok(out)
    }
}

/// One table: a name and its columns in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<(String, ColumnDef)>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, def: ColumnDef) -> Self {
        self.columns.push((name.into(), def));
        self
    }

    /// `CREATE TABLE IF NOT EXISTS "<name>" (...);`
    pub fn create_sql(&self) -> CrudResult<String> {
        let clauses = self
            .columns
            .iter()
            .filter(|(_, def)| !def.db_ignore)
            .map(|(name, def)| def.to_sql(name))
            .collect::<CrudResult<Vec<_>>>()?;
        if clauses.is_empty() {
            return Err(CrudError::validation(format!(
                "table '{}' has no columns",
                self.name
            )));
        }
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            ddl_name(&self.name)?,
            clauses.join(", ")
        ))
    }

    /// `DROP TABLE IF EXISTS "<name>";`
    pub fn drop_sql(&self) -> CrudResult<String> {
        Ok(format!(
            "DROP TABLE IF EXISTS {};",
            ddl_name(&self.name)?
        ))
    }
}

/// An ordered set of table descriptions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "OrderedMap<OrderedMap<ColumnDef>>")]
pub struct Schema {
    pub tables: Vec<TableDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: TableDef) -> Self {
        self.tables.push(table);
        self
    }

    /// Parse the JSON description.
    pub fn from_json(raw: &str) -> CrudResult<Self> {
        serde_json::from_str(raw).map_err(|e| CrudError::config(format!("invalid schema JSON: {e}")))
    }
}

impl From<OrderedMap<OrderedMap<ColumnDef>>> for Schema {
    fn from(map: OrderedMap<OrderedMap<ColumnDef>>) -> Self {
        Self {
            tables: map
                .0
                .into_iter()
                .map(|(name, columns)| TableDef {
                    name,
                    columns: columns.0,
                })
                .collect(),
        }
    }
}

/// A JSON object read as key/value pairs in document order.
struct OrderedMap<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

/// Validate a plain (unquoted) table or column name and render it quoted.
fn ddl_name(name: &str) -> CrudResult<String> {
    if name.contains('"') {
        return Err(CrudError::validation(format!(
            "Invalid identifier '{name}': quotes are not allowed in schema names"
        )));
    }
    escape_identifier(validate_identifier(name)?)
}

fn is_ignored(name: &str, ignored: &[&str]) -> bool {
    ignored.iter().any(|i| i.trim() == name)
}

/// All CREATE statements for the tables not in `ignored`, as one batch.
pub fn create_tables_sql(schema: &Schema, ignored: &[&str]) -> CrudResult<String> {
    let statements = schema
        .tables
        .iter()
        .filter(|t| !is_ignored(&t.name, ignored))
        .map(TableDef::create_sql)
        .collect::<CrudResult<Vec<_>>>()?;
    Ok(statements.join("\n"))
}

/// All DROP statements for the described tables, as one batch.
pub fn drop_tables_sql(schema: &Schema) -> CrudResult<String> {
    let statements = schema
        .tables
        .iter()
        .map(TableDef::drop_sql)
        .collect::<CrudResult<Vec<_>>>()?;
    Ok(statements.join("\n"))
}

impl<P: ConnectionPool> Db<P> {
    /// Create every described table that does not exist yet.
    ///
    /// Tables named in `ignored` are skipped. Running twice is harmless.
    pub async fn create_tables(
        &self,
        schema: &Schema,
        ignored: &[&str],
        target: Option<&str>,
    ) -> CrudResult<()> {
        let sql = create_tables_sql(schema, ignored)?;
        if sql.is_empty() {
            tracing::debug!(target: "pgcrud.sql", "no tables to create");
            return Ok(());
        }
        self.run_batch(&sql, target).await
    }

    /// Drop every described table if it exists.
    pub async fn drop_tables(&self, schema: &Schema, target: Option<&str>) -> CrudResult<()> {
        let sql = drop_tables_sql(schema)?;
        if sql.is_empty() {
            return Ok(());
        }
        self.run_batch(&sql, target).await
    }

    /// Turn off function body validation for the current role and session.
    pub async fn disable_strict_mode(&self) -> CrudResult<()> {
        self.executor().batch(DISABLE_STRICT_MODE, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::testing::MockPool;

    const USERS: &str = r#"{
        "users": {
            "id":    { "type": "BIGINT", "isID": true },
            "name":  { "type": "TEXT" },
            "bio":   { "type": "TEXT", "allowNull": true },
            "role":  { "type": "TEXT", "default": "it's" },
            "score": { "type": "INT", "default": 0, "allowNull": false },
            "cache": { "type": "TEXT", "dbIgnore": true }
        },
        "audit": {
            "seq":  { "type": "INT", "autoIncrement": true, "primaryKey": true },
            "note": { "type": "TEXT", "allowNull": true }
        }
    }"#;

    fn db(pool: &MockPool) -> Db<MockPool> {
        Db::new(pool.clone(), DbConfig::new("postgres://localhost/test"))
    }

    #[test]
    fn parses_in_document_order() {
        let schema = Schema::from_json(USERS).unwrap();
        let names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["users", "audit"]);

        let columns: Vec<&str> = schema.tables[0]
            .columns
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(columns, ["id", "name", "bio", "role", "score", "cache"]);
        assert_eq!(
            schema.tables[0].columns[4].1.default,
            Some(DefaultValue::Int(0))
        );
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Schema::from_json(r#"{"users": ["id"]}"#).unwrap_err();
        assert!(matches!(err, CrudError::Config(_)));
    }

    #[test]
    fn column_clauses() {
        assert_eq!(
            ColumnDef::new("BIGINT").id().to_sql("id").unwrap(),
            r#""id" BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY NOT NULL"#
        );
        assert_eq!(
            ColumnDef::new("TEXT").to_sql("name").unwrap(),
            r#""name" TEXT NOT NULL"#
        );
        assert_eq!(
            ColumnDef::new("TEXT").nullable().to_sql("bio").unwrap(),
            r#""bio" TEXT"#
        );
        assert_eq!(
            ColumnDef::new("INT")
                .auto_increment()
                .primary_key()
                .to_sql("seq")
                .unwrap(),
            r#""seq" INT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY NOT NULL"#
        );
        assert_eq!(
            ColumnDef::new("BOOLEAN")
                .default_value(DefaultValue::Bool(true))
                .to_sql("active")
                .unwrap(),
            r#""active" BOOLEAN NOT NULL DEFAULT 'true'"#
        );
    }

    #[test]
    fn column_type_is_checked() {
        assert!(ColumnDef::new("  ").to_sql("a").unwrap_err().is_validation());
        assert!(
            ColumnDef::new("INT; DROP TABLE users")
                .to_sql("a")
                .unwrap_err()
                .is_validation()
        );
        assert!(ColumnDef::new("INT").to_sql("a b").unwrap_err().is_validation());
        assert!(ColumnDef::new("INT").to_sql(r#""a""#).unwrap_err().is_validation());
    }

    #[test]
    fn create_sql_skips_ignored_columns_and_tables() {
        let schema = Schema::from_json(USERS).unwrap();
        let sql = create_tables_sql(&schema, &["audit"]).unwrap();
        assert_eq!(
            sql,
            concat!(
                r#"CREATE TABLE IF NOT EXISTS "users" ("#,
                r#""id" BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY NOT NULL, "#,
                r#""name" TEXT NOT NULL, "#,
                r#""bio" TEXT, "#,
                r#""role" TEXT NOT NULL DEFAULT 'it''s', "#,
                r#""score" INT NOT NULL DEFAULT '0');"#
            )
        );
    }

    #[test]
    fn drop_sql_covers_every_table() {
        let schema = Schema::from_json(USERS).unwrap();
        assert_eq!(
            drop_tables_sql(&schema).unwrap(),
            "DROP TABLE IF EXISTS \"users\";\nDROP TABLE IF EXISTS \"audit\";"
        );
    }

    #[test]
    fn table_without_columns_is_rejected() {
        let schema = Schema::new().table(TableDef::new("empty").column("x", ColumnDef::new("INT").ignored()));
        assert!(create_tables_sql(&schema, &[]).unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn create_tables_runs_one_batch() {
        let pool = MockPool::new();
        let schema = Schema::from_json(USERS).unwrap();
        db(&pool).create_tables(&schema, &[], None).await.unwrap();

        let calls = pool.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, "batch");
        assert_eq!(calls[0].sql.matches("CREATE TABLE IF NOT EXISTS").count(), 2);
        assert_eq!(pool.released(), 1);
    }

    #[tokio::test]
    async fn all_tables_ignored_never_acquires() {
        let pool = MockPool::new();
        let schema = Schema::from_json(USERS).unwrap();
        db(&pool)
            .create_tables(&schema, &["users", "audit"], None)
            .await
            .unwrap();
        db(&pool).drop_tables(&Schema::new(), None).await.unwrap();
        assert_eq!(pool.acquired(), 0);
    }

    #[tokio::test]
    async fn create_tables_in_target_schema() {
        let pool = MockPool::new();
        let schema = Schema::new().table(TableDef::new("t").column("x", ColumnDef::new("INT")));
        db(&pool).create_tables(&schema, &[], Some("tenant")).await.unwrap();

        let sql: Vec<String> = pool.calls().into_iter().map(|c| c.sql).collect();
        assert_eq!(
            sql,
            [
                "SET search_path TO \"tenant\";\nCREATE TABLE IF NOT EXISTS \"t\" (\"x\" INT NOT NULL);",
                "RESET search_path",
            ]
        );
    }

    #[tokio::test]
    async fn disable_strict_mode_sends_role_and_session_settings() {
        let pool = MockPool::new();
        db(&pool).disable_strict_mode().await.unwrap();

        let sql = &pool.calls()[0].sql;
        assert!(sql.starts_with("ALTER ROLE CURRENT_USER SET check_function_bodies = off;"));
        assert!(sql.contains("SET SESSION check_function_bodies = off;"));
    }
}
