//! Parameter-safe statement builder.
//!
//! `Sql` stores SQL pieces and parameters separately and renders `$1, $2, ...`
//! placeholders in order of appearance. Values enter a statement in two ways:
//!
//! - [`Sql::push_bind`] binds a value at the current position.
//! - [`Sql::push_fragment`] appends caller-written SQL in which each `?` opens a
//!   slot. Slots are filled, left to right, by [`Sql::bind_slots`].
//!
//! The rendered parameter list always follows placeholder order, whichever way
//! each value arrived.
//!
//! # Example
//!
//! ```ignore
//! use pgcrud::Sql;
//!
//! let mut q = Sql::new("SELECT id FROM users WHERE status = ");
//! q.push_bind("active");
//! q.push_fragment(" AND created_at > ?")?;
//! q.bind_slots([Param::new(cutoff)]);
//!
//! assert_eq!(q.to_sql(), "SELECT id FROM users WHERE status = $1 AND created_at > $2");
//! ```

use crate::error::{CrudError, CrudResult};
use crate::param::Param;
use std::fmt::Write;
use tokio_postgres::types::ToSql;

#[derive(Debug)]
enum SqlPart {
    Raw(String),
    Bound(Param),
    Slot,
}

/// A SQL statement under construction.
#[derive(Debug, Default)]
pub struct Sql {
    parts: Vec<SqlPart>,
    slot_values: Vec<Param>,
}

impl Sql {
    /// Create a new builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            parts: vec![SqlPart::Raw(initial_sql.into())],
            slot_values: Vec::new(),
        }
    }

    /// Create an empty builder.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append raw SQL. `?` has no special meaning here.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }
        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a placeholder and bind its value.
    pub fn push_bind<T>(&mut self, value: T) -> &mut Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.push_param(Param::new(value))
    }

    /// Append a placeholder for an already wrapped value.
    pub fn push_param(&mut self, param: Param) -> &mut Self {
        self.parts.push(SqlPart::Bound(param));
        self
    }

    /// Append a comma-separated placeholder list.
    ///
    /// An empty list renders `NULL`, so `IN (NULL)` stays valid SQL.
    pub fn push_param_list(&mut self, params: &[Param]) -> &mut Self {
        if params.is_empty() {
            return self.push("NULL");
        }
        for (i, p) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_param(p.clone());
        }
        self
    }

    /// Append caller-written SQL, turning every `?` into a slot.
    ///
    /// `??` yields a literal `?` (e.g. jsonb's `?` operator). Question marks inside
    /// `'...'` literals and `"..."` identifiers are copied verbatim.
    pub fn push_fragment(&mut self, fragment: &str) -> CrudResult<&mut Self> {
        let mut raw = String::new();
        let mut quote: Option<char> = None;
        let mut chars = fragment.chars().peekable();

        while let Some(c) = chars.next() {
            match quote {
                Some(q) => {
                    raw.push(c);
                    if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    '\'' | '"' => {
                        raw.push(c);
                        quote = Some(c);
                    }
                    '?' if chars.peek() == Some(&'?') => {
                        chars.next();
                        raw.push('?');
                    }
                    '?' => {
                        self.push(&raw);
                        raw.clear();
                        self.parts.push(SqlPart::Slot);
                    }
                    _ => raw.push(c),
                },
            }
        }

        if let Some(q) = quote {
            return Err(CrudError::validation(format!(
                "Unterminated {q} quote in SQL fragment: {fragment}"
            )));
        }
        self.push(&raw);
        Ok(self)
    }

    /// Supply values for the `?` slots, in order.
    pub fn bind_slots(&mut self, values: impl IntoIterator<Item = Param>) -> &mut Self {
        self.slot_values.extend(values);
        self
    }

    /// Append another statement piece, consuming it.
    pub fn push_sql(&mut self, mut other: Sql) -> &mut Self {
        self.parts.append(&mut other.parts);
        self.slot_values.append(&mut other.slot_values);
        self
    }

    /// Number of placeholders in the statement.
    pub fn placeholder_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| !matches!(p, SqlPart::Raw(_)))
            .count()
    }

    fn slot_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, SqlPart::Slot))
            .count()
    }

    /// Check that every slot has exactly one value.
    pub fn validate(&self) -> CrudResult<()> {
        let slots = self.slot_count();
        if slots != self.slot_values.len() {
            return Err(CrudError::validation(format!(
                "statement has {} `?` placeholder(s) but {} param(s) were supplied",
                slots,
                self.slot_values.len()
            )));
        }
        Ok(())
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let mut idx = 0usize;
        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Bound(_) | SqlPart::Slot => {
                    idx += 1;
                    let _ = write!(&mut out, "${idx}");
                }
            }
        }
        out
    }

    /// Parameters in placeholder order.
    ///
    /// Missing slot values are skipped; call [`Sql::validate`] first.
    pub fn params(&self) -> Vec<Param> {
        let mut slots = self.slot_values.iter();
        self.parts
            .iter()
            .filter_map(|part| match part {
                SqlPart::Raw(_) => None,
                SqlPart::Bound(p) => Some(p.clone()),
                SqlPart::Slot => slots.next().cloned(),
            })
            .collect()
    }
}
