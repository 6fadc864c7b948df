//! SQL debug logging.
//!
//! When [`DebugOptions::enabled`] and [`DebugOptions::show_sql`] are both set, the
//! executor emits every statement it runs as a `tracing` event on the
//! `pgcrud.sql` target, whether or not the statement succeeds.

use serde::Deserialize;
use tracing::Level;

/// Tracing level for SQL debug events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlLogLevel {
    Error,
    Warn,
    Info,
    #[default]
    Debug,
    Trace,
}

impl From<SqlLogLevel> for Level {
    fn from(level: SqlLogLevel) -> Self {
        match level {
            SqlLogLevel::Error => Level::ERROR,
            SqlLogLevel::Warn => Level::WARN,
            SqlLogLevel::Info => Level::INFO,
            SqlLogLevel::Debug => Level::DEBUG,
            SqlLogLevel::Trace => Level::TRACE,
        }
    }
}

/// Debug switches, read once from configuration and never mutated afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DebugOptions {
    /// Master switch.
    pub enabled: bool,
    /// Log generated SQL (only when `enabled`).
    pub show_sql: bool,
    /// Event level.
    pub level: SqlLogLevel,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for DebugOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            show_sql: true,
            level: SqlLogLevel::Debug,
            max_sql_length: Some(200),
        }
    }
}

impl DebugOptions {
    /// Defaults (disabled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enabled, showing SQL.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Override the event level.
    pub fn level(mut self, level: SqlLogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn logs_sql(&self) -> bool {
        self.enabled && self.show_sql
    }

    pub(crate) fn display_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    /// Emit `sql` if SQL logging is on.
    pub(crate) fn log_sql(&self, sql: &str, param_count: usize) {
        if !self.logs_sql() {
            return;
        }

        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    SqlLogLevel::Error => tracing::error!($($field)*),
                    SqlLogLevel::Warn  => tracing::warn!($($field)*),
                    SqlLogLevel::Info  => tracing::info!($($field)*),
                    SqlLogLevel::Debug => tracing::debug!($($field)*),
                    SqlLogLevel::Trace => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.display_sql(sql);
        emit_at_level!(
            self.level,
            target: "pgcrud.sql",
            param_count,
            sql = %sql,
        );
    }
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
