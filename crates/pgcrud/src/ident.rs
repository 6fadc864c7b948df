//! SQL identifier validation and escaping.
//!
//! Identifiers cannot be bound as parameters, so every table or column name that
//! reaches SQL text goes through one of two gates:
//!
//! - [`validate_identifier`] accepts a name as-is when each `.`-separated part is
//!   either unquoted (`[A-Za-z_][A-Za-z0-9_$]*`) or a well-formed `"quoted"` part.
//!   Unquoted names keep Postgres' case folding.
//! - [`escape_identifier`] always quotes, doubling embedded `"`. Quoted names are
//!   case-sensitive in Postgres.
//!
//! # Example
//! ```ignore
//! use pgcrud::ident::{escape_identifier, validate_identifier};
//!
//! assert_eq!(validate_identifier("public.users")?, "public.users");
//! assert_eq!(escape_identifier("created_at")?, r#""created_at""#);
//! # Ok::<(), pgcrud::CrudError>(())
//! ```

use crate::error::{CrudError, CrudResult};

/// Check that `name` is a safe identifier and return it unchanged.
pub fn validate_identifier(name: &str) -> CrudResult<&str> {
    if name.is_empty() {
        return Err(CrudError::validation("Identifier cannot be empty"));
    }
    if name.contains('\0') {
        return Err(CrudError::validation(
            "Identifier cannot contain NUL character",
        ));
    }

    let mut chars = name.chars().peekable();

    loop {
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut len = 0usize;
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        len += 1;
                    }
                    Some('"') => break,
                    Some(_) => len += 1,
                    None => {
                        return Err(CrudError::validation(format!(
                            "Unclosed quoted identifier: {name}"
                        )));
                    }
                }
            }
            if len == 0 {
                return Err(CrudError::validation(format!(
                    "Empty quoted identifier: {name}"
                )));
            }
        } else {
            let mut len = 0usize;
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let ok = if len == 0 {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !ok {
                    return Err(CrudError::validation(format!(
                        "Invalid identifier '{name}': unexpected character '{c}'"
                    )));
                }
                len += 1;
                chars.next();
            }
            if len == 0 {
                return Err(CrudError::validation(format!(
                    "Invalid identifier '{name}': empty segment"
                )));
            }
        }

        match chars.next() {
            None => break,
            Some('.') if chars.peek().is_some() => continue,
            Some('.') => {
                return Err(CrudError::validation(format!(
                    "Invalid identifier '{name}': trailing '.'"
                )));
            }
            Some(c) => {
                return Err(CrudError::validation(format!(
                    "Invalid identifier '{name}': expected '.' after quoted part, got '{c}'"
                )));
            }
        }
    }

    Ok(name)
}

/// Quote a single identifier part: `a"b` becomes `"a""b"`.
pub fn quote_ident(part: &str) -> CrudResult<String> {
    if part.is_empty() {
        return Err(CrudError::validation("Empty quoted identifier"));
    }
    if part.contains('\0') {
        return Err(CrudError::validation(
            "Identifier cannot contain NUL character",
        ));
    }
    let mut out = String::with_capacity(part.len() + 2);
    out.push('"');
    for ch in part.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    Ok(out)
}

/// Escape a possibly dotted identifier by quoting every part.
///
/// `users.name` becomes `"users"."name"`.
pub fn escape_identifier(name: &str) -> CrudResult<String> {
    let mut out = String::with_capacity(name.len() + 2);
    for (i, part) in name.split('.').enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&quote_ident(part)?);
    }
    Ok(out)
}

/// Render a string as a single-quoted SQL literal (`'` doubled).
///
/// Only used for DDL defaults, where bind parameters are not allowed.
pub(crate) fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_simple_and_dotted() {
        assert_eq!(validate_identifier("users").unwrap(), "users");
        assert_eq!(validate_identifier("public.users").unwrap(), "public.users");
        assert_eq!(validate_identifier("my_var$1").unwrap(), "my_var$1");
    }

    #[test]
    fn validate_quoted_parts() {
        assert!(validate_identifier(r#""CamelCase""#).is_ok());
        assert!(validate_identifier(r#"public."User Table".id"#).is_ok());
        assert!(validate_identifier(r#""has""quote""#).is_ok());
    }

    #[test]
    fn validate_rejects_unsafe() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1table").is_err());
        assert!(validate_identifier("my table").is_err());
        assert!(validate_identifier("users; DROP TABLE users; --").is_err());
        assert!(validate_identifier("schema..table").is_err());
        assert!(validate_identifier("schema.").is_err());
        assert!(validate_identifier(r#""unclosed"#).is_err());
        assert!(validate_identifier(r#""""#).is_err());
        assert!(validate_identifier(r#""a"b"#).is_err());
    }

    #[test]
    fn escape_quotes_every_part() {
        assert_eq!(escape_identifier("name").unwrap(), r#""name""#);
        assert_eq!(escape_identifier("users.name").unwrap(), r#""users"."name""#);
        assert_eq!(
            escape_identifier(r#"na"me"#).unwrap(),
            r#""na""me""#
        );
    }

    #[test]
    fn escape_neutralizes_injection() {
        let escaped = escape_identifier(r#"name" DESC; DROP TABLE users; --"#).unwrap();
        assert_eq!(escaped, r#""name"" DESC; DROP TABLE users; --""#);
    }

    #[test]
    fn escape_rejects_empty_parts() {
        assert!(escape_identifier("").is_err());
        assert!(escape_identifier("a..b").is_err());
    }

    #[test]
    fn literal_doubles_single_quotes() {
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal("5"), "'5'");
    }
}
