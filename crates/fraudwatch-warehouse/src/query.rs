//! Parameterized queries and their cache keys.
//!
//! Filter values never become part of the SQL text. They travel as
//! [`SqlParam`] values and are bound by the executor, so the text stays
//! fixed per report and the cache key is derived from text plus values.

use std::fmt::{self, Display, Formatter};

use time::Date;

use crate::error::WarehouseError;

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
    /// Bound as `YYYY-MM-DD` text; the SQL is expected to cast it.
    Date(Date),
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for SqlParam {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Date> for SqlParam {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

/// Cache key of a query: the literal SQL text followed by its bound values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// SQL text plus the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    sql: String,
    params: Vec<SqlParam>,
}

impl Query {
    /// A query without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into().trim().to_string(),
            params: Vec::new(),
        }
    }

    /// Append a bound value for the next `?` placeholder.
    #[must_use]
    pub fn bind(mut self, param: impl Into<SqlParam>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn sql(&self) -> &str {
        self.sql.as_str()
    }

    pub fn params(&self) -> &[SqlParam] {
        self.params.as_slice()
    }

    /// Key under which results of this query are cached.
    ///
    /// `Debug` output escapes quotes inside text values, so distinct
    /// parameter lists always render differently.
    pub fn cache_key(&self) -> QueryKey {
        if self.params.is_empty() {
            QueryKey(self.sql.clone())
        } else {
            QueryKey(format!("{}\u{0}{:?}", self.sql, self.params))
        }
    }

    /// Validate that the statement only reads data.
    ///
    /// Returns the SQL with a trailing semicolon removed.
    pub fn read_only_sql(&self) -> Result<&str, WarehouseError> {
        let sql = normalize_sql(self.sql.as_str())?;
        enforce_read_only_query(sql)?;
        let placeholders = count_placeholders(sql);
        if placeholders != self.params.len() {
            return Err(WarehouseError::QueryRejected(format!(
                "query has {placeholders} placeholders but {} bound values",
                self.params.len()
            )));
        }
        Ok(sql)
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql.as_str())?;
        if !self.params.is_empty() {
            write!(f, "\n-- params: {:?}", self.params)?;
        }
        Ok(())
    }
}

/// Normalize a SQL query string.
fn normalize_sql(sql: &str) -> Result<&str, WarehouseError> {
    let normalized = sql.trim();
    if normalized.is_empty() {
        return Err(WarehouseError::QueryRejected(String::from(
            "query must not be empty",
        )));
    }
    Ok(normalized.trim_end_matches(';').trim())
}

/// Enforce that a query is read-only (SELECT/CTE only).
fn enforce_read_only_query(sql: &str) -> Result<(), WarehouseError> {
    if !is_select_like(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "only SELECT/CTE queries are allowed against the warehouse",
        )));
    }
    if has_multiple_statements(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "multiple SQL statements are not allowed",
        )));
    }
    Ok(())
}

/// Check if a SQL query starts with a SELECT-like keyword.
fn is_select_like(sql: &str) -> bool {
    let first_keyword = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(
        first_keyword.as_str(),
        "SELECT" | "WITH" | "EXPLAIN" | "SHOW" | "DESCRIBE"
    )
}

/// Check if a SQL string contains multiple statements.
///
/// Expects the trailing semicolon to be stripped already.
fn has_multiple_statements(sql: &str) -> bool {
    unquoted(sql).any(|ch| ch == ';')
}

/// Count `?` placeholders outside of single-quoted literals.
fn count_placeholders(sql: &str) -> usize {
    unquoted(sql).filter(|ch| *ch == '?').count()
}

/// Characters of `sql` outside single-quoted literals.
///
/// A doubled quote (`''`) closes and reopens the literal, so escaped quotes
/// keep the scan inside it.
fn unquoted(sql: &str) -> impl Iterator<Item = char> + '_ {
    let mut in_literal = false;
    sql.chars().filter(move |ch| {
        if *ch == '\'' {
            in_literal = !in_literal;
            return false;
        }
        !in_literal
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn same_sql_and_params_share_a_key() {
        let first = Query::new("SELECT * FROM t WHERE a >= ?").bind(5000_i64);
        let second = Query::new("SELECT * FROM t WHERE a >= ?").bind(5000_i64);
        assert_eq!(first.cache_key(), second.cache_key());
    }

    #[test]
    fn different_params_never_collide() {
        let base = "SELECT * FROM t WHERE a IN (?, ?)";
        let first = Query::new(base).bind("x', 'y").bind("z");
        let second = Query::new(base).bind("x").bind("y', 'z");
        assert_ne!(first.cache_key(), second.cache_key());

        let typed_text = Query::new("SELECT ?").bind("1");
        let typed_int = Query::new("SELECT ?").bind(1_i64);
        assert_ne!(typed_text.cache_key(), typed_int.cache_key());
    }

    #[test]
    fn parameterless_key_is_the_sql_text() {
        let query = Query::new("  SELECT * FROM GOLD.VW_TABLEAU_FRAUD_SUMMARY  ");
        assert_eq!(
            query.cache_key().as_str(),
            "SELECT * FROM GOLD.VW_TABLEAU_FRAUD_SUMMARY"
        );
    }

    #[test]
    fn rejects_write_and_multi_statement_sql() {
        let write = Query::new("DELETE FROM t");
        assert!(matches!(
            write.read_only_sql(),
            Err(WarehouseError::QueryRejected(_))
        ));

        let stacked = Query::new("SELECT 1; DROP TABLE t");
        assert!(matches!(
            stacked.read_only_sql(),
            Err(WarehouseError::QueryRejected(_))
        ));

        let empty = Query::new("   ");
        assert!(empty.read_only_sql().is_err());
    }

    #[test]
    fn semicolons_inside_literals_are_not_statement_breaks() {
        let query = Query::new("SELECT * FROM t WHERE note = 'a;b'");
        assert_eq!(
            query.read_only_sql().expect("single statement"),
            "SELECT * FROM t WHERE note = 'a;b'"
        );

        let escaped = Query::new("SELECT 'it''s; fine' AS note;");
        assert!(escaped.read_only_sql().is_ok());

        let stacked = Query::new("SELECT 'a;b'; DROP TABLE t");
        assert!(matches!(
            stacked.read_only_sql(),
            Err(WarehouseError::QueryRejected(_))
        ));
    }

    #[test]
    fn trailing_semicolon_is_stripped() {
        let query = Query::new("SELECT 1;");
        assert_eq!(query.read_only_sql().expect("read only"), "SELECT 1");
    }

    #[test]
    fn placeholder_count_must_match_bound_values() {
        let missing = Query::new("SELECT * FROM t WHERE a = ? AND b = ?").bind(1_i64);
        assert!(missing.read_only_sql().is_err());

        let literal = Query::new("SELECT '?' AS q, ? AS d").bind(date!(2026 - 01 - 31));
        assert!(literal.read_only_sql().is_ok());
    }
}
