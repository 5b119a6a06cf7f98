// ABOUTME: Parameter sets for named queries and the bound statements they produce
// ABOUTME: Indexed parameters bind ?1..?n in order; named parameters bind :name placeholders

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::SqliteArguments;
use sqlx::Arguments;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// A single value bound to a query placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    /// Date and time without an offset, as entered by users
    LocalDateTime(NaiveDateTime),
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Int(i64::from(value))
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<Uuid> for QueryValue {
    fn from(value: Uuid) -> Self {
        QueryValue::Uuid(value)
    }
}

impl From<DateTime<Utc>> for QueryValue {
    fn from(value: DateTime<Utc>) -> Self {
        QueryValue::Timestamp(value)
    }
}

impl From<NaiveDateTime> for QueryValue {
    fn from(value: NaiveDateTime) -> Self {
        QueryValue::LocalDateTime(value)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(QueryValue::Null)
    }
}

/// Values applied to a named query before it is executed.
///
/// Both variants are opaque value objects; the only thing a caller does with
/// them is hand them to the repository, which calls [`QueryParameters::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParameters {
    /// Positional values bound to `?1`, `?2`, ... in order
    Indexed(Vec<QueryValue>),
    /// Values bound to `:name` placeholders, in insertion order
    Named(Vec<(String, QueryValue)>),
}

impl QueryParameters {
    pub fn indexed() -> IndexedQueryParametersBuilder {
        IndexedQueryParametersBuilder::default()
    }

    pub fn named() -> NamedQueryParametersBuilder {
        NamedQueryParametersBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            QueryParameters::Indexed(values) => values.is_empty(),
            QueryParameters::Named(values) => values.is_empty(),
        }
    }

    /// Apply these parameters to the given query text.
    ///
    /// Named placeholders are rewritten to numbered ones since SQLite binds
    /// arguments by position. Every supplied name must occur in the query and
    /// every placeholder in the query must have a supplied value.
    pub fn apply(&self, sql: &str) -> StorageResult<BoundQuery> {
        match self {
            QueryParameters::Indexed(values) => {
                let mut bound = BoundQuery::new(sql);
                for value in values {
                    bound.push(value)?;
                }
                Ok(bound)
            }
            QueryParameters::Named(values) => {
                let (rewritten, order) = rewrite_named_placeholders(sql)?;

                for (name, _) in values {
                    if !order.iter().any(|used| used == name) {
                        return Err(StorageError::InvalidQuery(format!(
                            "parameter :{} does not occur in query",
                            name
                        )));
                    }
                }

                let mut bound = BoundQuery::new(rewritten);
                for name in &order {
                    let value = values
                        .iter()
                        .find(|(candidate, _)| candidate == name)
                        .map(|(_, value)| value)
                        .ok_or_else(|| {
                            StorageError::InvalidQuery(format!(
                                "missing value for named parameter :{}",
                                name
                            ))
                        })?;
                    bound.push(value)?;
                }
                Ok(bound)
            }
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct IndexedQueryParametersBuilder {
    values: Vec<QueryValue>,
}

impl IndexedQueryParametersBuilder {
    pub fn with_parameter(mut self, value: impl Into<QueryValue>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn build(self) -> QueryParameters {
        QueryParameters::Indexed(self.values)
    }
}

#[derive(Debug, Default, Clone)]
pub struct NamedQueryParametersBuilder {
    values: Vec<(String, QueryValue)>,
}

impl NamedQueryParametersBuilder {
    /// Add a named value; a repeated name replaces the earlier value in place
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.values.push((name, value)),
        }
        self
    }

    pub fn build(self) -> QueryParameters {
        QueryParameters::Named(self.values)
    }
}

/// Query text together with its positional arguments, ready to execute.
pub struct BoundQuery {
    sql: String,
    arguments: SqliteArguments<'static>,
    len: usize,
}

impl BoundQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            arguments: SqliteArguments::default(),
            len: 0,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of bound arguments
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bind the next positional argument
    pub fn push(&mut self, value: &QueryValue) -> StorageResult<()> {
        let result = match value {
            QueryValue::Null => self.arguments.add(Option::<String>::None),
            QueryValue::Bool(v) => self.arguments.add(*v),
            QueryValue::Int(v) => self.arguments.add(*v),
            QueryValue::Float(v) => self.arguments.add(*v),
            QueryValue::Text(v) => self.arguments.add(v.clone()),
            QueryValue::Uuid(v) => self.arguments.add(*v),
            QueryValue::Timestamp(v) => self.arguments.add(*v),
            QueryValue::LocalDateTime(v) => self.arguments.add(*v),
        };
        result.map_err(|e| {
            StorageError::InvalidQuery(format!(
                "failed to bind parameter {}: {}",
                self.len + 1,
                e
            ))
        })?;
        self.len += 1;
        Ok(())
    }

    /// Restrict the result to `[offset, offset + limit)`.
    ///
    /// The window is appended after the already bound parameters, so the
    /// query text must not carry a LIMIT clause of its own.
    pub fn with_window(mut self, offset: i64, limit: i64) -> StorageResult<Self> {
        let limit_index = self.len + 1;
        let offset_index = self.len + 2;
        self.sql = format!(
            "{} LIMIT ?{} OFFSET ?{}",
            self.sql.trim_end().trim_end_matches(';'),
            limit_index,
            offset_index
        );
        self.push(&QueryValue::Int(limit))?;
        self.push(&QueryValue::Int(offset))?;
        Ok(self)
    }

    pub fn into_parts(self) -> (String, SqliteArguments<'static>) {
        (self.sql, self.arguments)
    }
}

impl fmt::Debug for BoundQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundQuery")
            .field("sql", &self.sql)
            .field("arguments", &self.len)
            .finish()
    }
}

/// Replace `:name` placeholders with `?N`, numbering names by first occurrence.
///
/// Text inside single or double quotes and `::` sequences are copied as is.
fn rewrite_named_placeholders(sql: &str) -> StorageResult<(String, Vec<String>)> {
    let mut output = String::with_capacity(sql.len());
    let mut order: Vec<String> = Vec::new();
    let mut chars = sql.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(open) = quote {
            output.push(c);
            if c == open {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                output.push(c);
            }
            ':' => match chars.peek() {
                Some(':') => {
                    output.push_str("::");
                    chars.next();
                }
                Some(next) if next.is_ascii_alphabetic() || *next == '_' => {
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        if next.is_ascii_alphanumeric() || next == '_' {
                            name.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let index = match order.iter().position(|existing| *existing == name) {
                        Some(pos) => pos + 1,
                        None => {
                            order.push(name);
                            order.len()
                        }
                    };
                    output.push_str(&format!("?{}", index));
                }
                _ => output.push(c),
            },
            _ => output.push(c),
        }
    }

    if quote.is_some() {
        return Err(StorageError::InvalidQuery(
            "unterminated quoted literal".to_string(),
        ));
    }

    Ok((output, order))
}
