use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{FolioError, FolioResult};

/// One table row as the hosted backend returns it.
pub type Row = Map<String, Value>;

/// Row-level access to the remote relational store.
///
/// Every call is a single independent request; nothing here spans rows
/// transactionally. Implementations return the affected rows
/// (`return=representation` semantics).
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> FolioResult<Vec<Row>>;

    async fn insert(&self, table: &str, rows: Vec<Row>) -> FolioResult<Vec<Row>>;

    async fn update(&self, table: &str, patch: Row, filter: &Filter) -> FolioResult<Vec<Row>>;

    async fn delete(&self, table: &str, filter: &Filter) -> FolioResult<Vec<Row>>;
}

/// Conjunction of column equality tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub eq: Vec<(String, Value)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(column, value)
    }

    pub fn and_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.eq.push((column.into(), value.into()));
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.eq
            .iter()
            .all(|(column, value)| row.get(column).unwrap_or(&Value::Null) == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// A `select`: filter plus ordering keys applied left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub order: Vec<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = self.filter.and_eq(column, value);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }
}

pub fn to_row<T: Serialize>(value: &T) -> FolioResult<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(FolioError::general_error(format!(
            "Expected an object row, got {other}"
        ))),
    }
}

pub fn from_row<T: DeserializeOwned>(row: Row) -> FolioResult<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

pub fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> FolioResult<Vec<T>> {
    rows.into_iter().map(from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_matches_all_conditions() {
        let row = to_row(&json!({"id": 3, "project_id": 7, "caption": null})).unwrap();

        assert!(Filter::eq("project_id", 7).matches(&row));
        assert!(Filter::eq("project_id", 7).and_eq("id", 3).matches(&row));
        assert!(!Filter::eq("project_id", 7).and_eq("id", 4).matches(&row));
        assert!(Filter::eq("caption", Value::Null).matches(&row));
        assert!(Filter::all().matches(&row));
    }

    #[test]
    fn to_row_rejects_non_objects() {
        assert!(to_row(&json!([1, 2])).is_err());
    }
}
