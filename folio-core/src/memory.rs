//! In-process Data Store for development runs and tests.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::{FolioError, FolioResult};
use crate::store::{DataStore, Filter, OrderBy, Query, Row};

#[derive(Default, Clone)]
struct Table {
    next_id: i64,
    rows: Vec<Row>,
}

/// Tables kept in memory with store-assigned integer ids.
///
/// Tables registered with [`with_timestamps`](Self::with_timestamps) get
/// `created_at` / `updated_at` stamped on write, and
/// [`with_unique`](Self::with_unique) columns reject duplicates with a
/// `Conflict` error.
#[derive(Default)]
pub struct MemoryDataStore {
    tables: RwLock<HashMap<String, Table>>,
    timestamped: HashSet<String>,
    unique: Vec<(String, String)>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store laid out like the hosted `projects` / `project_images` schema.
    pub fn portfolio() -> Self {
        Self::new()
            .with_timestamps(crate::model::PROJECTS)
            .with_unique(crate::model::PROJECTS, "slug")
    }

    pub fn with_timestamps(mut self, table: impl Into<String>) -> Self {
        self.timestamped.insert(table.into());
        self
    }

    pub fn with_unique(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.unique.push((table.into(), column.into()));
        self
    }

    fn now() -> Value {
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    fn check_unique(&self, table_name: &str, table: &Table, candidate: &Row) -> FolioResult<()> {
        let id = candidate.get("id");
        for (t, column) in &self.unique {
            if t != table_name {
                continue;
            }
            let Some(value) = candidate.get(column).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = table
                .rows
                .iter()
                .any(|row| row.get("id") != id && row.get(column) == Some(value));
            if taken {
                return Err(FolioError::conflict(format!(
                    "Duplicate value for {table_name}.{column}: {value}"
                )));
            }
        }
        Ok(())
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .unwrap_or_default()
                .partial_cmp(&y.as_f64().unwrap_or_default())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn compare_rows(a: &Row, b: &Row, order: &[OrderBy]) -> Ordering {
    for key in order {
        let left = a.get(&key.column).unwrap_or(&Value::Null);
        let right = b.get(&key.column).unwrap_or(&Value::Null);
        let ord = compare_values(left, right);
        let ord = if key.ascending { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn select(&self, table: &str, query: &Query) -> FolioResult<Vec<Row>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Row> = tables
            .get(table)
            .map(|t| t.rows.iter().filter(|r| query.filter.matches(r)).cloned().collect())
            .unwrap_or_default();

        // stable: equal keys keep insertion order
        rows.sort_by(|a, b| compare_rows(a, b, &query.order));
        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> FolioResult<Vec<Row>> {
        let mut tables = self.tables.write().await;
        let state = tables.entry(table.to_string()).or_default();
        let stamped = self.timestamped.contains(table);

        // all rows land or none do
        let mut staged = state.clone();

        let mut inserted = Vec::with_capacity(rows.len());
        for mut row in rows {
            let id = match row.get("id").and_then(Value::as_i64) {
                Some(id) => id,
                None => staged.next_id + 1,
            };
            if staged.rows.iter().any(|r| r.get("id").and_then(Value::as_i64) == Some(id)) {
                return Err(FolioError::conflict(format!("Duplicate id for {table}: {id}")));
            }
            staged.next_id = staged.next_id.max(id);
            row.insert("id".to_string(), Value::from(id));

            if stamped {
                let now = Self::now();
                row.entry("created_at").or_insert_with(|| now.clone());
                row.insert("updated_at".to_string(), now);
            }

            self.check_unique(table, &staged, &row)?;
            staged.rows.push(row.clone());
            inserted.push(row);
        }

        *state = staged;
        Ok(inserted)
    }

    async fn update(&self, table: &str, patch: Row, filter: &Filter) -> FolioResult<Vec<Row>> {
        let mut tables = self.tables.write().await;
        let Some(state) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };
        let stamped = self.timestamped.contains(table);

        let mut candidates = Vec::new();
        for (idx, row) in state.rows.iter().enumerate() {
            if !filter.matches(row) {
                continue;
            }
            let mut next = row.clone();
            for (k, v) in &patch {
                if k == "id" {
                    continue;
                }
                next.insert(k.clone(), v.clone());
            }
            if stamped {
                next.insert("updated_at".to_string(), Self::now());
            }
            self.check_unique(table, state, &next)?;
            candidates.push((idx, next));
        }

        let mut updated = Vec::with_capacity(candidates.len());
        for (idx, next) in candidates {
            state.rows[idx] = next.clone();
            updated.push(next);
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> FolioResult<Vec<Row>> {
        let mut tables = self.tables.write().await;
        let Some(state) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let (removed, kept): (Vec<Row>, Vec<Row>) =
            state.rows.drain(..).partition(|r| filter.matches(r));
        state.rows = kept;
        Ok(removed)
    }
}
