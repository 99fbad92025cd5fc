//! Query results: the rows themselves and the address they were read from.

use crate::notify::{ChangeEvent, ChangeWatch};
use crate::record::AppRecord;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

/// Rows in column order. Column names are known even when there are no rows.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        RowSet {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn to_objects(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect::<Map<String, Value>>()
            })
            .collect()
    }
}

/// A row set plus a watch on the address it was queried through.
pub struct Cursor {
    rows: RowSet,
    watch: ChangeWatch,
}

impl Cursor {
    pub fn new(rows: RowSet, watch: ChangeWatch) -> Self {
        Cursor { rows, watch }
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.columns().len()
    }

    pub fn column_names(&self) -> &[String] {
        self.rows.columns()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.rows.column_index(name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row, column)
    }

    pub fn get_str(&self, row: usize, column: &str) -> Option<&str> {
        self.get(row, column).and_then(Value::as_str)
    }

    pub fn get_i64(&self, row: usize, column: &str) -> Option<i64> {
        self.get(row, column).and_then(Value::as_i64)
    }

    pub fn rows(&self) -> &RowSet {
        &self.rows
    }

    /// Decodes every row; fails unless the projection covered every column.
    pub fn records(&self) -> Result<Vec<AppRecord>, serde_json::Error> {
        self.rows
            .to_objects()
            .into_iter()
            .map(|obj| serde_json::from_value(Value::Object(obj)))
            .collect()
    }

    pub fn notification_address(&self) -> &str {
        self.watch.address()
    }

    pub async fn changed(&mut self) -> Result<ChangeEvent, broadcast::error::RecvError> {
        self.watch.changed().await
    }

    pub fn is_stale(&mut self) -> bool {
        self.watch.is_stale()
    }
}
