//! In-memory record batches

use crate::value::Row;
use serde::{Deserialize, Serialize};

/// Column layout of a keyed table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub key_columns: Vec<String>,
    pub value_columns: Vec<String>,
}

impl Schema {
    pub fn new(key_columns: Vec<String>, value_columns: Vec<String>) -> Self {
        Self {
            key_columns,
            value_columns,
        }
    }

    /// Name of the value column at `index`, falling back to the index itself
    pub fn column_name(&self, index: usize) -> String {
        self.value_columns
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("#{index}"))
    }
}

/// A batch of rows that fits in memory and can be sorted by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stable sort by key: rows sharing a key keep their encounter order.
    pub fn sort_by_key(&mut self) {
        self.rows.sort_by(|a, b| a.key.cmp(&b.key));
    }

    pub fn sorted(mut self) -> Self {
        self.sort_by_key();
        self
    }
}

impl From<Vec<Row>> for Table {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

impl FromIterator<Row> for Table {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
