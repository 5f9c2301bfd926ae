//! CSV input for comparisons
//!
//! Loads a headered CSV file as a keyed table, either whole or as a sequence
//! of fixed-size batches for the external sort.

use crate::compare::Source;
use crate::error::{DiffError, Result};
use crate::table::{Schema, Table};
use crate::value::{Key, Row, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Infer a typed value from a CSV field
pub fn parse_field(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = field.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(x) = field.parse::<f64>() {
        // Keep words like "inf" or "nan" as text
        if field.chars().any(|c| c.is_ascii_digit()) {
            return Value::Float(x);
        }
    }
    match field {
        "true" | "TRUE" | "True" => Value::Bool(true),
        "false" | "FALSE" | "False" => Value::Bool(false),
        _ => Value::Text(field.to_string()),
    }
}

/// A CSV file opened for keyed reading
pub struct CsvSource {
    path: PathBuf,
    reader: csv::Reader<BufReader<File>>,
    schema: Schema,
    key_indices: Vec<usize>,
    value_indices: Vec<usize>,
}

impl CsvSource {
    /// Open `path` and resolve `key_columns` against its header
    pub fn open(path: &Path, key_columns: &[String]) -> Result<Self> {
        Self::open_with_delimiter(path, key_columns, b',')
    }

    pub fn open_with_delimiter(path: &Path, key_columns: &[String], delimiter: u8) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .from_reader(BufReader::new(file));

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if key_columns.is_empty() {
            return Err(DiffError::Config("at least one key column is required".to_string()));
        }

        let key_indices = key_columns
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| DiffError::MissingKeyColumn(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        let value_indices: Vec<usize> = (0..headers.len())
            .filter(|i| !key_indices.contains(i))
            .collect();

        let schema = Schema::new(
            key_indices.iter().map(|&i| headers[i].clone()).collect(),
            value_indices.iter().map(|&i| headers[i].clone()).collect(),
        );
        log::debug!(
            "Opened {} with key {:?} and {} value columns",
            path.display(),
            schema.key_columns,
            schema.value_columns.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            schema,
            key_indices,
            value_indices,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_row(&mut self, record: &mut csv::StringRecord) -> Result<Option<Row>> {
        if !self.reader.read_record(record)? {
            return Ok(None);
        }
        let field = |i: usize| parse_field(record.get(i).unwrap_or_default());
        let key = Key::composite(self.key_indices.iter().map(|&i| field(i)).collect());
        let columns = self.value_indices.iter().map(|&i| field(i)).collect();
        Ok(Some(Row::new(key, columns)))
    }

    /// Read the whole file into one table
    pub fn read_table(mut self) -> Result<Table> {
        let mut record = csv::StringRecord::new();
        let mut table = Table::default();
        while let Some(row) = self.read_row(&mut record)? {
            table.push(row);
        }
        log::debug!("Loaded {} rows from {}", table.len(), self.path.display());
        Ok(table)
    }

    /// Split the file into batches of at most `batch_size` rows
    pub fn into_batches(self, batch_size: usize) -> CsvBatches {
        CsvBatches {
            source: self,
            batch_size: batch_size.max(1),
            record: csv::StringRecord::new(),
            done: false,
        }
    }

    /// Comparison input: one table, or batches when `batch_size` is set
    pub fn into_source(self, batch_size: Option<usize>) -> Result<Source> {
        match batch_size {
            Some(size) => Ok(Source::fallible_batches(self.into_batches(size))),
            None => Ok(Source::Table(self.read_table()?)),
        }
    }
}

/// Batches read lazily from a [`CsvSource`]
pub struct CsvBatches {
    source: CsvSource,
    batch_size: usize,
    record: csv::StringRecord,
    done: bool,
}

impl Iterator for CsvBatches {
    type Item = Result<Table>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut batch = Table::default();
        while batch.len() < self.batch_size {
            match self.source.read_row(&mut self.record) {
                Ok(Some(row)) => batch.push(row),
                Ok(None) => {
                    self.done = true;
                    break;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}
