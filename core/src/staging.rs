//! On-disk staging chunks for the external merge sort
//!
//! Each chunk is a headerless CSV file holding one sorted batch. A record is
//! laid out as `key_arity, key fields..., column fields...` and every field is
//! a type-tagged encoding of a [`Value`]:
//!
//! | value        | field                          |
//! |--------------|--------------------------------|
//! | `Null`       | `n`                            |
//! | `Bool(b)`    | `b:true` / `b:false`           |
//! | `Int(i)`     | `i:<decimal>`                  |
//! | `Float(x)`   | `f:<16 hex digits of x.to_bits()>` |
//! | `Text(s)`    | `s:<text>`                     |
//!
//! The layout is private to one merge and carries no compatibility promise.

use crate::error::{DiffError, Result};
use crate::table::Table;
use crate::value::{Key, Row, Value};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Rows read from a chunk per page
pub const DEFAULT_PAGE_SIZE: usize = 16;

/// Encode one value as a staging field
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => "n".to_string(),
        Value::Bool(b) => format!("b:{b}"),
        Value::Int(i) => format!("i:{i}"),
        Value::Float(x) => format!("f:{:016x}", x.to_bits()),
        Value::Text(s) => format!("s:{s}"),
    }
}

/// Decode a staging field produced by [`encode_value`]
pub fn decode_value(field: &str) -> Result<Value> {
    let invalid = |reason: &str| DiffError::StagingDecode {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    if field == "n" {
        return Ok(Value::Null);
    }
    let (tag, body) = field
        .split_once(':')
        .ok_or_else(|| invalid("missing type tag"))?;
    match tag {
        "b" => match body {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid("invalid boolean")),
        },
        "i" => body
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| invalid(&e.to_string())),
        "f" => u64::from_str_radix(body, 16)
            .map(|bits| Value::Float(f64::from_bits(bits)))
            .map_err(|e| invalid(&e.to_string())),
        "s" => Ok(Value::Text(body.to_string())),
        _ => Err(invalid("unknown type tag")),
    }
}

fn encode_row(row: &Row) -> Vec<String> {
    let mut record = Vec::with_capacity(1 + row.key.arity() + row.columns.len());
    record.push(row.key.arity().to_string());
    record.extend(row.key.values().iter().map(encode_value));
    record.extend(row.columns.iter().map(encode_value));
    record
}

fn decode_row(record: &csv::StringRecord, path: &Path) -> Result<Row> {
    let malformed = |reason: String| DiffError::StagingRecord {
        path: path.to_path_buf(),
        reason,
    };

    let arity: usize = record
        .get(0)
        .ok_or_else(|| malformed("empty record".to_string()))?
        .parse()
        .map_err(|e| malformed(format!("invalid key arity: {e}")))?;
    if arity == 0 || record.len() < 1 + arity {
        return Err(malformed(format!(
            "key arity {arity} does not fit a record of {} fields",
            record.len()
        )));
    }

    let mut fields = record.iter().skip(1);
    let key = fields
        .by_ref()
        .take(arity)
        .map(decode_value)
        .collect::<Result<Vec<_>>>()?;
    let columns = fields.map(decode_value).collect::<Result<Vec<_>>>()?;
    Ok(Row::new(Key::composite(key), columns))
}

/// A sorted batch spilled to disk
#[derive(Debug, Clone)]
pub struct StagingChunk {
    path: PathBuf,
    rows: usize,
}

impl StagingChunk {
    /// Write an already sorted batch to `dir/<index>.csv`
    pub fn write(dir: &Path, index: usize, batch: &Table) -> Result<Self> {
        let path = dir.join(format!("{index}.csv"));
        let file = File::create(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(BufWriter::new(file));

        for row in batch.rows() {
            writer.write_record(encode_row(row))?;
        }
        writer.flush()?;

        log::debug!("Staged chunk {} with {} rows", path.display(), batch.len());
        Ok(Self {
            path,
            rows: batch.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Open a page-wise cursor over the chunk
    pub fn open(&self, page_size: usize) -> Result<ChunkCursor> {
        ChunkCursor::open(&self.path, page_size)
    }
}

/// Forward cursor reading a staging chunk one page at a time.
///
/// At most `page_size` decoded rows are held in memory.
pub struct ChunkCursor {
    path: PathBuf,
    reader: csv::Reader<BufReader<File>>,
    record: csv::StringRecord,
    page: VecDeque<Row>,
    page_size: usize,
    done: bool,
}

impl ChunkCursor {
    pub fn open(path: &Path, page_size: usize) -> Result<Self> {
        let file = File::open(path)?;
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(BufReader::new(file));
        let page_size = page_size.max(1);
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            record: csv::StringRecord::new(),
            page: VecDeque::with_capacity(page_size),
            page_size,
            done: false,
        })
    }

    fn read_page(&mut self) -> Result<()> {
        while self.page.len() < self.page_size {
            if !self.reader.read_record(&mut self.record)? {
                self.done = true;
                break;
            }
            let row = decode_row(&self.record, &self.path)?;
            self.page.push_back(row);
        }
        Ok(())
    }

    /// Rows currently buffered from the last page read
    pub fn buffered_rows(&self) -> usize {
        self.page.len()
    }
}

impl Iterator for ChunkCursor {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.page.is_empty() && !self.done {
            if let Err(e) = self.read_page() {
                self.done = true;
                self.page.clear();
                return Some(Err(e));
            }
        }
        self.page.pop_front().map(Ok)
    }
}
