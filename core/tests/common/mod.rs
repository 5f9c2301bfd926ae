//! Common test utilities and fixtures

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tablediff_core::config::StagingConfig;
use tablediff_core::{CompareOptions, Key, Row, Table, Value};
use tempfile::TempDir;

/// Isolated parent directory for staging, so leftovers can be counted
pub struct StagingArea {
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl StagingArea {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().to_path_buf();
        Self { temp_dir, path }
    }

    /// Compare options that stage under this area with the given page size
    pub fn options(&self, page_size: usize) -> CompareOptions {
        CompareOptions {
            sort: true,
            staging: StagingConfig {
                directory: Some(self.path.clone()),
                page_size,
                ..Default::default()
            },
        }
    }

    /// Number of entries left in the staging area
    pub fn entries(&self) -> usize {
        count_entries(&self.path)
    }
}

pub fn count_entries(path: &Path) -> usize {
    std::fs::read_dir(path)
        .expect("Failed to read staging area")
        .count()
}

/// Row with an integer key and the given columns
pub fn int_row(key: i64, columns: Vec<Value>) -> Row {
    Row::new(Key::scalar(key), columns)
}

/// Row with a composite integer key
pub fn composite_row(key: &[i64], columns: Vec<Value>) -> Row {
    Row::new(
        Key::composite(key.iter().map(|&k| Value::Int(k)).collect()),
        columns,
    )
}

/// Deterministic permutation of `1..=n` (n must not be a multiple of 7919)
pub fn permutation(n: i64, seed: i64) -> Vec<i64> {
    (0..n).map(|i| (i * 7919 + seed).rem_euclid(n) + 1).collect()
}

/// Split keys into batches of `size` rows, each row carrying `key * 10` as its value
pub fn batches_of(keys: &[i64], size: usize) -> Vec<Table> {
    keys.chunks(size)
        .map(|chunk| {
            chunk
                .iter()
                .map(|&k| int_row(k, vec![Value::Int(k * 10)]))
                .collect()
        })
        .collect()
}
