//! External k-way merge sort over staged batches

use crate::config::StagingConfig;
use crate::error::Result;
use crate::peekable::PeekableSequence;
use crate::staging::{ChunkCursor, StagingChunk};
use crate::table::Table;
use crate::value::{Key, Row};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::path::Path;
use tempfile::TempDir;

/// One staged chunk wrapped for lookahead during the merge
pub type MergeCursor = PeekableSequence<ChunkCursor, Row>;

/// Sorts an arbitrary sequence of batches into one globally ordered stream
/// using bounded memory.
#[derive(Debug, Clone, Default)]
pub struct ExternalMergeSorter {
    config: StagingConfig,
}

impl ExternalMergeSorter {
    pub fn new(config: StagingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    fn create_staging_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.config.prefix);
        let dir = match &self.config.directory {
            Some(base) => {
                std::fs::create_dir_all(base)?;
                builder.tempdir_in(base)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    /// Stage every batch to disk and open the merged stream.
    ///
    /// Each batch is sorted in memory before it is written, so a single batch
    /// must fit in memory. The staging directory is removed when the returned
    /// stream is exhausted or dropped, and before this call returns an error.
    pub fn sort<I>(&self, batches: I) -> Result<MergedRows>
    where
        I: IntoIterator<Item = Result<Table>>,
    {
        let staging = self.create_staging_dir()?;
        log::debug!("Created staging directory {}", staging.path().display());

        let mut cursors = Vec::new();
        let mut heap = BinaryHeap::new();
        let mut staged_rows = 0usize;

        for (index, batch) in batches.into_iter().enumerate() {
            let batch = batch?.sorted();
            if batch.is_empty() {
                log::debug!("Skipping empty batch {index}");
                continue;
            }
            staged_rows += batch.len();
            let chunk = StagingChunk::write(staging.path(), index, &batch)?;
            drop(batch);

            let mut cursor = MergeCursor::new(chunk.open(self.config.page_size)?);
            if let Some(key) = cursor.peek_key()?.cloned() {
                heap.push(Reverse((key, cursors.len())));
                cursors.push(cursor);
            }
        }

        log::debug!(
            "Merging {} staged chunks holding {} rows",
            cursors.len(),
            staged_rows
        );

        Ok(MergedRows {
            cursors,
            heap,
            staging: Some(staging),
            failed: false,
        })
    }
}

/// Globally sorted row stream produced by [`ExternalMergeSorter::sort`].
///
/// Rows with equal keys are emitted in batch order, then in their order within
/// the batch. Owns the staging directory for its whole lifetime.
pub struct MergedRows {
    cursors: Vec<MergeCursor>,
    heap: BinaryHeap<Reverse<(Key, usize)>>,
    staging: Option<TempDir>,
    failed: bool,
}

impl MergedRows {
    /// Location of the staging directory while the merge is open
    pub fn staging_path(&self) -> Option<&Path> {
        self.staging.as_ref().map(|dir| dir.path())
    }

    fn release(&mut self) {
        self.cursors.clear();
        self.heap.clear();
        if let Some(dir) = self.staging.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("Failed to remove staging directory {}: {e}", path.display());
            } else {
                log::debug!("Removed staging directory {}", path.display());
            }
        }
    }

    fn advance(&mut self) -> Result<Option<Row>> {
        let Some(Reverse((_, index))) = self.heap.pop() else {
            return Ok(None);
        };
        let cursor = &mut self.cursors[index];
        let row = cursor.consume()?;
        if let Some(key) = cursor.peek_key()?.cloned() {
            self.heap.push(Reverse((key, index)));
        }
        Ok(row)
    }
}

impl Iterator for MergedRows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.advance() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.release();
                None
            }
            Err(e) => {
                self.failed = true;
                self.release();
                Some(Err(e))
            }
        }
    }
}

impl Drop for MergedRows {
    fn drop(&mut self) {
        self.release();
    }
}
