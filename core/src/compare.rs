//! Streaming row comparison over two key-ordered inputs
//!
//! [`RowComparator::compare`] turns two [`Source`]s into a lazy [`DiffStream`].
//! Rows are grouped by equal key on both sides and paired positionally inside
//! each key group, so duplicate keys never produce a cross product: the
//! surplus rows of the larger group are reported as unmatched.

use crate::config::{Config, StagingConfig};
use crate::error::{DiffError, Result};
use crate::external_sort::ExternalMergeSorter;
use crate::peekable::PeekableSequence;
use crate::table::Table;
use crate::value::{Key, Row, Side};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// Fallible row producer feeding one side of a comparison
pub type RowStream = Box<dyn Iterator<Item = Result<Row>>>;

type BatchStream = Box<dyn Iterator<Item = Result<Table>>>;

/// Outcome for one pair of rows (or one unpaired row)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffRecord {
    /// Same key, all columns equal
    Identical { left: Row, right: Row },
    /// Same key, `columns` lists the 0-based value columns that differ
    Different {
        left: Row,
        right: Row,
        columns: Vec<usize>,
    },
    /// Key (or its Nth duplicate) only present on `side`
    Unmatched { row: Row, side: Side },
}

impl DiffRecord {
    pub fn key(&self) -> &Key {
        match self {
            DiffRecord::Identical { left, .. } | DiffRecord::Different { left, .. } => &left.key,
            DiffRecord::Unmatched { row, .. } => &row.key,
        }
    }

    pub fn is_identical(&self) -> bool {
        matches!(self, DiffRecord::Identical { .. })
    }

    pub fn left(&self) -> Option<&Row> {
        match self {
            DiffRecord::Identical { left, .. } | DiffRecord::Different { left, .. } => Some(left),
            DiffRecord::Unmatched { row, side: Side::Left } => Some(row),
            DiffRecord::Unmatched { .. } => None,
        }
    }

    pub fn right(&self) -> Option<&Row> {
        match self {
            DiffRecord::Identical { right, .. } | DiffRecord::Different { right, .. } => {
                Some(right)
            }
            DiffRecord::Unmatched { row, side: Side::Right } => Some(row),
            DiffRecord::Unmatched { .. } => None,
        }
    }
}

/// Record counts for a comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub identical: u64,
    pub different: u64,
    pub left_only: u64,
    pub right_only: u64,
}

impl DiffSummary {
    pub fn record(&mut self, record: &DiffRecord) {
        match record {
            DiffRecord::Identical { .. } => self.identical += 1,
            DiffRecord::Different { .. } => self.different += 1,
            DiffRecord::Unmatched { side: Side::Left, .. } => self.left_only += 1,
            DiffRecord::Unmatched { side: Side::Right, .. } => self.right_only += 1,
        }
    }

    /// Check if any record was something other than identical
    pub fn has_differences(&self) -> bool {
        self.different + self.left_only + self.right_only > 0
    }

    pub fn total(&self) -> u64 {
        self.identical + self.different + self.left_only + self.right_only
    }
}

/// One side of a comparison
pub enum Source {
    /// A complete in-memory table
    Table(Table),
    /// A sequence of batches, externally sorted when sorting is enabled
    Batches(BatchStream),
}

impl Source {
    pub fn table(table: impl Into<Table>) -> Self {
        Source::Table(table.into())
    }

    pub fn batches<I>(batches: I) -> Self
    where
        I: IntoIterator<Item = Table>,
        I::IntoIter: 'static,
    {
        Source::Batches(Box::new(batches.into_iter().map(Ok)))
    }

    /// Batches from a producer that can fail, such as a file reader
    pub fn fallible_batches<I>(batches: I) -> Self
    where
        I: IntoIterator<Item = Result<Table>>,
        I::IntoIter: 'static,
    {
        Source::Batches(Box::new(batches.into_iter()))
    }

    fn into_rows(self, options: &CompareOptions) -> Result<RowStream> {
        match self {
            Source::Table(table) => {
                let table = if options.sort { table.sorted() } else { table };
                Ok(Box::new(table.into_rows().into_iter().map(Ok)))
            }
            Source::Batches(batches) if options.sort => {
                let merged = ExternalMergeSorter::new(options.staging.clone()).sort(batches)?;
                Ok(Box::new(merged))
            }
            Source::Batches(batches) => Ok(Box::new(batches.flat_map(
                |batch| -> RowStream {
                    match batch {
                        Ok(table) => Box::new(table.into_rows().into_iter().map(Ok)),
                        Err(e) => Box::new(std::iter::once(Err(e))),
                    }
                },
            ))),
        }
    }
}

impl From<Table> for Source {
    fn from(table: Table) -> Self {
        Source::Table(table)
    }
}

/// Configuration options for a comparison
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Sort inputs by key; when false the caller asserts both inputs are sorted
    pub sort: bool,
    /// Staging used when batch inputs go through the external sort
    pub staging: StagingConfig,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            sort: true,
            staging: StagingConfig::default(),
        }
    }
}

impl From<&Config> for CompareOptions {
    fn from(config: &Config) -> Self {
        Self {
            sort: config.compare.sort,
            staging: config.staging.clone(),
        }
    }
}

/// Drives the comparison of two ordered row streams
#[derive(Debug, Clone, Default)]
pub struct RowComparator {
    options: CompareOptions,
}

impl RowComparator {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Open a lazy diff stream over `left` and `right`.
    ///
    /// Batch sources are staged to disk here when sorting is enabled; the
    /// records themselves are only computed as the stream is pulled.
    pub fn compare(&self, left: impl Into<Source>, right: impl Into<Source>) -> Result<DiffStream> {
        log::debug!("Opening comparison (sort: {})", self.options.sort);
        let left = left.into().into_rows(&self.options)?;
        let right = right.into().into_rows(&self.options)?;
        Ok(DiffStream::new(left, right))
    }
}

/// Compare two sources with explicit options
pub fn compare(left: Source, right: Source, options: &CompareOptions) -> Result<DiffStream> {
    RowComparator::new(options.clone()).compare(left, right)
}

/// Compare two in-memory tables
pub fn compare_tables(left: Table, right: Table, options: &CompareOptions) -> Result<DiffStream> {
    compare(Source::Table(left), Source::Table(right), options)
}

/// Compare two sequences of batches
pub fn compare_batches<L, R>(left: L, right: R, options: &CompareOptions) -> Result<DiffStream>
where
    L: IntoIterator<Item = Table>,
    L::IntoIter: 'static,
    R: IntoIterator<Item = Table>,
    R::IntoIter: 'static,
{
    compare(Source::batches(left), Source::batches(right), options)
}

/// Where the comparator is in its drive to exhaustion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparatorState {
    BothNonEmpty,
    LeftOnlyRemains,
    RightOnlyRemains,
    Exhausted,
    Failed,
}

/// Lazy sequence of [`DiffRecord`]s.
///
/// Only the current key group of each side is buffered. The stream is fused
/// after the first error.
pub struct DiffStream {
    left: PeekableSequence<RowStream, Row>,
    right: PeekableSequence<RowStream, Row>,
    left_group: VecDeque<Row>,
    right_group: VecDeque<Row>,
    state: ComparatorState,
    summary: DiffSummary,
}

impl DiffStream {
    /// Compare two row streams that are already in non-decreasing key order
    pub fn new(left: RowStream, right: RowStream) -> Self {
        Self {
            left: PeekableSequence::new(left),
            right: PeekableSequence::new(right),
            left_group: VecDeque::new(),
            right_group: VecDeque::new(),
            state: ComparatorState::BothNonEmpty,
            summary: DiffSummary::default(),
        }
    }

    pub fn state(&self) -> ComparatorState {
        self.state
    }

    /// Counts of the records yielded so far
    pub fn summary(&self) -> DiffSummary {
        self.summary
    }

    /// Drain the remaining records, returning the final counts
    pub fn summarize(mut self) -> Result<DiffSummary> {
        for record in self.by_ref() {
            record?;
        }
        Ok(self.summary)
    }

    /// Drain the next key group from both sides
    fn load_group(&mut self) -> Result<()> {
        let ordering = self.left.cmp_heads(&mut self.right)?;
        let (Some(left), Some(right)) = (self.left.buffered(), self.right.buffered()) else {
            return Err(DiffError::EmptySequence);
        };
        if left.key.arity() != right.key.arity() {
            return Err(DiffError::KeyArityMismatch {
                left_key: left.key.to_string(),
                right_key: right.key.to_string(),
                left: left.key.arity(),
                right: right.key.arity(),
            });
        }
        let index = match ordering {
            Ordering::Greater => right.key.clone(),
            _ => left.key.clone(),
        };

        while let Some(row) = self.left.consume_if_key(&index)? {
            self.left_group.push_back(row);
        }
        while let Some(row) = self.right.consume_if_key(&index)? {
            self.right_group.push_back(row);
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<DiffRecord>> {
        loop {
            if !self.left_group.is_empty() || !self.right_group.is_empty() {
                let left = self.left_group.pop_front();
                let right = self.right_group.pop_front();
                return pair_rows(left, right).map(Some);
            }

            match (self.left.is_non_empty()?, self.right.is_non_empty()?) {
                (true, true) => {
                    self.state = ComparatorState::BothNonEmpty;
                    self.load_group()?;
                }
                (true, false) => {
                    self.state = ComparatorState::LeftOnlyRemains;
                    return Ok(self.left.consume()?.map(|row| DiffRecord::Unmatched {
                        row,
                        side: Side::Left,
                    }));
                }
                (false, true) => {
                    self.state = ComparatorState::RightOnlyRemains;
                    return Ok(self.right.consume()?.map(|row| DiffRecord::Unmatched {
                        row,
                        side: Side::Right,
                    }));
                }
                (false, false) => return Ok(None),
            }
        }
    }

    /// Drop both inputs so any staging they hold is released now
    fn close(&mut self, state: ComparatorState) {
        self.state = state;
        let empty = || -> RowStream { Box::new(std::iter::empty()) };
        self.left = PeekableSequence::new(empty());
        self.right = PeekableSequence::new(empty());
        self.left_group.clear();
        self.right_group.clear();
    }
}

impl Iterator for DiffStream {
    type Item = Result<DiffRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(
            self.state,
            ComparatorState::Exhausted | ComparatorState::Failed
        ) {
            return None;
        }
        match self.advance() {
            Ok(Some(record)) => {
                self.summary.record(&record);
                Some(Ok(record))
            }
            Ok(None) => {
                log::debug!(
                    "Comparison finished: {} identical, {} different, {} left only, {} right only",
                    self.summary.identical,
                    self.summary.different,
                    self.summary.left_only,
                    self.summary.right_only
                );
                self.close(ComparatorState::Exhausted);
                None
            }
            Err(e) => {
                self.close(ComparatorState::Failed);
                Some(Err(e))
            }
        }
    }
}

fn pair_rows(left: Option<Row>, right: Option<Row>) -> Result<DiffRecord> {
    match (left, right) {
        (Some(left), Some(right)) => compare_rows(left, right),
        (Some(row), None) => Ok(DiffRecord::Unmatched {
            row,
            side: Side::Left,
        }),
        (None, Some(row)) => Ok(DiffRecord::Unmatched {
            row,
            side: Side::Right,
        }),
        (None, None) => Err(DiffError::EmptySequence),
    }
}

/// Classify two rows sharing a key
pub fn compare_rows(left: Row, right: Row) -> Result<DiffRecord> {
    if left.arity() != right.arity() {
        return Err(DiffError::ArityMismatch {
            key: left.key.to_string(),
            left: left.arity(),
            right: right.arity(),
        });
    }

    let columns: Vec<usize> = left
        .columns
        .iter()
        .zip(&right.columns)
        .enumerate()
        .filter(|(_, (l, r))| l != r)
        .map(|(i, _)| i)
        .collect();

    if columns.is_empty() {
        Ok(DiffRecord::Identical { left, right })
    } else {
        Ok(DiffRecord::Different {
            left,
            right,
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::value::Value;

    fn unsorted() -> CompareOptions {
        CompareOptions {
            sort: false,
            ..Default::default()
        }
    }

    fn collect(stream: DiffStream) -> Vec<DiffRecord> {
        stream.collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_no_sort_column_diffs() {
        let left = Table::new(vec![row![0; 1, "foo"], row![1; 2, "bar"], row![2; 3, "quux"]]);
        let right = Table::new(vec![row![0; 1, "foo"], row![1; 4, "bar"], row![2; 3, "quuy"]]);

        let records = collect(compare_tables(left, right, &unsorted()).unwrap());
        assert_eq!(records.len(), 3);
        assert!(records[0].is_identical());
        assert_eq!(records[0].left(), records[0].right());
        assert_eq!(
            records[1],
            DiffRecord::Different {
                left: row![1; 2, "bar"],
                right: row![1; 4, "bar"],
                columns: vec![0],
            }
        );
        assert!(matches!(&records[2], DiffRecord::Different { columns, .. } if columns == &vec![1]));
    }

    #[test]
    fn test_multiple_differing_columns_in_order() {
        let record = compare_rows(row![7; 1, "a", true, 2.5], row![7; 1, "b", false, 2.5]).unwrap();
        assert!(matches!(record, DiffRecord::Different { columns, .. } if columns == vec![1, 2]));
    }

    #[test]
    fn test_arity_mismatch_fails_and_fuses() {
        let left = Table::new(vec![row![1; 1, 2], row![2; 1]]);
        let right = Table::new(vec![row![1; 1], row![2; 1]]);

        let mut stream = compare_tables(left, right, &CompareOptions::default()).unwrap();
        assert!(matches!(
            stream.next(),
            Some(Err(DiffError::ArityMismatch { left: 2, right: 1, .. }))
        ));
        assert_eq!(stream.state(), ComparatorState::Failed);
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_key_arity_mismatch_fails_and_fuses() {
        let left = Table::new(vec![Row::new(Key::scalar(1), vec![Value::Int(1)])]);
        let right = Table::new(vec![Row::new(
            Key::composite(vec![Value::Int(1), Value::Int(0)]),
            vec![Value::Int(1)],
        )]);

        let mut stream = compare_tables(left, right, &CompareOptions::default()).unwrap();
        assert!(matches!(
            stream.next(),
            Some(Err(DiffError::KeyArityMismatch { left: 1, right: 2, .. }))
        ));
        assert_eq!(stream.state(), ComparatorState::Failed);
        assert!(stream.next().is_none());
        assert_eq!(stream.summary().total(), 0);
    }

    #[test]
    fn test_in_left_only() {
        let left = Table::new(vec![row![1; 1], row![2; 2], row![3; 3]]);
        let right = Table::new(vec![row![1; 1], row![3; 3]]);

        let records = collect(compare_tables(left, right, &CompareOptions::default()).unwrap());
        assert_eq!(records.len(), 3);
        assert!(records[0].is_identical());
        assert_eq!(
            records[1],
            DiffRecord::Unmatched {
                row: row![2; 2],
                side: Side::Left
            }
        );
        assert!(records[2].is_identical());
    }

    #[test]
    fn test_in_right_only() {
        let left = Table::new(vec![row![1; 1], row![3; 2]]);
        let right = Table::new(vec![row![1; 1], row![2; 2], row![3; 3]]);

        let records = collect(compare_tables(left, right, &CompareOptions::default()).unwrap());
        assert_eq!(records.len(), 3);
        assert!(matches!(records[1], DiffRecord::Unmatched { side: Side::Right, .. }));
        assert_eq!(records[1].key(), &Key::scalar(2));
        assert!(matches!(records[2], DiffRecord::Different { .. }));
    }

    #[test]
    fn test_trailing_rows_drain_per_side() {
        let left = Table::new(vec![row![1; 1], row![5; 5], row![6; 6]]);
        let right = Table::new(vec![row![1; 1]]);
        let mut stream = compare_tables(left, right, &CompareOptions::default()).unwrap();

        assert!(stream.next().unwrap().unwrap().is_identical());
        let record = stream.next().unwrap().unwrap();
        assert_eq!(stream.state(), ComparatorState::LeftOnlyRemains);
        assert_eq!(record.key(), &Key::scalar(5));
        assert_eq!(record.right(), None);
        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().is_none());
        assert_eq!(stream.state(), ComparatorState::Exhausted);

        let right_only = compare_tables(Table::default(), Table::new(vec![row![1; 1]]), &CompareOptions::default())
            .unwrap()
            .summarize()
            .unwrap();
        assert_eq!(right_only.right_only, 1);
        assert_eq!(right_only.total(), 1);
    }

    #[test]
    fn test_duplicate_keys_pair_positionally() {
        let left = Table::new(vec![row![1; "a"], row![1; "b"], row![1; "c"], row![2; "x"]]);
        let right = Table::new(vec![row![1; "a"], row![1; "z"], row![2; "x"], row![2; "y"]]);

        let records = collect(compare_tables(left, right, &CompareOptions::default()).unwrap());
        assert_eq!(records.len(), 5);
        assert!(records[0].is_identical());
        assert!(matches!(&records[1], DiffRecord::Different { left, right, .. }
            if left == &row![1; "b"] && right == &row![1; "z"]));
        assert_eq!(
            records[2],
            DiffRecord::Unmatched {
                row: row![1; "c"],
                side: Side::Left
            }
        );
        assert!(records[3].is_identical());
        assert_eq!(
            records[4],
            DiffRecord::Unmatched {
                row: row![2; "y"],
                side: Side::Right
            }
        );
    }

    #[test]
    fn test_unsorted_batches_chain_in_order() {
        let left = vec![Table::new(vec![row![1; 1]]), Table::new(vec![row![2; 2]])];
        let right = vec![Table::new(vec![row![1; 1], row![2; 3]])];

        let summary = compare_batches(left, right, &unsorted())
            .unwrap()
            .summarize()
            .unwrap();
        assert_eq!(summary.identical, 1);
        assert_eq!(summary.different, 1);
        assert!(summary.has_differences());
    }

    #[test]
    fn test_batch_error_surfaces() {
        let left = Source::fallible_batches(vec![
            Ok(Table::new(vec![row![1; 1], row![2; 2]])),
            Err(DiffError::Config("upstream".to_string())),
        ]);
        let right = Source::table(vec![row![1; 1], row![2; 2]]);

        let mut stream = compare(left, right, &unsorted()).unwrap();
        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().unwrap().is_err());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_record_serializes_with_kind_tag() {
        let record = DiffRecord::Unmatched {
            row: Row::new(
                Key::composite(vec![Value::Int(1), Value::Text("a".to_string())]),
                vec![Value::Null],
            ),
            side: Side::Right,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "unmatched",
                "row": {"key": [1, "a"], "columns": [null]},
                "side": "right"
            })
        );
    }
}
