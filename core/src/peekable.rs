//! Peekable wrapper over fallible, forward-only producers

use crate::error::{DiffError, Result};
use crate::value::{Key, Row};
use std::cmp::Ordering;

/// Anything that exposes a sort key
pub trait Keyed {
    fn key(&self) -> &Key;
}

impl Keyed for Row {
    fn key(&self) -> &Key {
        &self.key
    }
}

/// Forward-only producer with a one-element lookahead buffer.
///
/// Exhaustion is reported as `Ok(None)`, errors from the producer are passed
/// through as they occur. After the producer first returns `None` it is never
/// polled again.
pub struct PeekableSequence<I, T>
where
    I: Iterator<Item = Result<T>>,
{
    inner: I,
    head: Option<T>,
    exhausted: bool,
}

impl<I, T> PeekableSequence<I, T>
where
    I: Iterator<Item = Result<T>>,
{
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            head: None,
            exhausted: false,
        }
    }

    fn fill(&mut self) -> Result<()> {
        if self.head.is_none() && !self.exhausted {
            match self.inner.next() {
                Some(item) => self.head = Some(item?),
                None => self.exhausted = true,
            }
        }
        Ok(())
    }

    /// Look at the next element without consuming it
    pub fn peek(&mut self) -> Result<Option<&T>> {
        self.fill()?;
        Ok(self.head.as_ref())
    }

    /// Take the next element, returning the buffered one if present
    pub fn consume(&mut self) -> Result<Option<T>> {
        if let Some(head) = self.head.take() {
            return Ok(Some(head));
        }
        if self.exhausted {
            return Ok(None);
        }
        match self.inner.next() {
            Some(item) => item.map(Some),
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    pub fn is_non_empty(&mut self) -> Result<bool> {
        Ok(self.peek()?.is_some())
    }

    /// Element currently held in the lookahead buffer, if any
    pub fn buffered(&self) -> Option<&T> {
        self.head.as_ref()
    }
}

impl<I, T> PeekableSequence<I, T>
where
    I: Iterator<Item = Result<T>>,
    T: Keyed,
{
    /// Key of the next element
    pub fn peek_key(&mut self) -> Result<Option<&Key>> {
        Ok(self.peek()?.map(Keyed::key))
    }

    /// Orders two sequences by the keys of their next elements.
    ///
    /// Both sequences must be non-empty.
    pub fn cmp_heads(&mut self, other: &mut Self) -> Result<Ordering> {
        let left = self.peek()?.ok_or(DiffError::EmptySequence)?.key();
        let right = other.peek()?.ok_or(DiffError::EmptySequence)?.key();
        Ok(left.cmp(right))
    }

    /// Consume the next element only if its key equals `key`
    pub fn consume_if_key(&mut self, key: &Key) -> Result<Option<T>> {
        let matches = matches!(self.peek_key()?, Some(next) if next == key);
        if matches {
            self.consume()
        } else {
            Ok(None)
        }
    }
}
