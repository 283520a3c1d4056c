//! Bounded iteration over variable-length records.
//!
//! A [`RecordCursor`] walks a byte range holding back-to-back records whose
//! total size is only known after reading each record's header. Every step
//! is checked against the bytes that remain; a record that does not fit
//! ends the sequence instead of producing an error for every later caller.

use crate::error::{CodeObjectError, Result};
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

/// A record type that declares its own padded size.
pub trait VarSizeRecord<'a>: Sized {
    /// Bytes that must be present before [`Self::padded_size`] can be read.
    /// Must be non-zero.
    const HEADER_SIZE: usize;

    /// Total size of the record starting at `bytes`, padding included.
    ///
    /// Called only with `bytes.len() >= HEADER_SIZE`. `None` means the size
    /// is not representable, which is treated like a record that does not fit.
    fn padded_size(bytes: &'a [u8]) -> Option<usize>;

    /// Build a view over exactly one record.
    ///
    /// Called only with `bytes.len() == padded_size(bytes)`.
    fn parse(bytes: &'a [u8]) -> Option<Self>;
}

/// Forward cursor over the records packed in a byte range.
///
/// Restarting means building a fresh cursor over the same range (or cloning
/// one taken before iteration began); no other state is kept.
pub struct RecordCursor<'a, R> {
    rest: &'a [u8],
    _record: PhantomData<fn() -> R>,
}

impl<'a, R: VarSizeRecord<'a>> RecordCursor<'a, R> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            rest: bytes,
            _record: PhantomData,
        }
    }

    /// The exhausted position; compares equal to any cursor that ran out.
    pub fn end() -> Self {
        Self::new(&[])
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    fn header_fits(&self) -> bool {
        self.rest.len() >= R::HEADER_SIZE
    }

    /// Padded size of the record at the cursor, clamped so a step always
    /// makes progress. Requires the header to fit.
    fn step_size(&self) -> usize {
        R::padded_size(self.rest)
            .unwrap_or(usize::MAX)
            .max(R::HEADER_SIZE)
    }

    /// True if a whole record, padding included, fits in what remains.
    pub fn is_valid(&self) -> bool {
        self.header_fits() && self.step_size() <= self.rest.len()
    }

    /// The record at the cursor.
    pub fn current(&self) -> Result<R> {
        if !self.header_fits() {
            return Err(CodeObjectError::TruncatedRecord {
                available: self.rest.len(),
                needed: R::HEADER_SIZE,
            });
        }

        let size = self.step_size();
        let truncated = CodeObjectError::TruncatedRecord {
            available: self.rest.len(),
            needed: size,
        };
        match self.rest.get(..size) {
            Some(bytes) => R::parse(bytes).ok_or(truncated),
            None => Err(truncated),
        }
    }

    /// Step past the current record. A record that overruns the range
    /// empties the cursor.
    pub fn advance(&mut self) {
        self.rest = if self.header_fits() {
            let size = self.step_size().min(self.rest.len());
            &self.rest[size..]
        } else {
            &[]
        };
    }
}

impl<'a, R: VarSizeRecord<'a>> Iterator for RecordCursor<'a, R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        match self.current() {
            Ok(record) => {
                self.advance();
                Some(record)
            }
            Err(_) => {
                self.rest = &[];
                None
            }
        }
    }
}

impl<'a, R: VarSizeRecord<'a>> FusedIterator for RecordCursor<'a, R> {}

impl<R> Clone for RecordCursor<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for RecordCursor<'_, R> {}

/// Positions are equal when the same number of bytes remain and, unless
/// nothing remains, they start at the same address.
impl<R> PartialEq for RecordCursor<'_, R> {
    fn eq(&self, other: &Self) -> bool {
        self.rest.len() == other.rest.len()
            && (self.rest.is_empty() || std::ptr::eq(self.rest.as_ptr(), other.rest.as_ptr()))
    }
}

impl<R> Eq for RecordCursor<'_, R> {}

impl<R> fmt::Debug for RecordCursor<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordCursor")
            .field("start", &self.rest.as_ptr())
            .field("remaining", &self.rest.len())
            .finish()
    }
}
