// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use quire::inputs::SeqNum;

/// Error returned by rejected edits.
///
/// Carries a non-exhaustive [`ErrorKind`] plus the offending range and the
/// length of the sequence, in the perspective the edit was made from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    start: usize,
    end: usize,
    len: usize,
    seq: SeqNum,
}

#[expect(
    clippy::len_without_is_empty,
    reason = "`Error::len` reports sequence length context; an `is_empty` method would be misleading and unused."
)]
impl Error {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Start of the range provided by the caller.
    pub fn start(&self) -> usize {
        self.start
    }

    /// End of the range provided by the caller.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Length of the sequence as seen by the edit.
    pub fn len(&self) -> usize {
        self.len
    }

    /// For stale operations, the sequence number that was rejected.
    pub fn seq(&self) -> SeqNum {
        self.seq
    }

    pub(crate) fn out_of_bounds(start: usize, end: usize, len: usize) -> Self {
        Self {
            kind: ErrorKind::OutOfBounds,
            start,
            end,
            len,
            seq: 0,
        }
    }

    pub(crate) fn invalid_range(start: usize, end: usize, len: usize) -> Self {
        Self {
            kind: ErrorKind::InvalidRange,
            start,
            end,
            len,
            seq: 0,
        }
    }

    pub(crate) fn stale_operation(seq: SeqNum, len: usize) -> Self {
        Self {
            kind: ErrorKind::StaleOperation,
            start: 0,
            end: 0,
            len,
            seq,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::OutOfBounds => write!(
                f,
                "range {}..{} out of bounds for len {}",
                self.start, self.end, self.len
            ),
            ErrorKind::InvalidRange => {
                write!(f, "invalid range {}..{}: start > end", self.start, self.end)
            }
            ErrorKind::StaleOperation => {
                write!(f, "operation with seq {} was already applied", self.seq)
            }
        }
    }
}

impl core::error::Error for Error {}

/// The non-exhaustive category of an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Positions lie past the end of the sequence.
    OutOfBounds,

    /// The provided range had `start > end`.
    InvalidRange,

    /// A remote operation's sequence number is not newer than the current one.
    StaleOperation,
}
