// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory shared sequence for Quire.
//!
//! [`SharedSequence`] implements [`quire::Sequence`] and
//! [`quire::inputs::EditableSequence`] over a plain vector of segments. It
//! applies local edits and already sequenced remote operations, resolves
//! positions from any client's perspective, and keeps sliding location
//! handles attached to their segments across splits, removals and
//! compaction.
//!
//! It does not merge concurrent operations itself; ordering is assumed to
//! come from an external sequencing service.
//!
//! ```
//! use quire::{Sequence, SegmentKind};
//! use quire_sequence::SharedSequence;
//!
//! let mut seq = SharedSequence::from_segments(1, [SegmentKind::paragraph()]);
//! seq.insert_text(0, "hello").unwrap();
//! assert_eq!(seq.len(), 6);
//! assert_eq!(seq.word_at(2), Some(0..5));
//! ```

mod error;
mod shared;

pub use error::{Error, ErrorKind};
pub use shared::{Op, RemoteOp, SharedSequence};
