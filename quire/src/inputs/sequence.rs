// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

use smallvec::SmallVec;

use crate::segment::{Label, PropertyPatch, Segment, SegmentId, SegmentKind};

/// Identity of a collaborating client.
pub type ClientId = u32;

/// A sequence number assigned to an applied operation.
pub type SeqNum = u64;

/// The document state as seen by one client after one sequence number.
///
/// Remote operations and presence updates carry the perspective they were
/// produced in; positions inside them are only meaningful relative to it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Perspective {
    /// Highest sequence number the client had observed.
    pub ref_seq: SeqNum,
    /// The client. Its own operations are always visible to it.
    pub client: ClientId,
}

/// A segment together with an offset inside it.
#[derive(Copy, Clone, Debug)]
pub struct SegmentOffset<'a> {
    /// The segment containing the position.
    pub segment: &'a Segment,
    /// Offset of the position inside the segment.
    pub offset: usize,
}

/// A tile marker found by [`Sequence::find_tile`].
#[derive(Copy, Clone, Debug)]
pub struct TileHit<'a> {
    /// The tile.
    pub segment: &'a Segment,
    /// Its position.
    pub pos: usize,
}

/// One open region enclosing a position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StackEntry {
    /// The range begin marker.
    pub segment: SegmentId,
    /// The matched label.
    pub label: Label,
    /// Position of the begin marker.
    pub pos: usize,
}

/// The regions enclosing a position, outermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackContext {
    /// Open regions, outermost first.
    pub entries: SmallVec<[StackEntry; 4]>,
}

impl StackContext {
    /// Returns `true` if no region encloses the position.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The outermost region with `label`.
    pub fn outermost(&self, label: Label) -> Option<&StackEntry> {
        self.entries.iter().find(|entry| entry.label == label)
    }

    /// The innermost region with `label`.
    pub fn innermost(&self, label: Label) -> Option<&StackEntry> {
        self.entries.iter().rev().find(|entry| entry.label == label)
    }
}

/// A weak reference to a position that slides with concurrent edits.
///
/// Handles are created and resolved by the sequence; the engine only stores
/// them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocationHandle(u64);

impl LocationHandle {
    /// Wraps a sequence-specific handle value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The sequence-specific handle value.
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

/// What an applied operation did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeltaKind {
    /// Segments were inserted.
    Insert,
    /// Segments were removed.
    Remove,
    /// Marker properties changed.
    Annotate,
}

/// Notification of an applied operation, in the local perspective after it
/// was applied.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceDelta {
    /// What happened.
    pub kind: DeltaKind,
    /// Affected range. For removals the range is empty at the removal point.
    pub range: Range<usize>,
    /// Sequence number of the operation.
    pub seq: SeqNum,
    /// Highest sequence number the originating client had seen when it
    /// made the edit.
    pub ref_seq: SeqNum,
    /// Affected range in the originating client's perspective.
    pub op_range: Range<usize>,
    /// Originating client.
    pub client: ClientId,
    /// Whether the operation originated locally.
    pub local: bool,
    /// Segments touched by the operation.
    pub segments: Vec<SegmentId>,
}

impl SequenceDelta {
    /// Where the originating client's cursor ends up after the operation,
    /// in that client's perspective at [`ref_seq`](Self::ref_seq).
    pub fn op_cursor(&self) -> usize {
        match self.kind {
            DeltaKind::Insert => self.op_range.end,
            DeltaKind::Remove | DeltaKind::Annotate => self.op_range.start,
        }
    }
}

/// Read access to the shared sequence, plus location handles.
///
/// Positions are counted in the local perspective unless a [`Perspective`]
/// is given explicitly.
pub trait Sequence {
    /// Number of positions.
    fn len(&self) -> usize;

    /// Returns `true` if the sequence holds no positions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest applied sequence number.
    fn current_seq(&self) -> SeqNum;

    /// The local client.
    fn local_client(&self) -> ClientId;

    /// The current local perspective.
    fn local_perspective(&self) -> Perspective {
        Perspective {
            ref_seq: self.current_seq(),
            client: self.local_client(),
        }
    }

    /// The segment containing `pos` as seen from `perspective`.
    fn containing_segment(&self, pos: usize, perspective: Perspective)
        -> Option<SegmentOffset<'_>>;

    /// Current position of a live segment.
    fn offset_of(&self, id: SegmentId) -> Option<usize>;

    /// Looks up a live segment.
    fn segment(&self, id: SegmentId) -> Option<&Segment>;

    /// Visits the segments overlapping `range` as seen from `perspective`,
    /// passing each segment's start position. Stops when the visitor returns
    /// `false`.
    fn visit_range<'s>(
        &'s self,
        range: Range<usize>,
        perspective: Perspective,
        visitor: &mut dyn FnMut(&'s Segment, usize) -> bool,
    );

    /// Nearest tile marker with `label`: strictly before `pos` when
    /// `preceding`, otherwise at or after `pos`.
    fn find_tile(&self, pos: usize, label: Label, preceding: bool) -> Option<TileHit<'_>>;

    /// Regions with any of `labels` that are open at `pos`.
    fn stack_context(&self, pos: usize, labels: &[Label]) -> StackContext;

    /// Attaches a sliding handle at `offset` inside `segment`.
    fn attach_handle(&mut self, segment: SegmentId, offset: usize) -> LocationHandle;

    /// Releases a handle. Unknown handles are ignored.
    fn release_handle(&mut self, handle: LocationHandle);

    /// Current position of a handle, or `None` when it can no longer be
    /// placed anywhere.
    fn resolve_handle(&self, handle: LocationHandle) -> Option<usize>;
}

/// Local edits, used to move settled inclusions.
pub trait EditableSequence: Sequence {
    /// Error returned by rejected edits.
    type Error: core::error::Error;

    /// Inserts one segment at `pos`.
    fn insert(&mut self, pos: usize, kind: SegmentKind) -> Result<SequenceDelta, Self::Error>;

    /// Removes `range`.
    fn remove(&mut self, range: Range<usize>) -> Result<SequenceDelta, Self::Error>;

    /// Patches the properties of every marker in `range`.
    fn annotate(
        &mut self,
        range: Range<usize>,
        patch: &PropertyPatch,
    ) -> Result<SequenceDelta, Self::Error>;
}
