// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

use hashbrown::HashMap;
use quire::inputs::{
    ClientId, DeltaKind, EditableSequence, LocationHandle, Perspective, SegmentOffset, SeqNum,
    Sequence, SequenceDelta, StackContext, StackEntry, TileHit,
};
use quire::{Label, PropertyPatch, Segment, SegmentId, SegmentKind};

use crate::error::Error;

/// Who applied an insertion or removal, and when.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Stamp {
    seq: SeqNum,
    client: ClientId,
}

impl Stamp {
    /// Whether a client looking from `perspective` has seen the operation.
    fn seen_by(self, perspective: Perspective) -> bool {
        self.client == perspective.client || self.seq <= perspective.ref_seq
    }
}

#[derive(Clone, Debug)]
struct Entry {
    segment: Segment,
    inserted: Stamp,
    removed: Option<Stamp>,
}

impl Entry {
    fn visible_len(&self, perspective: Perspective) -> usize {
        if !self.inserted.seen_by(perspective)
            || self.removed.is_some_and(|removed| removed.seen_by(perspective))
        {
            return 0;
        }
        self.segment.len()
    }

    fn is_live(&self) -> bool {
        self.removed.is_none()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Slot {
    segment: SegmentId,
    offset: usize,
}

/// An already sequenced operation from another client.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteOp {
    /// The originating client.
    pub client: ClientId,
    /// Sequence number assigned to the operation.
    pub seq: SeqNum,
    /// Highest sequence number the client had seen when it made the edit.
    pub ref_seq: SeqNum,
    /// The edit, with positions in the client's perspective.
    pub op: Op,
}

/// An edit carried by a [`RemoteOp`].
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    /// Inserts one segment.
    Insert {
        /// Insertion position.
        pos: usize,
        /// The new segment.
        kind: SegmentKind,
    },
    /// Removes a range.
    Remove {
        /// The removed range.
        range: Range<usize>,
    },
    /// Patches marker properties in a range.
    Annotate {
        /// The annotated range.
        range: Range<usize>,
        /// The patch.
        patch: PropertyPatch,
    },
}

/// An in-memory shared sequence.
///
/// Segments carry the sequence number and client of the operation that
/// inserted them and, once removed, of the one that removed them. Positions
/// can be resolved from the perspective of any client at any reference
/// sequence number, which is how remote edits and cursor updates made
/// against an older state find their place.
///
/// Local edits are sequenced immediately. Removed segments stay in place as
/// tombstones until [`SharedSequence::compact`] drops them.
#[derive(Clone, Debug)]
pub struct SharedSequence {
    local_client: ClientId,
    seq: SeqNum,
    next_segment: u64,
    next_handle: u64,
    entries: Vec<Entry>,
    handles: HashMap<LocationHandle, Slot>,
}

impl SharedSequence {
    /// Creates an empty sequence edited locally by `local_client`.
    pub fn new(local_client: ClientId) -> Self {
        Self {
            local_client,
            seq: 0,
            next_segment: 1,
            next_handle: 1,
            entries: Vec::new(),
            handles: HashMap::new(),
        }
    }

    /// Creates a sequence holding `segments` as its initial, shared state.
    pub fn from_segments(
        local_client: ClientId,
        segments: impl IntoIterator<Item = SegmentKind>,
    ) -> Self {
        let mut sequence = Self::new(local_client);
        let initial = Stamp {
            seq: 0,
            client: local_client,
        };
        for kind in segments {
            let id = sequence.allocate_id();
            sequence.entries.push(Entry {
                segment: Segment { id, kind },
                inserted: initial,
                removed: None,
            });
        }
        sequence
    }

    /// Inserts text at `pos`.
    pub fn insert_text(&mut self, pos: usize, text: &str) -> Result<SequenceDelta, Error> {
        self.insert_marker(pos, SegmentKind::text(text))
    }

    /// Inserts a segment at `pos`. Despite the name, any segment kind is
    /// accepted.
    pub fn insert_marker(&mut self, pos: usize, kind: SegmentKind) -> Result<SequenceDelta, Error> {
        let perspective = self.local_perspective();
        self.check_range(&(pos..pos), perspective)?;
        let stamp = self.next_local_stamp();
        self.insert_from(pos, kind, perspective, stamp, true)
    }

    /// Removes `range`.
    pub fn remove(&mut self, range: Range<usize>) -> Result<SequenceDelta, Error> {
        let perspective = self.local_perspective();
        self.check_range(&range, perspective)?;
        let stamp = self.next_local_stamp();
        Ok(self.remove_from(range, perspective, stamp, true))
    }

    /// Applies `patch` to every marker in `range`.
    pub fn annotate(
        &mut self,
        range: Range<usize>,
        patch: &PropertyPatch,
    ) -> Result<SequenceDelta, Error> {
        let perspective = self.local_perspective();
        self.check_range(&range, perspective)?;
        let stamp = self.next_local_stamp();
        Ok(self.annotate_from(range, patch, perspective, stamp, true))
    }

    /// Applies an operation sequenced elsewhere.
    pub fn apply(&mut self, remote: &RemoteOp) -> Result<SequenceDelta, Error> {
        if remote.seq <= self.seq {
            let err = Error::stale_operation(remote.seq, self.len());
            tracing::warn!("rejecting remote op from client {}: {err}", remote.client);
            return Err(err);
        }
        let perspective = Perspective {
            ref_seq: remote.ref_seq,
            client: remote.client,
        };
        let stamp = Stamp {
            seq: remote.seq,
            client: remote.client,
        };
        let delta = match &remote.op {
            Op::Insert { pos, kind } => {
                self.insert_from(*pos, kind.clone(), perspective, stamp, false)?
            }
            Op::Remove { range } => {
                self.check_range(range, perspective)?;
                self.remove_from(range.clone(), perspective, stamp, false)
            }
            Op::Annotate { range, patch } => {
                self.check_range(range, perspective)?;
                self.annotate_from(range.clone(), patch, perspective, stamp, false)
            }
        };
        self.seq = remote.seq;
        Ok(delta)
    }

    /// Drops removed segments whose removal every client has seen, i.e.
    /// was sequenced at or before `min_seq`.
    ///
    /// Handles on dropped segments move to the start of the next live
    /// segment, or else to the end of the previous one. Returns how many
    /// segments were dropped.
    pub fn compact(&mut self, min_seq: SeqNum) -> usize {
        let doomed = |entry: &Entry| entry.removed.is_some_and(|removed| removed.seq <= min_seq);
        let mut rehome = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            if !doomed(entry) {
                continue;
            }
            let id = entry.segment.id;
            let next = self.entries[index + 1..]
                .iter()
                .find(|entry| entry.is_live())
                .map(|entry| Slot {
                    segment: entry.segment.id,
                    offset: 0,
                });
            let target = next.or_else(|| {
                self.entries[..index]
                    .iter()
                    .rev()
                    .find(|entry| entry.is_live())
                    .map(|entry| Slot {
                        segment: entry.segment.id,
                        offset: entry.segment.len(),
                    })
            });
            rehome.push((id, target));
        }
        for (id, target) in &rehome {
            let moved: Vec<LocationHandle> = self
                .handles
                .iter()
                .filter(|(_, slot)| slot.segment == *id)
                .map(|(handle, _)| *handle)
                .collect();
            for handle in moved {
                match target {
                    Some(slot) => {
                        self.handles.insert(handle, *slot);
                    }
                    None => {
                        self.handles.remove(&handle);
                    }
                }
            }
        }
        let before = self.entries.len();
        self.entries.retain(|entry| !doomed(entry));
        let dropped = before - self.entries.len();
        if dropped > 0 {
            tracing::debug!("compacted {dropped} removed segment(s) at min seq {min_seq}");
        }
        dropped
    }

    /// The visible content. Paragraph tiles read as `'\n'` and other markers
    /// as U+FFFC, so positions line up with characters.
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.len());
        for entry in self.entries.iter().filter(|entry| entry.is_live()) {
            match &entry.segment.kind {
                SegmentKind::Text { content } => text.push_str(content),
                SegmentKind::TileMarker { .. } if entry.segment.is_tile(Label::Paragraph) => {
                    text.push('\n');
                }
                _ => text.push('\u{fffc}'),
            }
        }
        text
    }

    /// The word around `pos`, across segment boundaries. A position just
    /// past a word selects that word.
    pub fn word_at(&self, pos: usize) -> Option<Range<usize>> {
        let chars: Vec<char> = self.text().chars().collect();
        let is_word =
            |index: usize| chars.get(index).is_some_and(|ch| ch.is_alphanumeric() || *ch == '_');
        let anchor = if is_word(pos) {
            pos
        } else if pos > 0 && is_word(pos - 1) {
            pos - 1
        } else {
            return None;
        };
        let mut start = anchor;
        while start > 0 && is_word(start - 1) {
            start -= 1;
        }
        let mut end = anchor + 1;
        while is_word(end) {
            end += 1;
        }
        Some(start..end)
    }

    /// Number of segments, including removed ones not yet compacted.
    pub fn segment_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of attached handles.
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    fn allocate_id(&mut self) -> SegmentId {
        let id = SegmentId(self.next_segment);
        self.next_segment += 1;
        id
    }

    fn next_local_stamp(&mut self) -> Stamp {
        self.seq += 1;
        Stamp {
            seq: self.seq,
            client: self.local_client,
        }
    }

    fn len_in(&self, perspective: Perspective) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.visible_len(perspective))
            .sum()
    }

    fn check_range(&self, range: &Range<usize>, perspective: Perspective) -> Result<(), Error> {
        let len = self.len_in(perspective);
        if range.start > range.end {
            return Err(Error::invalid_range(range.start, range.end, len));
        }
        if range.end > len {
            return Err(Error::out_of_bounds(range.start, range.end, len));
        }
        Ok(())
    }

    /// Local position of the start of the entry at `index`.
    fn local_start(&self, index: usize) -> usize {
        let local = self.local_perspective();
        self.entries[..index]
            .iter()
            .map(|entry| entry.visible_len(local))
            .sum()
    }

    /// Index of the entry that starts at `pos` in `perspective`, splitting a
    /// text segment when `pos` falls inside it.
    fn split_at(&mut self, pos: usize, perspective: Perspective) -> usize {
        let mut start = 0;
        for index in 0..self.entries.len() {
            let len = self.entries[index].visible_len(perspective);
            if start == pos && len > 0 {
                return index;
            }
            if start < pos && pos < start + len {
                self.split_entry(index, pos - start);
                return index + 1;
            }
            start += len;
        }
        self.entries.len()
    }

    fn split_entry(&mut self, index: usize, offset: usize) {
        let right_id = self.allocate_id();
        let entry = &mut self.entries[index];
        let left_id = entry.segment.id;
        let SegmentKind::Text { content } = &mut entry.segment.kind else {
            return;
        };
        let at = content
            .char_indices()
            .nth(offset)
            .map_or(content.len(), |(byte, _)| byte);
        let right = content.split_off(at);
        let right_entry = Entry {
            segment: Segment {
                id: right_id,
                kind: SegmentKind::text(right),
            },
            inserted: entry.inserted,
            removed: entry.removed,
        };
        self.entries.insert(index + 1, right_entry);
        for slot in self.handles.values_mut() {
            if slot.segment == left_id && slot.offset >= offset {
                slot.segment = right_id;
                slot.offset -= offset;
            }
        }
    }

    fn insert_from(
        &mut self,
        pos: usize,
        kind: SegmentKind,
        perspective: Perspective,
        stamp: Stamp,
        local: bool,
    ) -> Result<SequenceDelta, Error> {
        let len = self.len_in(perspective);
        if pos > len {
            return Err(Error::out_of_bounds(pos, pos, len));
        }
        let index = self.split_at(pos, perspective);
        let id = self.allocate_id();
        let segment = Segment { id, kind };
        let inserted = segment.len();
        self.entries.insert(
            index,
            Entry {
                segment,
                inserted: stamp,
                removed: None,
            },
        );
        let start = self.local_start(index);
        tracing::trace!(
            "client {} inserted {inserted} position(s) at {start} (seq {})",
            stamp.client,
            stamp.seq
        );
        Ok(SequenceDelta {
            kind: DeltaKind::Insert,
            range: start..start + inserted,
            seq: stamp.seq,
            ref_seq: perspective.ref_seq,
            op_range: pos..pos + inserted,
            client: stamp.client,
            local,
            segments: vec![id],
        })
    }

    fn remove_from(
        &mut self,
        range: Range<usize>,
        perspective: Perspective,
        stamp: Stamp,
        local: bool,
    ) -> SequenceDelta {
        let mut segments = Vec::new();
        let mut first = self.entries.len();
        if !range.is_empty() {
            first = self.split_at(range.start, perspective);
            let last = self.split_at(range.end, perspective);
            for entry in &mut self.entries[first..last] {
                if entry.is_live() && entry.visible_len(perspective) > 0 {
                    entry.removed = Some(stamp);
                    segments.push(entry.segment.id);
                }
            }
        }
        let start = self.local_start(first.min(self.entries.len()));
        tracing::trace!(
            "client {} removed {} segment(s) at {start} (seq {})",
            stamp.client,
            segments.len(),
            stamp.seq
        );
        SequenceDelta {
            kind: DeltaKind::Remove,
            range: start..start,
            seq: stamp.seq,
            ref_seq: perspective.ref_seq,
            op_range: range.start..range.start,
            client: stamp.client,
            local,
            segments,
        }
    }

    fn annotate_from(
        &mut self,
        range: Range<usize>,
        patch: &PropertyPatch,
        perspective: Perspective,
        stamp: Stamp,
        local: bool,
    ) -> SequenceDelta {
        let mut segments = Vec::new();
        let mut first = self.entries.len();
        let mut last = first;
        if !range.is_empty() {
            first = self.split_at(range.start, perspective);
            last = self.split_at(range.end, perspective);
            for entry in &mut self.entries[first..last] {
                if !entry.is_live() || entry.visible_len(perspective) == 0 {
                    continue;
                }
                if let Some(props) = entry.segment.props_mut() {
                    patch.apply(props);
                    segments.push(entry.segment.id);
                }
            }
        }
        let start = self.local_start(first);
        let end = self.local_start(last);
        SequenceDelta {
            kind: DeltaKind::Annotate,
            range: start..end,
            seq: stamp.seq,
            ref_seq: perspective.ref_seq,
            op_range: range,
            client: stamp.client,
            local,
            segments,
        }
    }

    fn entry(&self, id: SegmentId) -> Option<(usize, &Entry)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.segment.id == id)
    }

    /// Live entries in local order with their positions.
    fn live(&self) -> impl Iterator<Item = (usize, &Entry)> + '_ {
        let mut pos = 0;
        self.entries
            .iter()
            .filter(|entry| entry.is_live())
            .map(move |entry| {
                let start = pos;
                pos += entry.segment.len();
                (start, entry)
            })
    }
}

impl Sequence for SharedSequence {
    fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.is_live())
            .map(|entry| entry.segment.len())
            .sum()
    }

    fn current_seq(&self) -> SeqNum {
        self.seq
    }

    fn local_client(&self) -> ClientId {
        self.local_client
    }

    fn containing_segment(
        &self,
        pos: usize,
        perspective: Perspective,
    ) -> Option<SegmentOffset<'_>> {
        let mut start = 0;
        for entry in &self.entries {
            let len = entry.visible_len(perspective);
            if start <= pos && pos < start + len {
                return Some(SegmentOffset {
                    segment: &entry.segment,
                    offset: pos - start,
                });
            }
            start += len;
        }
        None
    }

    fn offset_of(&self, id: SegmentId) -> Option<usize> {
        self.live()
            .find(|(_, entry)| entry.segment.id == id)
            .map(|(start, _)| start)
    }

    fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.entry(id)
            .filter(|(_, entry)| entry.is_live())
            .map(|(_, entry)| &entry.segment)
    }

    fn visit_range<'s>(
        &'s self,
        range: Range<usize>,
        perspective: Perspective,
        visitor: &mut dyn FnMut(&'s Segment, usize) -> bool,
    ) {
        let mut start = 0;
        for entry in &self.entries {
            if start >= range.end {
                break;
            }
            let len = entry.visible_len(perspective);
            if len > 0 && start + len > range.start && !visitor(&entry.segment, start) {
                break;
            }
            start += len;
        }
    }

    fn find_tile(&self, pos: usize, label: Label, preceding: bool) -> Option<TileHit<'_>> {
        let mut tiles = self
            .live()
            .filter(|(_, entry)| entry.segment.is_tile(label))
            .map(|(start, entry)| TileHit {
                segment: &entry.segment,
                pos: start,
            });
        if preceding {
            tiles.take_while(|hit| hit.pos < pos).last()
        } else {
            tiles.find(|hit| hit.pos >= pos)
        }
    }

    fn stack_context(&self, pos: usize, labels: &[Label]) -> StackContext {
        let mut stack = StackContext::default();
        for (start, entry) in self.live() {
            if start >= pos {
                break;
            }
            let segment = &entry.segment;
            let Some(label) = segment
                .labels()
                .iter()
                .find(|label| labels.contains(label))
                .copied()
            else {
                continue;
            };
            if segment.is_range_begin(label) {
                stack.entries.push(StackEntry {
                    segment: segment.id,
                    label,
                    pos: start,
                });
            } else if segment.is_range_end(label) {
                if let Some(open) = stack.entries.iter().rposition(|e| e.label == label) {
                    stack.entries.truncate(open);
                }
            }
        }
        stack
    }

    fn attach_handle(&mut self, segment: SegmentId, offset: usize) -> LocationHandle {
        let handle = LocationHandle::from_raw(self.next_handle);
        self.next_handle += 1;
        self.handles.insert(handle, Slot { segment, offset });
        handle
    }

    fn release_handle(&mut self, handle: LocationHandle) {
        self.handles.remove(&handle);
    }

    fn resolve_handle(&self, handle: LocationHandle) -> Option<usize> {
        let slot = self.handles.get(&handle)?;
        let (index, entry) = self.entry(slot.segment)?;
        let start = self.local_start(index);
        if entry.is_live() {
            Some(start + slot.offset.min(entry.segment.len()))
        } else {
            Some(start)
        }
    }
}

impl EditableSequence for SharedSequence {
    type Error = Error;

    fn insert(&mut self, pos: usize, kind: SegmentKind) -> Result<SequenceDelta, Error> {
        self.insert_marker(pos, kind)
    }

    fn remove(&mut self, range: Range<usize>) -> Result<SequenceDelta, Error> {
        Self::remove(self, range)
    }

    fn annotate(
        &mut self,
        range: Range<usize>,
        patch: &PropertyPatch,
    ) -> Result<SequenceDelta, Error> {
        Self::annotate(self, range, patch)
    }
}
