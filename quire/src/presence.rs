// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator cursors anchored with sliding location handles.

use hashbrown::HashMap;

use crate::error::Error;
use crate::inputs::{ClientId, LocationHandle, Perspective, SeqNum, Sequence};

/// A cursor update received from, or sent to, the presence channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PresenceUpdate {
    /// The client whose cursor moved.
    pub client: ClientId,
    /// Caret position in the sender's perspective.
    pub origin_pos: usize,
    /// Selection anchor in the sender's perspective.
    pub origin_mark: Option<usize>,
    /// Highest sequence number the sender had observed.
    pub ref_seq: SeqNum,
}

/// A drag of a floating inclusion received from the presence channel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DragUpdate {
    /// The dragging client.
    pub client: ClientId,
    /// Position of the marker anchoring the dragged object.
    pub marker_pos: usize,
    /// Horizontal offset from where the drag started.
    pub dx: f32,
    /// Vertical offset from where the drag started.
    pub dy: f32,
    /// The drag is still in progress.
    pub on_the_move: bool,
}

/// The tracked cursor of one client.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PresenceInfo {
    /// The client.
    pub client: ClientId,
    /// Handle of the caret.
    pub position_handle: LocationHandle,
    /// Handle of the selection anchor.
    pub mark_handle: Option<LocationHandle>,
    /// Caret position as of the last refresh.
    pub resolved_position: usize,
    /// Selection anchor as of the last refresh.
    pub resolved_mark: Option<usize>,
    /// Reference sequence number of the applied update.
    pub ref_seq: SeqNum,
    /// Updated since the last render.
    pub fresh: bool,
}

/// What happened to a [`PresenceUpdate`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PresenceOutcome {
    /// The cursor now resolves to this position.
    Applied(usize),
    /// An update with a higher reference sequence number was already applied.
    Stale,
    /// The position could not be resolved; the update was dropped.
    Unresolved,
}

/// Cursors of all known clients.
///
/// Each client holds at most one caret handle and one anchor handle;
/// applying an update releases the previous ones.
#[derive(Clone, Debug, Default)]
pub struct PresenceTracker {
    entries: HashMap<ClientId, PresenceInfo>,
}

impl PresenceTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cursor of `client`.
    pub fn get(&self, client: ClientId) -> Option<&PresenceInfo> {
        self.entries.get(&client)
    }

    /// Number of tracked clients.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no client is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All tracked cursors, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &PresenceInfo> + '_ {
        self.entries.values()
    }

    /// Cursors whose caret lies in `start..end`.
    pub fn in_range(&self, start: usize, end: usize) -> impl Iterator<Item = &PresenceInfo> + '_ {
        self.entries
            .values()
            .filter(move |info| start <= info.resolved_position && info.resolved_position < end)
    }

    /// Applies a cursor update, resolving its positions in the sender's
    /// perspective.
    ///
    /// Updates older than the one already applied for the same client are
    /// ignored; an update with an equal reference sequence number replaces
    /// it.
    pub fn apply_update<S: Sequence + ?Sized>(
        &mut self,
        sequence: &mut S,
        update: &PresenceUpdate,
    ) -> PresenceOutcome {
        if let Some(existing) = self.entries.get(&update.client) {
            if update.ref_seq < existing.ref_seq {
                tracing::debug!(
                    "ignoring presence of client {} at ref seq {} (have {})",
                    update.client,
                    update.ref_seq,
                    existing.ref_seq
                );
                return PresenceOutcome::Stale;
            }
        }
        let perspective = Perspective {
            ref_seq: update.ref_seq,
            client: update.client,
        };
        let Some(position_handle) = attach(sequence, update.origin_pos, perspective) else {
            let err = Error::unresolved_presence(update.client, Some(update.origin_pos));
            tracing::debug!("{err}");
            return PresenceOutcome::Unresolved;
        };
        let mark_handle = update
            .origin_mark
            .and_then(|mark| attach(sequence, mark, perspective));
        let resolved_position = resolve(sequence, position_handle).unwrap_or_default();
        let resolved_mark = mark_handle.and_then(|handle| resolve(sequence, handle));

        let info = PresenceInfo {
            client: update.client,
            position_handle,
            mark_handle,
            resolved_position,
            resolved_mark,
            ref_seq: update.ref_seq,
            fresh: true,
        };
        if let Some(previous) = self.entries.insert(update.client, info) {
            release(sequence, &previous);
        }
        PresenceOutcome::Applied(resolved_position)
    }

    /// Re-resolves every handle against the current document. Entries whose
    /// caret can no longer be placed are dropped.
    pub fn refresh<S: Sequence + ?Sized>(&mut self, sequence: &mut S) -> usize {
        let mut dropped = Vec::new();
        for info in self.entries.values_mut() {
            match resolve(sequence, info.position_handle) {
                Some(position) => {
                    info.resolved_position = position;
                    info.resolved_mark =
                        info.mark_handle.and_then(|handle| resolve(sequence, handle));
                }
                None => dropped.push(info.client),
            }
        }
        for client in &dropped {
            if let Some(info) = self.entries.remove(client) {
                let err = Error::unresolved_presence(*client, None);
                tracing::debug!("dropping presence: {err}");
                release(sequence, &info);
            }
        }
        dropped.len()
    }

    /// Clears the freshness flags after a render.
    pub fn mark_rendered(&mut self) {
        for info in self.entries.values_mut() {
            info.fresh = false;
        }
    }

    /// Forgets a client that left, releasing its handles.
    pub fn remove_client<S: Sequence + ?Sized>(
        &mut self,
        sequence: &mut S,
        client: ClientId,
    ) -> bool {
        match self.entries.remove(&client) {
            Some(info) => {
                release(sequence, &info);
                true
            }
            None => false,
        }
    }
}

/// Attaches a handle at `pos` as seen from `perspective`. The end of the
/// document is addressed as one past the last segment.
fn attach<S: Sequence + ?Sized>(
    sequence: &mut S,
    pos: usize,
    perspective: Perspective,
) -> Option<LocationHandle> {
    let (segment, offset) = match sequence.containing_segment(pos, perspective) {
        Some(found) => (found.segment.id, found.offset),
        None if pos > 0 => {
            let found = sequence.containing_segment(pos - 1, perspective)?;
            (found.segment.id, found.offset + 1)
        }
        None => return None,
    };
    Some(sequence.attach_handle(segment, offset))
}

fn resolve<S: Sequence + ?Sized>(sequence: &S, handle: LocationHandle) -> Option<usize> {
    sequence
        .resolve_handle(handle)
        .map(|position| position.min(sequence.len()))
}

fn release<S: Sequence + ?Sized>(sequence: &mut S, info: &PresenceInfo) {
    sequence.release_handle(info.position_handle);
    if let Some(mark) = info.mark_handle {
        sequence.release_handle(mark);
    }
}
