// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::inputs::{ClientId, ComponentId};
use crate::segment::SegmentId;

/// Rich error type for layout diagnostics.
///
/// Layout never aborts on these: a render pass contains the failure to the
/// paragraph, table or cell being processed, logs it, and records it in
/// [`RenderOutput::diagnostics`](crate::RenderOutput::diagnostics).
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// The non-exhaustive category describing this error.
    kind: ErrorKind,

    /// The sequence position the failure was detected at, when known.
    position: Option<usize>,

    /// The measured extent that triggered an inconsistency.
    measured: f32,

    /// The extent that was available.
    available: f32,

    /// The collaborator involved in a presence failure.
    client: Option<ClientId>,

    /// The embedded component involved in a load failure.
    component: Option<ComponentId>,

    /// The segment (tile or marker) the failure relates to.
    segment: Option<SegmentId>,
}

impl Error {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The sequence position the failure was detected at.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// The measured width of an overflowing line.
    pub fn measured(&self) -> f32 {
        self.measured
    }

    /// The width that was available to an overflowing line.
    pub fn available(&self) -> f32 {
        self.available
    }

    /// The collaborator whose presence could not be resolved.
    pub fn client(&self) -> Option<ClientId> {
        self.client
    }

    /// The component that failed to load.
    pub fn component(&self) -> Option<ComponentId> {
        self.component
    }

    /// The segment the failure relates to.
    pub fn segment(&self) -> Option<SegmentId> {
        self.segment
    }

    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            position: None,
            measured: 0.0,
            available: 0.0,
            client: None,
            component: None,
            segment: None,
        }
    }

    pub(crate) fn layout_inconsistency(position: usize, measured: f32, available: f32) -> Self {
        Self {
            position: Some(position),
            measured,
            available,
            ..Self::new(ErrorKind::LayoutInconsistency)
        }
    }

    pub(crate) fn missing_tile(position: usize) -> Self {
        Self {
            position: Some(position),
            ..Self::new(ErrorKind::MissingTile)
        }
    }

    pub(crate) fn unresolved_presence(client: ClientId, position: Option<usize>) -> Self {
        Self {
            position,
            client: Some(client),
            ..Self::new(ErrorKind::UnresolvedPresence)
        }
    }

    pub(crate) fn async_load_failure(
        component: ComponentId,
        marker: SegmentId,
        position: usize,
    ) -> Self {
        Self {
            position: Some(position),
            component: Some(component),
            segment: Some(marker),
            ..Self::new(ErrorKind::AsyncLoadFailure)
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::LayoutInconsistency => write!(
                f,
                "line at {} measures {} but only {} is available",
                self.position.unwrap_or_default(),
                self.measured,
                self.available
            ),
            ErrorKind::MissingTile => write!(
                f,
                "no enclosing paragraph tile for position {}",
                self.position.unwrap_or_default()
            ),
            ErrorKind::UnresolvedPresence => match (self.client, self.position) {
                (Some(client), Some(pos)) => {
                    write!(f, "presence of client {client} at {pos} cannot be resolved")
                }
                (Some(client), None) => {
                    write!(f, "presence handle of client {client} no longer resolves")
                }
                _ => write!(f, "presence cannot be resolved"),
            },
            ErrorKind::AsyncLoadFailure => match self.component {
                Some(component) => write!(
                    f,
                    "component {} at {} failed to load",
                    component.0,
                    self.position.unwrap_or_default()
                ),
                None => write!(f, "component failed to load"),
            },
        }
    }
}

impl core::error::Error for Error {}

/// The non-exhaustive category of an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A produced line exceeds its available width.
    LayoutInconsistency,

    /// A position has no enclosing paragraph or table tile.
    MissingTile,

    /// A location handle cannot be resolved any more.
    UnresolvedPresence,

    /// An embedded component failed to load.
    AsyncLoadFailure,
}
