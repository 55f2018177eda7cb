// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental text-flow layout for collaboratively edited rich text.
//!
//! Quire lays out a shared document (a [`Sequence`] of text runs and
//! markers) into a viewport: paragraphs are itemized and broken greedily into
//! lines, text wraps around floating inclusions, tables are laid out cell by
//! cell, and math regions are handed to a [`MathTypesetter`]. Line breaks are
//! cached per paragraph and invalidated by the edits that touch them.
//!
//! On top of the laid out lines, [`PositionMapper`] converts between document
//! positions and viewport pixels, and [`PresenceTracker`] keeps the cursors of
//! collaborators anchored as the document changes under them.
//!
//! [`FlowEngine`] ties it all together for one view:
//!
//! ```
//! use quire::inputs::MonospaceMeasure;
//! use quire::{FlowEngine, LayoutConfig, Size};
//!
//! let engine = FlowEngine::new(
//!     LayoutConfig::default(),
//!     Box::new(MonospaceMeasure::new(10.0, 20.0)),
//!     Box::new(MonospaceMeasure::new(10.0, 20.0)),
//!     Size::new(600.0, 400.0),
//! );
//! assert!(engine.is_render_pending());
//! ```
//!
//! The document store is external. `quire_sequence` provides an in-memory
//! implementation of [`Sequence`] that is convenient for tests.

mod components;
mod config;
mod engine;
mod error;
mod geometry;
mod outputs;
mod position;
mod presence;
mod schedule;
mod segment;

pub mod inputs;
pub mod itemize;
pub mod layout;

#[cfg(test)]
mod tests;

pub use components::{ComponentTask, ComponentTasks};
pub use config::{LayoutConfig, DEFAULT_FONT_SIZE};
pub use engine::FlowEngine;
pub use error::{Error, ErrorKind};
pub use geometry::{Point, Rect, Size};
pub use layout::CacheStats;
pub use outputs::{
    CellBox, Fragment, FragmentKind, LineBox, LineKind, OverlayMarker, PresenceCursor,
    RenderOutput, RowBox, SettledInclusion,
};
pub use position::{closest_north, closest_south, Caret, PositionMapper};
pub use presence::{DragUpdate, PresenceInfo, PresenceOutcome, PresenceTracker, PresenceUpdate};
pub use schedule::{RenderScheduler, RenderTrigger, ScheduledRender};
pub use segment::{
    Embed, Label, Labels, MarkerProps, PropertyPatch, Segment, SegmentId, SegmentKind,
};

pub use inputs::{MathTypesetter, Sequence, TextMeasure};
