// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What a render pass produces.

use crate::error::Error;
use crate::geometry::Rect;
use crate::inputs::{ClientId, ComponentId, Font};
use crate::itemize::ComponentState;
use crate::layout::ExclusionRect;
use crate::segment::SegmentId;

/// One visual line, or one zone of a line split by an exclusion.
///
/// Coordinates are absolute within the viewport, including lines nested in
/// table cells.
#[derive(Clone, Debug, PartialEq)]
pub struct LineBox {
    /// First position on the line.
    pub start: usize,
    /// One past the last position on the line.
    pub end: usize,
    /// Left edge of the zone.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width of the zone.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Indent before the content.
    pub indent_width: f32,
    /// Index of the line within its paragraph.
    pub break_index: usize,
    /// The paragraph tile, for text lines.
    pub paragraph: Option<SegmentId>,
    /// Font of the text on the line.
    pub font: Font,
    /// List symbol drawn in the indent.
    pub indent_symbol: Option<String>,
    /// Content.
    pub kind: LineKind,
}

impl LineBox {
    /// Bounds of the line.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Returns `true` if `pos` lies on this line.
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }
}

/// Content of a [`LineBox`].
#[derive(Clone, Debug, PartialEq)]
pub enum LineKind {
    /// Text and inline items.
    Text {
        /// Items in position order.
        fragments: Vec<Fragment>,
    },
    /// A block component band.
    Block {
        /// The component.
        component: ComponentId,
        /// Its load state.
        state: ComponentState,
    },
    /// A table row.
    Row(RowBox),
}

/// A positioned piece of a text line.
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    /// First position covered.
    pub start: usize,
    /// One past the last position covered.
    pub end: usize,
    /// Offset from the content origin of the line.
    pub x: f32,
    /// Advance width.
    pub width: f32,
    /// Content.
    pub kind: FragmentKind,
}

/// Content of a [`Fragment`].
#[derive(Clone, Debug, PartialEq)]
pub enum FragmentKind {
    /// A text run.
    Text(String),
    /// One whitespace character.
    Glue,
    /// A typeset math region. The source has the cursor token spliced in
    /// when the local cursor is inside the region.
    Math {
        /// Source handed to the typesetter.
        source: String,
    },
    /// An inline component.
    Component {
        /// The component.
        id: ComponentId,
        /// Its load state.
        state: ComponentState,
    },
    /// A marker without extent.
    Marker(SegmentId),
}

/// A laid out table row.
#[derive(Clone, Debug, PartialEq)]
pub struct RowBox {
    /// Cells that were laid out, left to right.
    pub cells: Vec<CellBox>,
}

/// A laid out table cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellBox {
    /// Position of the cell begin marker.
    pub start: usize,
    /// One past the position of the cell end marker.
    pub end: usize,
    /// Left edge.
    pub x: f32,
    /// Width.
    pub width: f32,
    /// Height, equal to the row height.
    pub height: f32,
    /// Lines of the cell.
    pub lines: Vec<LineBox>,
}

/// An ink overlay anchored inside the rendered range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OverlayMarker {
    /// The anchoring marker.
    pub marker: SegmentId,
    /// Its position.
    pub position: usize,
}

/// Where a dragged inclusion should be anchored, now that text has wrapped
/// around it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SettledInclusion {
    /// The marker to move.
    pub marker: SegmentId,
    /// The position it should move to.
    pub anchor: usize,
}

/// A caret drawn for a collaborator or the local user.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PresenceCursor {
    /// The client.
    pub client: ClientId,
    /// Caret position.
    pub position: usize,
    /// Selection anchor.
    pub mark: Option<usize>,
    /// Caret left edge.
    pub x: f32,
    /// Caret top.
    pub y: f32,
    /// Caret height.
    pub height: f32,
}

/// Result of one render pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderOutput {
    /// The position the pass was asked to show at the top.
    pub top_position: usize,
    /// First position shown.
    pub viewport_start_pos: usize,
    /// One past the last position shown.
    pub viewport_end_pos: usize,
    /// Height of content laid out above the viewport and not shown.
    pub deferred_height: f32,
    /// Overlays anchored inside the shown range.
    pub overlay_markers: Vec<OverlayMarker>,
    /// Lines in layout order.
    pub lines: Vec<LineBox>,
    /// Exclusions in effect at the end of the pass.
    pub exclusions: Vec<ExclusionRect>,
    /// Inclusions that settled during the pass.
    pub settled: Vec<SettledInclusion>,
    /// Carets of the local user and collaborators inside the shown range.
    pub cursors: Vec<PresenceCursor>,
    /// Components met without a load task.
    pub requested_components: Vec<ComponentId>,
    /// Contained failures.
    pub diagnostics: Vec<Error>,
}

impl RenderOutput {
    /// Returns `true` if `pos` lies inside the shown range.
    pub fn contains_position(&self, pos: usize) -> bool {
        self.viewport_start_pos <= pos && pos < self.viewport_end_pos
    }

    /// Text and block lines, descending into table cells, in layout order.
    pub fn leaf_lines(&self) -> Vec<&LineBox> {
        fn walk<'a>(lines: &'a [LineBox], out: &mut Vec<&'a LineBox>) {
            for line in lines {
                match &line.kind {
                    LineKind::Row(row) => {
                        for cell in &row.cells {
                            walk(&cell.lines, out);
                        }
                    }
                    _ => out.push(line),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.lines, &mut out);
        out
    }
}
