// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The segment model of the shared sequence.
//!
//! A document is a flat sequence of [`Segment`]s. Text segments occupy one
//! position per `char`; every marker occupies exactly one position. Structure
//! is expressed with labelled markers:
//!
//! - a paragraph ends with a [`TileMarker`](SegmentKind::TileMarker) labelled
//!   [`Label::Paragraph`],
//! - tables, rows and cells are delimited by range markers labelled
//!   [`Label::Table`], [`Label::Row`] and [`Label::Cell`],
//! - math regions inside a paragraph are delimited by range markers labelled
//!   [`Label::Math`].

use smallvec::SmallVec;

use crate::inputs::{ComponentId, DisplayType};

/// Stable identity of a segment. Survives edits; a split produces a new id
/// for the right half.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(pub u64);

/// Structural label carried by a marker.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Label {
    /// End of a paragraph.
    Paragraph,
    /// A table region.
    Table,
    /// A table row region.
    Row,
    /// A table cell region.
    Cell,
    /// A math region inside a paragraph.
    Math,
}

/// The labels of a marker.
pub type Labels = SmallVec<[Label; 2]>;

/// One atomic unit of the shared sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Stable identity.
    pub id: SegmentId,
    /// Content.
    pub kind: SegmentKind,
}

/// The content of a [`Segment`].
#[derive(Clone, Debug, PartialEq)]
pub enum SegmentKind {
    /// A run of text.
    Text {
        /// The characters of the run.
        content: String,
    },
    /// A structural or reference marker.
    TileMarker {
        /// Structural labels. Empty for plain reference markers.
        labels: Labels,
        /// Marker properties.
        props: MarkerProps,
    },
    /// Opens a nested region.
    RangeBeginMarker {
        /// Region labels.
        labels: Labels,
        /// Region properties.
        props: MarkerProps,
    },
    /// Closes a nested region.
    RangeEndMarker {
        /// Region labels.
        labels: Labels,
        /// Region properties.
        props: MarkerProps,
    },
}

impl SegmentKind {
    /// A text segment.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// A paragraph tile.
    pub fn paragraph() -> Self {
        Self::paragraph_with(MarkerProps::default())
    }

    /// A paragraph tile with properties.
    pub fn paragraph_with(props: MarkerProps) -> Self {
        Self::TileMarker {
            labels: Labels::from_slice(&[Label::Paragraph]),
            props,
        }
    }

    /// An unlabelled marker anchoring an embedded object.
    pub fn embed(embed: Embed) -> Self {
        Self::TileMarker {
            labels: Labels::new(),
            props: MarkerProps {
                embed: Some(embed),
                ..MarkerProps::default()
            },
        }
    }

    /// Opens a region with one label.
    pub fn begin(label: Label) -> Self {
        Self::RangeBeginMarker {
            labels: Labels::from_slice(&[label]),
            props: MarkerProps::default(),
        }
    }

    /// Closes a region with one label.
    pub fn end(label: Label) -> Self {
        Self::RangeEndMarker {
            labels: Labels::from_slice(&[label]),
            props: MarkerProps::default(),
        }
    }
}

impl Segment {
    /// Number of positions this segment occupies.
    pub fn len(&self) -> usize {
        match &self.kind {
            SegmentKind::Text { content } => content.chars().count(),
            _ => 1,
        }
    }

    /// Returns `true` for an empty text segment.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The text of a text segment.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            SegmentKind::Text { content } => Some(content),
            _ => None,
        }
    }

    /// Labels of a marker, empty for text.
    pub fn labels(&self) -> &[Label] {
        match &self.kind {
            SegmentKind::Text { .. } => &[],
            SegmentKind::TileMarker { labels, .. }
            | SegmentKind::RangeBeginMarker { labels, .. }
            | SegmentKind::RangeEndMarker { labels, .. } => labels,
        }
    }

    /// Properties of a marker.
    pub fn props(&self) -> Option<&MarkerProps> {
        match &self.kind {
            SegmentKind::Text { .. } => None,
            SegmentKind::TileMarker { props, .. }
            | SegmentKind::RangeBeginMarker { props, .. }
            | SegmentKind::RangeEndMarker { props, .. } => Some(props),
        }
    }

    /// Mutable properties of a marker.
    pub fn props_mut(&mut self) -> Option<&mut MarkerProps> {
        match &mut self.kind {
            SegmentKind::Text { .. } => None,
            SegmentKind::TileMarker { props, .. }
            | SegmentKind::RangeBeginMarker { props, .. }
            | SegmentKind::RangeEndMarker { props, .. } => Some(props),
        }
    }

    /// Returns `true` for a tile marker carrying `label`.
    pub fn is_tile(&self, label: Label) -> bool {
        matches!(&self.kind, SegmentKind::TileMarker { labels, .. } if labels.contains(&label))
    }

    /// Returns `true` for a range begin marker carrying `label`.
    pub fn is_range_begin(&self, label: Label) -> bool {
        matches!(
            &self.kind,
            SegmentKind::RangeBeginMarker { labels, .. } if labels.contains(&label)
        )
    }

    /// Returns `true` for a range end marker carrying `label`.
    pub fn is_range_end(&self, label: Label) -> bool {
        matches!(&self.kind, SegmentKind::RangeEndMarker { labels, .. } if labels.contains(&label))
    }

    /// The embedded object anchored by this marker.
    pub fn embed(&self) -> Option<&Embed> {
        self.props().and_then(|props| props.embed.as_ref())
    }

    /// Returns `true` if the marker is pending concurrent removal.
    pub fn is_moribund(&self) -> bool {
        self.props().is_some_and(|props| props.moribund)
    }
}

/// Properties carried by markers.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerProps {
    /// Embedded object anchored at the marker.
    pub embed: Option<Embed>,
    /// Paragraph uses the header font.
    pub header: bool,
    /// Paragraph indent as a fraction of the line width. On a table begin
    /// marker, the left offset of the table.
    pub indent_pct: f32,
    /// Paragraph content width as a fraction of the line width. On a table
    /// begin marker, the table width.
    pub content_pct: f32,
    /// Bullet or number shown in the indent of the first line.
    pub list_symbol: Option<String>,
    /// Row or cell is pending removal and must not be laid out.
    pub moribund: bool,
    /// Table column widths as fractions of the table width.
    pub column_widths: Option<Vec<f32>>,
}

impl Default for MarkerProps {
    fn default() -> Self {
        Self {
            embed: None,
            header: false,
            indent_pct: 0.0,
            content_pct: 1.0,
            list_symbol: None,
            moribund: false,
            column_widths: None,
        }
    }
}

/// An object anchored at a marker.
#[derive(Clone, Debug, PartialEq)]
pub enum Embed {
    /// An embedded component laid out as a block or inline.
    Component {
        /// Component identity, used to look up its load task.
        id: ComponentId,
        /// How the component participates in layout.
        display: DisplayType,
    },
    /// A floating object that excludes text from a rectangle.
    Inclusion {
        /// Height over width. Square when absent.
        aspect_ratio: Option<f32>,
        /// Explicit height, overriding the aspect ratio.
        height: Option<f32>,
    },
    /// An ink overlay anchored at the marker.
    Overlay,
}

/// A partial update of [`MarkerProps`], applied by annotate operations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyPatch {
    /// New header flag.
    pub header: Option<bool>,
    /// New indent fraction.
    pub indent_pct: Option<f32>,
    /// New content fraction.
    pub content_pct: Option<f32>,
    /// New list symbol. `Some(None)` clears it.
    pub list_symbol: Option<Option<String>>,
    /// New moribund flag.
    pub moribund: Option<bool>,
    /// New column widths.
    pub column_widths: Option<Vec<f32>>,
}

impl PropertyPatch {
    /// Writes every present field into `props`.
    pub fn apply(&self, props: &mut MarkerProps) {
        if let Some(header) = self.header {
            props.header = header;
        }
        if let Some(indent_pct) = self.indent_pct {
            props.indent_pct = indent_pct;
        }
        if let Some(content_pct) = self.content_pct {
            props.content_pct = content_pct;
        }
        if let Some(list_symbol) = &self.list_symbol {
            props.list_symbol.clone_from(list_symbol);
        }
        if let Some(moribund) = self.moribund {
            props.moribund = moribund;
        }
        if let Some(column_widths) = &self.column_widths {
            props.column_widths = Some(column_widths.clone());
        }
    }
}
