// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning a paragraph's segments into sized layout items.

use core::ops::Range;

use smallvec::SmallVec;

use crate::components::{ComponentTask, ComponentTasks};
use crate::config::LayoutConfig;
use crate::inputs::{ComponentId, Font, MathTypesetter, TextMeasure};
use crate::segment::{Embed, Label, Segment, SegmentId, SegmentKind};

/// A slice of one segment that belongs to a paragraph.
#[derive(Clone, Debug)]
pub struct ParagraphPiece<'a> {
    /// The segment.
    pub segment: &'a Segment,
    /// Offsets inside the segment covered by the paragraph.
    pub range: Range<usize>,
}

impl<'a> ParagraphPiece<'a> {
    /// A piece covering the whole segment.
    pub fn whole(segment: &'a Segment) -> Self {
        Self {
            range: 0..segment.len(),
            segment,
        }
    }
}

/// A sized layout item. Positions are relative to the paragraph start.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    /// First position covered.
    pub start: usize,
    /// Number of positions covered.
    pub len: usize,
    /// Advance width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// What the item is.
    pub kind: ItemKind,
}

/// What an [`Item`] is.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemKind {
    /// A run of text without break opportunities.
    Text(String),
    /// A typeset math region, including its delimiting markers.
    Math {
        /// Buffered math source.
        source: String,
    },
    /// One whitespace character. Lines may break after it.
    Glue,
    /// An atomic marker.
    Marker(MarkerItem),
}

/// An atomic marker item.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerItem {
    /// The marker segment.
    pub segment: SegmentId,
    /// What the marker anchors.
    pub kind: MarkerKind,
}

/// What a [`MarkerItem`] anchors.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkerKind {
    /// Nothing visible.
    Plain,
    /// A floating inclusion that registers an exclusion when laid out.
    Inclusion {
        /// Height over width.
        aspect_ratio: Option<f32>,
        /// Explicit height.
        height: Option<f32>,
    },
    /// An inline component.
    Component {
        /// The component.
        id: ComponentId,
        /// Load state at itemization time.
        state: ComponentState,
    },
    /// An ink overlay anchor.
    Overlay,
}

/// Load state of an inline component when it was itemized.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ComponentState {
    /// Not loaded yet; sized as a placeholder.
    Pending,
    /// Loaded and sized by the component.
    Ready,
    /// Failed to load; sized as a placeholder.
    Failed,
}

impl Item {
    /// One past the last position covered.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Returns `true` for glue.
    pub fn is_glue(&self) -> bool {
        matches!(self.kind, ItemKind::Glue)
    }

    /// Returns `true` for text and math runs.
    pub fn is_block(&self) -> bool {
        matches!(self.kind, ItemKind::Text(_) | ItemKind::Math { .. })
    }

    /// Returns `true` for atomic items with their own break opportunities.
    pub fn is_inline_box(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Marker(MarkerItem {
                kind: MarkerKind::Component { .. },
                ..
            })
        )
    }
}

/// The items of one paragraph, excluding its tile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParagraphItems {
    /// Items in position order.
    pub items: Vec<Item>,
    /// Positions covered by the items.
    pub len: usize,
    /// Inline components referenced by the paragraph.
    pub components: SmallVec<[ComponentId; 2]>,
}

struct MathBuffer {
    start: usize,
    source: String,
}

/// Itemizes the segments of one paragraph.
///
/// The paragraph tile itself must not be part of `pieces`. Consecutive
/// non-whitespace characters form one text item even across segment
/// boundaries. Each whitespace character becomes glue. Text between a math
/// begin and end marker is buffered and typeset as a single item.
pub fn itemize_paragraph(
    pieces: &[ParagraphPiece<'_>],
    font: &Font,
    measure: &dyn TextMeasure,
    typesetter: &dyn MathTypesetter,
    components: &ComponentTasks,
    config: &LayoutConfig,
) -> ParagraphItems {
    let text_height = measure.line_height(font);
    let glue_width = measure.measure(" ", font);
    let mut out = ParagraphItems::default();
    let mut pos = 0;
    let mut math: Option<MathBuffer> = None;

    for piece in pieces {
        let segment = piece.segment;
        match &segment.kind {
            SegmentKind::Text { content } => {
                let chars = content
                    .chars()
                    .skip(piece.range.start)
                    .take(piece.range.len());
                if let Some(buffer) = math.as_mut() {
                    buffer.source.extend(chars);
                    pos += piece.range.len();
                    continue;
                }
                for ch in chars {
                    if ch.is_whitespace() {
                        out.items.push(Item {
                            start: pos,
                            len: 1,
                            width: glue_width,
                            height: text_height,
                            kind: ItemKind::Glue,
                        });
                    } else if let Some(Item {
                        kind: ItemKind::Text(run),
                        len,
                        ..
                    }) = out.items.last_mut()
                    {
                        run.push(ch);
                        *len += 1;
                    } else {
                        out.items.push(Item {
                            start: pos,
                            len: 1,
                            width: 0.0,
                            height: text_height,
                            kind: ItemKind::Text(ch.to_string()),
                        });
                    }
                    pos += 1;
                }
            }
            SegmentKind::RangeBeginMarker { .. } if segment.labels().contains(&Label::Math) => {
                if math.is_none() {
                    math = Some(MathBuffer {
                        start: pos,
                        source: String::new(),
                    });
                }
                pos += 1;
            }
            SegmentKind::RangeEndMarker { .. } if segment.labels().contains(&Label::Math) => {
                pos += 1;
                if let Some(buffer) = math.take() {
                    out.items.push(typeset(buffer, pos, font, typesetter, text_height));
                } else {
                    out.items.push(marker_item(
                        segment.id,
                        MarkerKind::Plain,
                        pos - 1,
                        0.0,
                        0.0,
                    ));
                }
            }
            _ if math.is_some() => pos += 1,
            _ => {
                let item = match segment.embed() {
                    Some(Embed::Inclusion {
                        aspect_ratio,
                        height,
                    }) => marker_item(
                        segment.id,
                        MarkerKind::Inclusion {
                            aspect_ratio: *aspect_ratio,
                            height: *height,
                        },
                        pos,
                        0.0,
                        0.0,
                    ),
                    Some(Embed::Component { id, .. }) => {
                        out.components.push(*id);
                        let (state, width, height) = match components.get(*id) {
                            Some(ComponentTask::Ready(component)) => {
                                let size = component.inline_size();
                                (ComponentState::Ready, size.width, size.height)
                            }
                            Some(ComponentTask::Failed(_)) => (
                                ComponentState::Failed,
                                config.pending_component_height,
                                config.pending_component_height,
                            ),
                            Some(ComponentTask::Pending) | None => (
                                ComponentState::Pending,
                                config.pending_component_height,
                                config.pending_component_height,
                            ),
                        };
                        marker_item(
                            segment.id,
                            MarkerKind::Component { id: *id, state },
                            pos,
                            width,
                            height,
                        )
                    }
                    Some(Embed::Overlay) => {
                        marker_item(segment.id, MarkerKind::Overlay, pos, 0.0, 0.0)
                    }
                    None => marker_item(segment.id, MarkerKind::Plain, pos, 0.0, 0.0),
                };
                out.items.push(item);
                pos += 1;
            }
        }
    }

    // An unterminated math region still lays out as one box.
    if let Some(buffer) = math.take() {
        out.items.push(typeset(buffer, pos, font, typesetter, text_height));
    }

    for item in &mut out.items {
        if let ItemKind::Text(run) = &item.kind {
            item.width = measure.measure(run, font);
        }
    }
    out.len = pos;
    out
}

fn typeset(
    buffer: MathBuffer,
    end: usize,
    font: &Font,
    typesetter: &dyn MathTypesetter,
    text_height: f32,
) -> Item {
    let size = typesetter.typeset(&buffer.source, font);
    Item {
        start: buffer.start,
        len: end - buffer.start,
        width: size.width,
        height: size.height.max(text_height),
        kind: ItemKind::Math {
            source: buffer.source,
        },
    }
}

fn marker_item(segment: SegmentId, kind: MarkerKind, pos: usize, width: f32, height: f32) -> Item {
    Item {
        start: pos,
        len: 1,
        width,
        height,
        kind: ItemKind::Marker(MarkerItem { segment, kind }),
    }
}
