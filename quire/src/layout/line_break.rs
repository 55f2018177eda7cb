// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Greedy line breaking against a viewport.

use core::ops::Range;

use crate::config::LayoutConfig;
use crate::error::Error;
use crate::geometry::Point;
use crate::itemize::{Item, ItemKind, MarkerItem, MarkerKind};
use crate::layout::viewport::{MovingInclusion, Viewport};

const WIDTH_EPSILON: f32 = 1e-3;

/// Horizontal metrics of a paragraph.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParagraphMetrics {
    /// Indent as a fraction of the zone width.
    pub indent_pct: f32,
    /// Content width as a fraction of the zone width.
    pub content_pct: f32,
    /// Width of two em in the paragraph font.
    pub two_em: f32,
    /// Zones at most this wide get the two em added to a non-zero indent.
    pub indent_width_threshold: f32,
}

impl ParagraphMetrics {
    /// Metrics of an unindented paragraph spanning the full zone.
    pub fn full_width() -> Self {
        Self {
            indent_pct: 0.0,
            content_pct: 1.0,
            two_em: 0.0,
            indent_width_threshold: 0.0,
        }
    }

    /// Indent for a zone of `zone_width`.
    pub fn indent(&self, zone_width: f32) -> f32 {
        let mut indent = (self.indent_pct * zone_width).floor();
        if self.indent_pct > 0.0 && self.indent_width_threshold >= zone_width {
            indent += self.two_em;
        }
        indent
    }

    /// Width left for content in a zone of `zone_width`.
    pub fn content_width(&self, zone_width: f32) -> f32 {
        (self.content_pct * zone_width).floor() - self.indent(zone_width)
    }
}

/// Inputs to [`BreakLines`] besides the items and the viewport.
#[derive(Copy, Clone, Debug)]
pub struct BreakOptions<'a> {
    /// Absolute position of the paragraph start, used in diagnostics.
    pub base: usize,
    /// Lines ending at or before this relative offset are laid out above the
    /// viewport: the write cursor is reset instead of advanced.
    pub start_offset: usize,
    /// Minimum line height.
    pub min_line_height: f32,
    /// Positions after the last item that belong to the last line.
    pub trailing: usize,
    /// Horizontal metrics.
    pub metrics: ParagraphMetrics,
    /// Inclusion sizing.
    pub config: &'a LayoutConfig,
    /// The inclusion being dragged, which markers must not place.
    pub moving: Option<&'a MovingInclusion>,
}

/// One line produced by [`BreakLines`]. Positions are relative to the
/// paragraph start.
#[derive(Clone, Debug, PartialEq)]
pub struct LineBreak {
    /// First position on the line.
    pub start: usize,
    /// One past the last position on the line.
    pub end: usize,
    /// Items on the line.
    pub items: Range<usize>,
    /// Line height.
    pub height: f32,
    /// Width of the zone the line was broken against.
    pub zone_width: f32,
    /// Width of the content, excluding trailing glue.
    pub advance: f32,
}

/// Result of breaking a whole paragraph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BreakOutcome {
    /// Lines in order.
    pub lines: Vec<LineBreak>,
    /// The width every line was broken against, when no exclusion or
    /// inclusion took part. Only such breaks may be reused.
    pub uniform_width: Option<f32>,
    /// Overflowing lines.
    pub diagnostics: Vec<Error>,
}

#[derive(Clone, Default)]
struct LineState {
    start_item: usize,
    start_pos: usize,
    x: f32,
    height: f32,
    has_content: bool,
}

#[derive(Clone)]
struct PrevBoundaryState {
    item_idx: usize,
    pos: usize,
    advance: f32,
    height: f32,
}

#[derive(Clone, Default)]
struct BreakerState {
    item_idx: usize,
    pos: usize,
    line: LineState,
    prev_boundary: Option<PrevBoundaryState>,
}

impl BreakerState {
    fn append_item(&mut self, item: &Item) {
        self.line.x += item.width;
        self.line.height = self.line.height.max(item.height);
        if !matches!(item.kind, ItemKind::Marker(_)) || item.is_inline_box() {
            self.line.has_content = true;
        }
        self.item_idx += 1;
        self.pos += item.len;
    }

    /// Store the current iteration state so that we can revert to it if we
    /// later want to take the line breaking opportunity at this point.
    fn mark_line_break_opportunity(&mut self, advance: f32) {
        self.prev_boundary = Some(PrevBoundaryState {
            item_idx: self.item_idx,
            pos: self.pos,
            advance,
            height: self.line.height,
        });
    }
}

struct FilledLine {
    end_item: usize,
    end_pos: usize,
    advance: f32,
    height: f32,
}

/// Line breaking support for a paragraph.
///
/// Breaking is first fit: items are added to a line until the next text run
/// does not fit, then the line is broken after the last glue. Glue hangs at
/// the end of a line and is never the reason for a break. A run that does not
/// fit on an empty line overflows it, and a run without glue is split
/// between its items. Inclusion markers place their exclusion on the viewport
/// as they are met, which can narrow the line they are on.
///
/// The viewport's write cursor is restored when breaking finishes; only
/// exclusions persist.
pub struct BreakLines<'a> {
    items: &'a [Item],
    viewport: &'a mut Viewport,
    options: BreakOptions<'a>,
    state: BreakerState,
    outcome: BreakOutcome,
    uniform: bool,
    saved: (f32, f32),
    done: bool,
}

impl core::fmt::Debug for BreakLines<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BreakLines")
            .field("items", &self.items.len())
            .field("item_idx", &self.state.item_idx)
            .field("lines", &self.outcome.lines.len())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<'a> BreakLines<'a> {
    /// Prepares to break `items` into lines written into `viewport`.
    pub fn new(items: &'a [Item], viewport: &'a mut Viewport, options: BreakOptions<'a>) -> Self {
        let saved = (viewport.line_top(), viewport.line_x());
        Self {
            items,
            viewport,
            options,
            state: BreakerState::default(),
            outcome: BreakOutcome::default(),
            uniform: true,
            saved,
            done: false,
        }
    }

    /// Computes the next line.
    pub fn break_next(&mut self) -> Option<&LineBreak> {
        if self.done {
            return None;
        }
        let zone_start = self.viewport.line_x();
        let mut probe = self.options.min_line_height;
        let snapshot = self.state.clone();
        let mut filled = self.fill_line(zone_start, probe);
        // A taller line may reach an exclusion the default height missed.
        if filled.0.height > probe {
            probe = filled.0.height;
            self.state = snapshot;
            filled = self.fill_line(zone_start, probe);
        }
        let (line, zone_width, eol) = filled;

        let last = line.end_item >= self.items.len();
        let end = if last {
            line.end_pos + self.options.trailing
        } else {
            line.end_pos
        };
        let content_width = self.options.metrics.content_width(zone_width);
        if line.advance > content_width + WIDTH_EPSILON {
            let err = Error::layout_inconsistency(
                self.options.base + self.state.line.start_pos,
                line.advance,
                content_width,
            );
            tracing::warn!("{err}");
            self.outcome.diagnostics.push(err);
        }
        let start = self.state.line.start_pos;
        if end <= self.options.start_offset && self.options.start_offset > 0 {
            self.viewport.reset_top();
        } else {
            self.viewport.commit_line(line.height, eol);
        }
        self.outcome.lines.push(LineBreak {
            start,
            end,
            items: self.state.line.start_item..line.end_item,
            height: line.height,
            zone_width,
            advance: line.advance,
        });

        self.state.item_idx = line.end_item;
        self.state.pos = line.end_pos;
        self.state.line = LineState {
            start_item: line.end_item,
            start_pos: line.end_pos,
            ..LineState::default()
        };
        self.state.prev_boundary = None;
        if last {
            self.done = true;
            self.viewport.end_of_paragraph(line.height);
        }
        self.outcome.lines.last()
    }

    /// Breaks all remaining lines.
    pub fn break_all(mut self) -> BreakOutcome {
        while self.break_next().is_some() {}
        self.finish()
    }

    fn finish(mut self) -> BreakOutcome {
        self.viewport.restore(self.saved.0, self.saved.1);
        if self.uniform {
            self.outcome.uniform_width = self.outcome.lines.first().map(|line| line.zone_width);
        }
        self.outcome
    }

    /// Fills one line starting at the current item. Returns the line, the
    /// zone width and whether the zone ends the visual line.
    fn fill_line(&mut self, zone_start: f32, probe: f32) -> (FilledLine, f32, bool) {
        self.viewport.restore(self.viewport.line_top(), zone_start);
        let mut rect = self.viewport.line_rect(probe);
        if rect.exclusion.is_some() {
            self.uniform = false;
        }
        let mut width = self.options.metrics.content_width(rect.width);
        let indent = self.options.metrics.indent(rect.width);
        self.state.line.height = probe;

        while let Some(item) = self.items.get(self.state.item_idx) {
            match &item.kind {
                ItemKind::Glue => {
                    let advance = self.state.line.x;
                    self.state.append_item(item);
                    self.state.mark_line_break_opportunity(advance);
                }
                ItemKind::Marker(MarkerItem {
                    segment,
                    kind: MarkerKind::Inclusion {
                        aspect_ratio,
                        height,
                    },
                }) => {
                    let anchor = Point::new(rect.x + indent + self.state.line.x, rect.y);
                    let placed = self.viewport.add_inclusion(
                        *segment,
                        *aspect_ratio,
                        *height,
                        anchor,
                        self.state.line.height,
                        self.options.config,
                        self.options.moving,
                    );
                    self.state.append_item(item);
                    if placed.is_some() {
                        self.uniform = false;
                        // The new exclusion may narrow this very line.
                        self.viewport.restore(rect.y, zone_start);
                        rect = self.viewport.line_rect(self.state.line.height);
                        width = self.options.metrics.content_width(rect.width);
                    }
                }
                ItemKind::Marker(_) if !item.is_inline_box() => self.state.append_item(item),
                _ => {
                    let inline_box = item.is_inline_box();
                    if inline_box && self.state.line.has_content {
                        self.state.mark_line_break_opportunity(self.state.line.x);
                    }
                    if self.state.line.x + item.width <= width + WIDTH_EPSILON {
                        self.state.append_item(item);
                    } else if let Some(boundary) = self
                        .state
                        .prev_boundary
                        .clone()
                        .filter(|b| b.item_idx > self.state.line.start_item)
                    {
                        return (
                            FilledLine {
                                end_item: boundary.item_idx,
                                end_pos: boundary.pos,
                                advance: boundary.advance,
                                height: boundary.height,
                            },
                            rect.width,
                            rect.eol,
                        );
                    } else if !self.state.line.has_content {
                        // Nothing else is on the line, so overflow it.
                        self.state.append_item(item);
                        return (self.filled(), rect.width, rect.eol);
                    } else {
                        // The run alone is too wide: split it before this item.
                        return (self.filled(), rect.width, rect.eol);
                    }
                    if inline_box {
                        self.state.mark_line_break_opportunity(self.state.line.x);
                    }
                }
            }
        }
        (self.filled(), rect.width, rect.eol)
    }

    fn filled(&self) -> FilledLine {
        let trailing_glue: f32 = self.items[self.state.line.start_item..self.state.item_idx]
            .iter()
            .rev()
            .take_while(|item| item.is_glue())
            .map(|item| item.width)
            .sum();
        FilledLine {
            end_item: self.state.item_idx,
            end_pos: self.state.pos,
            advance: self.state.line.x - trailing_glue,
            height: self.state.line.height,
        }
    }
}
