// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vertical write cursor and floating exclusions.

use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect};
use crate::inputs::ClientId;
use crate::segment::SegmentId;

/// A rectangle that text flows around.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ExclusionRect {
    /// The marker anchoring the floating object.
    pub id: SegmentId,
    /// Occupied area in viewport coordinates.
    pub rect: Rect,
    /// The rectangle touches the left edge; text flows on its right.
    pub float_left: bool,
    /// The first line laid out against this rectangle reports where the
    /// object should anchor.
    pub requires_settle: bool,
}

/// An inclusion being dragged by a collaborator.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MovingInclusion {
    /// The dragging client.
    pub client: ClientId,
    /// The marker anchoring the dragged object.
    pub marker: SegmentId,
    /// Where the object was when the drag started.
    pub origin: Rect,
    /// Horizontal drag offset.
    pub dx: f32,
    /// Vertical drag offset.
    pub dy: f32,
    /// The drag is still in progress.
    pub on_the_move: bool,
}

/// The zone available to the next line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineRect {
    /// Left edge of the zone.
    pub x: f32,
    /// Top of the line.
    pub y: f32,
    /// Width of the zone.
    pub width: f32,
    /// Height the zone was probed with.
    pub height: f32,
    /// No further zone follows on this line.
    pub eol: bool,
    /// The exclusion that shaped the zone.
    pub exclusion: Option<SegmentId>,
    /// The exclusion waiting to settle against this line.
    pub settle: Option<SegmentId>,
}

/// A bounded region that lines are written into, top to bottom.
///
/// The write cursor is `(line_top, line_x)`. A line may be split into zones
/// by an exclusion; `line_x` is where the next zone on the same line starts
/// and is zero when the next call starts a fresh line.
///
/// Only one exclusion shapes a given zone. Exclusions are ordered by `x`, so
/// it is the one nearest to the write cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    width: f32,
    max_height: f32,
    line_top: f32,
    line_x: f32,
    exclusions: Vec<ExclusionRect>,
}

impl Viewport {
    /// Creates an empty viewport.
    pub fn new(width: f32, max_height: f32) -> Self {
        Self {
            width,
            max_height,
            line_top: 0.0,
            line_x: 0.0,
            exclusions: Vec::new(),
        }
    }

    /// Width of the viewport.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Height of the viewport.
    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    /// Top of the next line.
    pub fn line_top(&self) -> f32 {
        self.line_top
    }

    /// Start of the next zone on the current line.
    pub fn line_x(&self) -> f32 {
        self.line_x
    }

    /// Height left below the write cursor.
    pub fn remaining_height(&self) -> f32 {
        self.max_height - self.line_top
    }

    /// Registered exclusions, ordered by `x`.
    pub fn exclusions(&self) -> &[ExclusionRect] {
        &self.exclusions
    }

    /// Returns `true` if an exclusion reaches below `top`.
    pub fn has_exclusions_below(&self, top: f32) -> bool {
        self.exclusions.iter().any(|ex| ex.rect.bottom() > top)
    }

    pub(crate) fn restore(&mut self, line_top: f32, line_x: f32) {
        self.line_top = line_top;
        self.line_x = line_x;
    }

    /// Computes the zone for the next line of `height` and advances `line_x`
    /// past it.
    pub fn line_rect(&mut self, height: f32) -> LineRect {
        let top = self.line_top;
        // Each round either returns or moves `line_x` right past an
        // exclusion, so there are at most `len + 1` rounds.
        for _ in 0..=self.exclusions.len() {
            let x = self.line_x;
            let mut hits = self
                .exclusions
                .iter()
                .filter(|ex| ex.rect.x >= x && ex.rect.intersects_band(top, height));
            let Some(hit) = hits.next().copied() else {
                self.line_x = 0.0;
                return LineRect {
                    x,
                    y: top,
                    width: self.width - x,
                    height,
                    eol: true,
                    exclusion: None,
                    settle: None,
                };
            };
            let ignored = hits.count();
            if ignored > 0 {
                tracing::debug!(
                    "line at {top}: ignoring {ignored} more exclusion(s), {:?} shapes the zone",
                    hit.id
                );
            }
            let settle = hit.requires_settle.then_some(hit.id);
            if x == 0.0 && hit.rect.x <= 0.0 {
                let start = hit.rect.right();
                self.line_x = 0.0;
                return LineRect {
                    x: start,
                    y: top,
                    width: (self.width - start).max(0.0),
                    height,
                    eol: true,
                    exclusion: Some(hit.id),
                    settle,
                };
            }
            let width = hit.rect.x - x;
            self.line_x = hit.rect.right();
            let eol = self.line_x >= self.width;
            if eol {
                self.line_x = 0.0;
            }
            if width > 0.0 || eol {
                return LineRect {
                    x,
                    y: top,
                    width: width.max(0.0),
                    height,
                    eol,
                    exclusion: Some(hit.id),
                    settle,
                };
            }
        }
        let x = self.line_x;
        self.line_x = 0.0;
        LineRect {
            x,
            y: top,
            width: (self.width - x).max(0.0),
            height,
            eol: true,
            exclusion: None,
            settle: None,
        }
    }

    /// Registers an exclusion, replacing any previous one with the same id.
    /// Empty rectangles are ignored.
    pub fn add_exclusion(&mut self, exclusion: ExclusionRect) {
        self.exclusions.retain(|ex| ex.id != exclusion.id);
        if exclusion.rect.width <= 0.0 || exclusion.rect.height <= 0.0 {
            return;
        }
        let index = self
            .exclusions
            .partition_point(|ex| ex.rect.x <= exclusion.rect.x);
        self.exclusions.insert(index, exclusion);
    }

    /// Places the floating object of `marker`, met at `anchor` on a line of
    /// `line_height`, and registers its exclusion.
    ///
    /// The object is a third of the viewport wide and sits below the line it
    /// was met on. Objects that would cross the right edge are flipped to the
    /// left of the anchor; objects close to the left edge snap to it. The
    /// marker being dragged is skipped here; see [`Viewport::place_moving`].
    pub fn add_inclusion(
        &mut self,
        marker: SegmentId,
        aspect_ratio: Option<f32>,
        height: Option<f32>,
        anchor: Point,
        line_height: f32,
        config: &LayoutConfig,
        moving: Option<&MovingInclusion>,
    ) -> Option<ExclusionRect> {
        if moving.is_some_and(|m| m.marker == marker) {
            return None;
        }
        let min_x = (self.width * config.inclusion_min_x_fraction).floor();
        let w = (self.width * config.inclusion_width_fraction).floor();
        let h = height.unwrap_or_else(|| aspect_ratio.map_or(w, |ratio| (w * ratio).floor()));
        let mut x = anchor.x;
        if x + w > self.width {
            x -= w;
        }
        x = x.floor();
        if x < min_x {
            x = 0.0;
        }
        let y = (anchor.y + line_height).floor();
        let exclusion = ExclusionRect {
            id: marker,
            rect: Rect::new(x, y, w, h),
            float_left: x == 0.0,
            requires_settle: false,
        };
        self.add_exclusion(exclusion);
        Some(exclusion)
    }

    /// Registers the exclusion of a dragged object at its dragged position.
    pub fn place_moving(
        &mut self,
        moving: &MovingInclusion,
        config: &LayoutConfig,
    ) -> ExclusionRect {
        let min_x = (self.width * config.inclusion_min_x_fraction).floor();
        let mut x = (moving.origin.x + moving.dx).floor();
        if x + moving.origin.width > self.width {
            x = self.width - moving.origin.width;
        }
        if x < min_x {
            x = 0.0;
        }
        let y = (moving.origin.y + moving.dy).floor().max(0.0);
        let exclusion = ExclusionRect {
            id: moving.marker,
            rect: Rect::new(x, y, moving.origin.width, moving.origin.height),
            float_left: x == 0.0,
            requires_settle: true,
        };
        self.add_exclusion(exclusion);
        exclusion
    }

    /// Clears the settle request of `id`.
    pub fn mark_settled(&mut self, id: SegmentId) {
        for ex in &mut self.exclusions {
            if ex.id == id {
                ex.requires_settle = false;
            }
        }
    }

    /// Moves the write cursor down by `height`.
    pub fn vskip(&mut self, height: f32) {
        self.line_top += height;
    }

    /// Finishes a zone of `height`. The cursor moves down only at the end of
    /// a line.
    pub fn commit_line(&mut self, height: f32, eol: bool) {
        if eol {
            self.line_top += height;
        }
    }

    /// Finishes a paragraph whose last line was `height` tall and may have
    /// stopped short of the line end.
    pub fn end_of_paragraph(&mut self, height: f32) {
        if self.line_x != 0.0 {
            self.line_x = 0.0;
            self.line_top += height;
        }
    }

    /// Moves the write cursor back to the top left.
    pub fn reset_top(&mut self) {
        self.line_top = 0.0;
        self.line_x = 0.0;
    }
}
