// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping between sequence positions and viewport coordinates.

use crate::geometry::Point;
use crate::inputs::TextMeasure;
use crate::outputs::{CellBox, FragmentKind, LineBox, LineKind};

/// Where a caret for a position is drawn.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Caret {
    /// Left edge in viewport coordinates.
    pub x: f32,
    /// Top edge in viewport coordinates.
    pub y: f32,
    /// Height of the line.
    pub height: f32,
    /// Horizontal offset from the line box origin.
    pub offset: f32,
    /// First position of the line.
    pub line_start: usize,
}

impl Caret {
    /// Top-left corner of the caret.
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Hit-testing over the lines of a render pass.
pub struct PositionMapper<'a> {
    lines: &'a [LineBox],
    measure: &'a dyn TextMeasure,
}

impl core::fmt::Debug for PositionMapper<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PositionMapper")
            .field("lines", &self.lines.len())
            .finish_non_exhaustive()
    }
}

impl<'a> PositionMapper<'a> {
    /// Creates a mapper over `lines`, measuring text with `measure`.
    pub fn new(lines: &'a [LineBox], measure: &'a dyn TextMeasure) -> Self {
        Self { lines, measure }
    }

    /// The innermost line containing `pos`, descending into table cells.
    pub fn line_for_position(&self, pos: usize) -> Option<&'a LineBox> {
        find_line(self.lines, pos)
    }

    /// Where the caret for `pos` is drawn.
    pub fn position_to_pixel(&self, pos: usize) -> Option<Caret> {
        let line = self.line_for_position(pos)?;
        let offset = line.indent_width + self.prefix_width(line, pos);
        Some(Caret {
            x: line.x + offset,
            y: line.y,
            height: line.height,
            offset,
            line_start: line.start,
        })
    }

    /// The position under `point`, or the nearest one.
    ///
    /// The line is the one whose band contains `point.y`; between lines the
    /// nearer of the lines above and below wins. Points in the indent or on
    /// an empty line map to the line start; points past the content map to
    /// the last position of the line.
    pub fn pixel_to_position(&self, point: Point) -> Option<usize> {
        self.hit(self.lines, point)
    }

    fn hit(&self, lines: &[LineBox], point: Point) -> Option<usize> {
        let line = &lines[choose_line(lines, point)?];
        match &line.kind {
            LineKind::Row(row) => {
                let cell = row.cells.iter().min_by(|a, b| {
                    cell_distance(a, point.x).total_cmp(&cell_distance(b, point.x))
                })?;
                if cell.lines.is_empty() {
                    return Some((cell.start + 1).min(cell.end.saturating_sub(1)));
                }
                self.hit(&cell.lines, point)
            }
            LineKind::Block { .. } => Some(line.start),
            LineKind::Text { fragments } => {
                let content_x = line.x + line.indent_width;
                if fragments.is_empty() || point.x < content_x {
                    return Some(line.start);
                }
                let rel = point.x - content_x;
                for fragment in fragments {
                    if rel >= fragment.x + fragment.width {
                        continue;
                    }
                    if let FragmentKind::Text(run) = &fragment.kind {
                        let mut prefix = String::with_capacity(run.len());
                        for (index, ch) in run.chars().enumerate() {
                            prefix.push(ch);
                            if rel < fragment.x + self.measure.measure(&prefix, &line.font) {
                                return Some(fragment.start + index);
                            }
                        }
                    }
                    return Some(fragment.start);
                }
                Some(line.end.saturating_sub(1).max(line.start))
            }
        }
    }

    fn prefix_width(&self, line: &LineBox, pos: usize) -> f32 {
        let LineKind::Text { fragments } = &line.kind else {
            return 0.0;
        };
        for fragment in fragments {
            if pos < fragment.start {
                return fragment.x;
            }
            if pos >= fragment.end {
                continue;
            }
            return match &fragment.kind {
                FragmentKind::Text(run) => {
                    let prefix: String = run.chars().take(pos - fragment.start).collect();
                    fragment.x + self.measure.measure(&prefix, &line.font)
                }
                _ if pos > fragment.start => fragment.x + fragment.width,
                _ => fragment.x,
            };
        }
        fragments
            .last()
            .map_or(0.0, |fragment| fragment.x + fragment.width)
    }
}

fn find_line(lines: &[LineBox], pos: usize) -> Option<&LineBox> {
    let line = lines.iter().find(|line| line.contains(pos))?;
    match &line.kind {
        LineKind::Row(row) => row
            .cells
            .iter()
            .filter(|cell| cell.start <= pos && pos < cell.end)
            .find_map(|cell| find_line(&cell.lines, pos)),
        _ => Some(line),
    }
}

fn cell_distance(cell: &CellBox, x: f32) -> f32 {
    if x < cell.x {
        cell.x - x
    } else if x >= cell.x + cell.width {
        x - (cell.x + cell.width)
    } else {
        0.0
    }
}

/// Index of the last line whose bottom is at or above `y`.
pub fn closest_north(lines: &[LineBox], y: f32) -> Option<usize> {
    lines.partition_point(|line| line.bottom() <= y).checked_sub(1)
}

/// Index of the first line whose bottom is below `y`.
pub fn closest_south(lines: &[LineBox], y: f32) -> Option<usize> {
    let index = lines.partition_point(|line| line.bottom() <= y);
    (index < lines.len()).then_some(index)
}

fn choose_line(lines: &[LineBox], point: Point) -> Option<usize> {
    let north = closest_north(lines, point.y);
    let south = closest_south(lines, point.y);
    match (north, south) {
        (_, Some(south)) if lines[south].y <= point.y => {
            // Zones split by an exclusion share a band; prefer the one under x.
            let mut best = south;
            let mut best_distance = lines[south].rect().distance_squared(point);
            for (index, line) in lines.iter().enumerate().skip(south + 1) {
                if line.y > point.y {
                    break;
                }
                let distance = line.rect().distance_squared(point);
                if line.bottom() > point.y && distance < best_distance {
                    best = index;
                    best_distance = distance;
                }
            }
            Some(best)
        }
        (Some(north), Some(south)) => {
            let north_distance = lines[north].rect().distance_squared(point);
            let south_distance = lines[south].rect().distance_squared(point);
            Some(if north_distance < south_distance {
                north
            } else {
                south
            })
        }
        (north, south) => south.or(north),
    }
}
