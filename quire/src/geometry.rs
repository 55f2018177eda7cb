// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal geometry used by layout and hit-testing.

/// A point in viewport coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    /// Horizontal offset from the left edge of the viewport.
    pub x: f32,
    /// Vertical offset from the top edge of the viewport.
    pub y: f32,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A width and a height.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Size {
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Size {
    /// Creates a new size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Rect {
    /// Creates a new rectangle from its origin and size.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Returns `true` if the half-open vertical band `[top, top + height)`
    /// overlaps this rectangle.
    pub fn intersects_band(&self, top: f32, height: f32) -> bool {
        self.y < top + height && self.bottom() > top
    }

    /// Returns `true` if the point lies inside the rectangle. The right and
    /// bottom edges are exclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Squared Euclidean distance from `point` to the nearest point of the
    /// rectangle. Zero when the point is inside.
    pub fn distance_squared(&self, point: Point) -> f32 {
        let dx = if point.x < self.x {
            self.x - point.x
        } else if point.x > self.right() {
            point.x - self.right()
        } else {
            0.0
        };
        let dy = if point.y < self.y {
            self.y - point.y
        } else if point.y > self.bottom() {
            point.y - self.bottom()
        } else {
            0.0
        };
        dx * dx + dy * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_intersection_is_half_open() {
        let r = Rect::new(0.0, 20.0, 50.0, 40.0);
        assert!(!r.intersects_band(0.0, 20.0), "band ending at the top edge");
        assert!(r.intersects_band(0.0, 21.0), "band overlapping the top edge");
        assert!(!r.intersects_band(60.0, 20.0), "band starting at the bottom edge");
    }

    #[test]
    fn distance_is_zero_inside() {
        let r = Rect::new(10.0, 10.0, 10.0, 10.0);
        assert_eq!(r.distance_squared(Point::new(15.0, 15.0)), 0.0, "inside");
        assert_eq!(r.distance_squared(Point::new(23.0, 24.0)), 25.0, "corner");
    }
}
