// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::geometry::Size;

/// A font selection, opaque to the engine apart from its size.
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    /// Family name.
    pub family: String,
    /// Size in pixels.
    pub size: f32,
}

impl Font {
    /// Creates a font selection.
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

/// Text measurement, provided by the host.
pub trait TextMeasure {
    /// Advance width of `text`.
    fn measure(&self, text: &str, font: &Font) -> f32;

    /// Height of one line.
    fn line_height(&self, font: &Font) -> f32;
}

/// Math typesetting, provided by the host.
pub trait MathTypesetter {
    /// Size of the typeset box for `source`.
    fn typeset(&self, source: &str, font: &Font) -> Size;
}

/// Fixed-advance measurement: every `char` is `advance` wide.
///
/// Also typesets math as if it were plain text.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MonospaceMeasure {
    /// Width of every character.
    pub advance: f32,
    /// Height of every line.
    pub line_height: f32,
}

impl MonospaceMeasure {
    /// Creates a measurement with the given advance and line height.
    pub const fn new(advance: f32, line_height: f32) -> Self {
        Self {
            advance,
            line_height,
        }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str, _font: &Font) -> f32 {
        text.chars().count() as f32 * self.advance
    }

    fn line_height(&self, _font: &Font) -> f32 {
        self.line_height
    }
}

impl MathTypesetter for MonospaceMeasure {
    fn typeset(&self, source: &str, font: &Font) -> Size {
        Size::new(self.measure(source, font), self.line_height)
    }
}
