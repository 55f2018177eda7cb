// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-engine layout configuration.

use crate::inputs::Font;

/// Font size used by [`LayoutConfig::default`].
pub const DEFAULT_FONT_SIZE: f32 = 18.0;

/// Vertical metrics and sizing rules for one document view.
///
/// A configuration is owned by a [`FlowEngine`](crate::FlowEngine) and passed
/// down to every layout step explicitly. Use [`LayoutConfig::from_font_size`]
/// to derive the spacing from a body font size, then adjust individual fields.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Font for body paragraphs.
    pub font: Font,
    /// Font for header paragraphs.
    pub header_font: Font,
    /// Minimum height of a line and the stop threshold for a render pass.
    pub default_line_height: f32,
    /// Line height of header paragraphs.
    pub header_line_height: f32,
    /// Vertical space after each paragraph.
    pub pg_vspace: f32,
    /// Vertical space after the content of a table cell.
    pub cell_vspace: f32,
    /// Vertical space before the content of a table cell.
    pub cell_top_margin: f32,
    /// Horizontal margin on each side of a table cell.
    pub cell_h_margin: f32,
    /// Vertical space after a table.
    pub table_vspace: f32,
    /// Lines at most this wide get an extra two-em indent on indented
    /// paragraphs.
    pub indent_width_threshold: f32,
    /// Width of a floating inclusion as a fraction of the viewport width.
    pub inclusion_width_fraction: f32,
    /// Inclusions placed left of this fraction of the viewport width snap to
    /// the left edge.
    pub inclusion_min_x_fraction: f32,
    /// Height of the placeholder shown while a component is loading.
    pub pending_component_height: f32,
    /// Height reserved for a block component that does not report its height.
    pub block_component_fallback_height: f32,
    /// Token spliced into a math buffer at the cursor position.
    pub cursor_token: String,
}

impl LayoutConfig {
    /// Derives all spacing from a body font size.
    pub fn from_font_size(size: f32) -> Self {
        let default_line_height = (size * 1.2).round();
        let pg_vspace = (size * 0.5).round();
        Self {
            font: Font::new("Times", size),
            header_font: Font::new("Times", size + 4.0),
            default_line_height,
            header_line_height: 32.0_f32.max(((size + 4.0) * 1.2).round()),
            pg_vspace,
            cell_vspace: 3.0,
            cell_top_margin: 3.0,
            cell_h_margin: 3.0,
            table_vspace: pg_vspace,
            indent_width_threshold: 600.0,
            inclusion_width_fraction: 1.0 / 3.0,
            inclusion_min_x_fraction: 1.0 / 5.0,
            pending_component_height: 10.0,
            block_component_fallback_height: 520.0,
            cursor_token: String::from("\\cursor"),
        }
    }

    /// Line height for a paragraph.
    pub fn line_height(&self, header: bool) -> f32 {
        if header {
            self.header_line_height
        } else {
            self.default_line_height
        }
    }

    /// Font for a paragraph.
    pub fn paragraph_font(&self, header: bool) -> &Font {
        if header {
            &self.header_font
        } else {
            &self.font
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::from_font_size(DEFAULT_FONT_SIZE)
    }
}
