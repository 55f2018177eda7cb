// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::geometry::{Rect, Size};

/// Identity of an embedded component.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(pub u64);

/// How an embedded component participates in layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayType {
    /// Occupies its own band across the full width.
    Block,
    /// Flows with text as an atomic item.
    Inline,
}

/// Optional behaviour a component may support.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Capability {
    /// Reports its own height through [`EmbeddedComponent::height_in_lines`].
    Layout,
    /// Paints itself through [`EmbeddedComponent::render`].
    Render,
    /// Accepts keyboard focus.
    Focus,
}

/// A loaded embedded component.
pub trait EmbeddedComponent {
    /// Whether the component supports `capability`.
    fn query(&self, capability: Capability) -> bool;

    /// Height of a block component in default lines, when known.
    fn height_in_lines(&self) -> Option<f32>;

    /// Size of the component when displayed inline.
    fn inline_size(&self) -> Size;

    /// Paints the component into `surface`.
    fn render(&self, surface: Rect, display: DisplayType);
}

/// Why a component failed to load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentError {
    /// Human-readable cause.
    pub message: String,
}

impl ComponentError {
    /// Creates an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl core::fmt::Display for ComponentError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for ComponentError {}
