// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use quire::inputs::{ComponentId, DisplayType, MonospaceMeasure};
use quire::{Embed, FlowEngine, Label, Labels, LayoutConfig, MarkerProps, SegmentKind, Size};
use quire_sequence::SharedSequence;
use tracing_subscriber::EnvFilter;

/// Advance of every character.
pub(crate) const ADVANCE: f32 = 10.0;
/// Height of a body line under the default configuration.
pub(crate) const LINE_HEIGHT: f32 = 22.0;
/// Space after a paragraph under the default configuration.
pub(crate) const PG_VSPACE: f32 = 9.0;

pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quire=debug")),
        )
        .with_test_writer()
        .try_init();
}

pub(crate) fn measure() -> MonospaceMeasure {
    MonospaceMeasure::new(ADVANCE, 20.0)
}

/// An engine with the default configuration and fixed-advance text.
pub(crate) fn engine(width: f32, height: f32) -> FlowEngine {
    init_logging();
    FlowEngine::new(
        LayoutConfig::default(),
        Box::new(measure()),
        Box::new(measure()),
        Size::new(width, height),
    )
}

/// Builds a document segment by segment.
#[derive(Default)]
pub(crate) struct DocBuilder {
    segments: Vec<SegmentKind>,
}

impl DocBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A body paragraph.
    pub(crate) fn paragraph(self, text: &str) -> Self {
        self.paragraph_with(text, MarkerProps::default())
    }

    /// A paragraph with tile properties.
    pub(crate) fn paragraph_with(mut self, text: &str, props: MarkerProps) -> Self {
        if !text.is_empty() {
            self.segments.push(SegmentKind::text(text));
        }
        self.segments.push(SegmentKind::paragraph_with(props));
        self
    }

    /// A header paragraph.
    pub(crate) fn header(self, text: &str) -> Self {
        self.paragraph_with(
            text,
            MarkerProps {
                header: true,
                ..MarkerProps::default()
            },
        )
    }

    /// Text without a tile.
    pub(crate) fn text(mut self, text: &str) -> Self {
        self.segments.push(SegmentKind::text(text));
        self
    }

    /// A raw segment.
    pub(crate) fn segment(mut self, kind: SegmentKind) -> Self {
        self.segments.push(kind);
        self
    }

    /// A math region.
    pub(crate) fn math(self, source: &str) -> Self {
        self.segment(SegmentKind::begin(Label::Math))
            .text(source)
            .segment(SegmentKind::end(Label::Math))
    }

    /// A block component on its own band.
    pub(crate) fn block_component(self, id: u64) -> Self {
        self.segment(SegmentKind::embed(Embed::Component {
            id: ComponentId(id),
            display: DisplayType::Block,
        }))
    }

    /// A table whose cells each hold one paragraph.
    pub(crate) fn table(self, rows: &[&[&str]]) -> Self {
        self.table_with(rows, MarkerProps::default())
    }

    /// A table with properties on its begin marker.
    pub(crate) fn table_with(mut self, rows: &[&[&str]], props: MarkerProps) -> Self {
        self.segments.push(SegmentKind::RangeBeginMarker {
            labels: Labels::from_slice(&[Label::Table]),
            props,
        });
        for row in rows {
            self.segments.push(SegmentKind::begin(Label::Row));
            for cell in *row {
                self.segments.push(SegmentKind::begin(Label::Cell));
                self = self.paragraph(cell);
                self.segments.push(SegmentKind::end(Label::Cell));
            }
            self.segments.push(SegmentKind::end(Label::Row));
        }
        self.segments.push(SegmentKind::end(Label::Table));
        self
    }

    /// The document, owned by client 1.
    pub(crate) fn build(self) -> SharedSequence {
        SharedSequence::from_segments(1, self.segments)
    }
}
