// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::components::ComponentTasks;
use crate::config::LayoutConfig;
use crate::inputs::{Font, MonospaceMeasure};
use crate::itemize::{itemize_paragraph, Item, ParagraphPiece};
use crate::outputs::{Fragment, FragmentKind, LineBox, LineKind};
use crate::segment::Segment;

pub(crate) const ADVANCE: f32 = 10.0;
pub(crate) const LINE_HEIGHT: f32 = 20.0;

/// Shared fixtures: 10px per char, 20px lines.
pub(crate) struct TestEnv {
    pub(crate) config: LayoutConfig,
    pub(crate) measure: MonospaceMeasure,
    pub(crate) components: ComponentTasks,
}

impl TestEnv {
    pub(crate) fn new() -> Self {
        Self {
            config: LayoutConfig::default(),
            measure: MonospaceMeasure::new(ADVANCE, LINE_HEIGHT),
            components: ComponentTasks::new(),
        }
    }

    pub(crate) fn font(&self) -> Font {
        self.config.font.clone()
    }

    /// Itemizes `segments` as one paragraph.
    pub(crate) fn itemize(&self, segments: &[Segment]) -> Vec<Item> {
        let pieces: Vec<_> = segments.iter().map(ParagraphPiece::whole).collect();
        itemize_paragraph(
            &pieces,
            &self.font(),
            &self.measure,
            &self.measure,
            &self.components,
            &self.config,
        )
        .items
    }
}

/// Items for a paragraph made of a single text run.
pub(crate) fn text_items(env: &TestEnv, text: &str) -> Vec<Item> {
    env.itemize(&[Segment {
        id: crate::SegmentId(1),
        kind: crate::SegmentKind::text(text),
    }])
}

/// A text line starting at `start`, one fragment per word or space.
pub(crate) fn text_line(start: usize, text: &str, x: f32, y: f32, width: f32) -> LineBox {
    let mut fragments = Vec::new();
    let mut pos = start;
    let mut offset = 0.0;
    for word in text.split_inclusive(' ') {
        let run = word.trim_end_matches(' ');
        if !run.is_empty() {
            let len = run.chars().count();
            fragments.push(Fragment {
                start: pos,
                end: pos + len,
                x: offset,
                width: len as f32 * ADVANCE,
                kind: FragmentKind::Text(run.to_owned()),
            });
            pos += len;
            offset += len as f32 * ADVANCE;
        }
        if word.ends_with(' ') {
            fragments.push(Fragment {
                start: pos,
                end: pos + 1,
                x: offset,
                width: ADVANCE,
                kind: FragmentKind::Glue,
            });
            pos += 1;
            offset += ADVANCE;
        }
    }
    LineBox {
        start,
        end: pos,
        x,
        y,
        width,
        height: LINE_HEIGHT,
        indent_width: 0.0,
        break_index: 0,
        paragraph: None,
        font: LayoutConfig::default().font,
        indent_symbol: None,
        kind: LineKind::Text { fragments },
    }
}
