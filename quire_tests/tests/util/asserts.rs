// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use quire::{FragmentKind, LineBox, LineKind, RenderOutput};

/// The text of each leaf line, glue as spaces and markers dropped.
pub(crate) fn line_texts(output: &RenderOutput) -> Vec<String> {
    output
        .leaf_lines()
        .into_iter()
        .map(|line| match &line.kind {
            LineKind::Text { fragments } => fragments
                .iter()
                .map(|fragment| match &fragment.kind {
                    FragmentKind::Text(run) => run.clone(),
                    FragmentKind::Glue => String::from(" "),
                    FragmentKind::Math { source } => format!("${source}$"),
                    FragmentKind::Component { .. } | FragmentKind::Marker(_) => String::new(),
                })
                .collect(),
            _ => String::new(),
        })
        .collect()
}

/// Lines cover increasing positions and never overlap vertically unless they
/// are zones of the same band.
pub(crate) fn assert_lines_ordered(lines: &[LineBox]) {
    for pair in lines.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.end <= b.start,
            "line {}..{} overlaps {}..{}",
            a.start,
            a.end,
            b.start,
            b.end
        );
        if a.y != b.y {
            assert!(
                a.bottom() <= b.y + 0.001,
                "line at {} (height {}) overlaps line at {}",
                a.y,
                a.height,
                b.y
            );
        } else {
            assert!(a.x + a.width <= b.x + 0.001, "zones of one band overlap");
        }
    }
}
