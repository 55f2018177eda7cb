// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use quire::{CacheStats, Embed, LayoutConfig, LineBox, LineKind, SegmentKind, Size};
use quire_sequence::SharedSequence;

use crate::util::{engine, line_texts, DocBuilder};

// "alpha beta" 0..10, tile 10, "gamma delta" 11..22, tile 22, "epsilon"
// 23..30, tile 30.
fn three_paragraphs() -> SharedSequence {
    DocBuilder::new()
        .paragraph("alpha beta")
        .paragraph("gamma delta")
        .paragraph("epsilon")
        .build()
}

fn stats(itemized: usize, broken: usize, reused: usize) -> CacheStats {
    CacheStats {
        itemized,
        broken,
        reused,
        tables_parsed: 0,
    }
}

#[test]
fn cache_second_pass_replays_breaks() {
    let mut seq = three_paragraphs();
    let mut engine = engine(300.0, 400.0);
    let first = engine.render(&mut seq).clone();
    assert_eq!(engine.cache_stats(), stats(3, 3, 0));

    let second = engine.render(&mut seq).clone();
    assert_eq!(engine.cache_stats(), stats(3, 3, 3));
    assert_eq!(first.lines, second.lines);
}

/// The line as it reads after `by` positions were inserted before it.
fn shifted(line: &LineBox, by: usize) -> LineBox {
    let mut line = line.clone();
    line.start += by;
    line.end += by;
    if let LineKind::Text { fragments } = &mut line.kind {
        for fragment in fragments {
            fragment.start += by;
            fragment.end += by;
        }
    }
    line
}

#[test]
fn cache_edit_invalidates_only_its_paragraph() {
    let mut seq = three_paragraphs();
    let mut engine = engine(300.0, 400.0);
    let before = engine.render(&mut seq).clone();
    assert_eq!(before.lines.len(), 3);

    let delta = seq.insert_text(13, "x").unwrap();
    engine.on_delta(&mut seq, &delta);
    let output = engine.render_pending(&mut seq).unwrap().clone();
    assert_eq!(line_texts(&output), ["alpha beta", "gaxmma delta", "epsilon"]);
    assert_eq!(engine.cache_stats(), stats(4, 4, 2));

    assert_eq!(output.lines[0], before.lines[0]);
    assert_eq!(output.lines[2], shifted(&before.lines[2], 1));
}

#[test]
fn cache_resize_rebreaks_without_itemizing() {
    let mut seq = three_paragraphs();
    let mut engine = engine(300.0, 400.0);
    engine.render(&mut seq);

    engine.resize(Size::new(60.0, 400.0));
    let output = engine.render_pending(&mut seq).unwrap();
    assert_eq!(
        line_texts(output),
        ["alpha ", "beta", "gamma ", "delta", "epsilon"]
    );
    assert_eq!(engine.cache_stats(), stats(3, 6, 0));

    // Same size again is not a change.
    engine.resize(Size::new(60.0, 400.0));
    assert!(!engine.is_render_pending());
}

#[test]
fn cache_config_change_itemizes_again() {
    let mut seq = three_paragraphs();
    let mut engine = engine(300.0, 400.0);
    engine.render(&mut seq);

    engine.set_config(LayoutConfig::default());
    engine.render_pending(&mut seq);
    assert_eq!(engine.cache_stats(), stats(6, 6, 0));
}

#[test]
fn cache_removed_paragraphs_are_pruned() {
    let mut seq = three_paragraphs();
    let mut engine = engine(300.0, 400.0);
    engine.render(&mut seq);
    assert_eq!(engine.caches().paragraph_count(), 3);

    let delta = seq.remove(23..31).unwrap();
    engine.on_delta(&mut seq, &delta);
    let output = engine.render_pending(&mut seq).unwrap();
    assert_eq!(line_texts(output), ["alpha beta", "gamma delta"]);
    assert_eq!(engine.caches().paragraph_count(), 2);
}

#[test]
fn cache_breaks_shaped_by_exclusions_are_not_kept() {
    let mut seq = DocBuilder::new()
        .text("aa")
        .segment(SegmentKind::embed(Embed::Inclusion {
            aspect_ratio: None,
            height: None,
        }))
        .paragraph(" around the picture")
        .build();
    let mut engine = engine(300.0, 400.0);
    engine.render(&mut seq);
    engine.render(&mut seq);

    let stats = engine.cache_stats();
    assert_eq!((stats.itemized, stats.broken, stats.reused), (1, 2, 0));
}
