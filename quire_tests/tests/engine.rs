// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use quire::inputs::{
    Capability, ComponentError, ComponentId, DisplayType, EmbeddedComponent,
};
use quire::{
    ComponentTask, DragUpdate, Embed, ErrorKind, FragmentKind, LineKind, Rect, SegmentKind,
    Sequence, Size,
};
use quire_sequence::{Op, RemoteOp, SharedSequence};

use crate::util::{engine, line_texts, DocBuilder, LINE_HEIGHT, PG_VSPACE};

struct Chart {
    paints: Rc<Cell<usize>>,
}

impl EmbeddedComponent for Chart {
    fn query(&self, capability: Capability) -> bool {
        matches!(capability, Capability::Layout | Capability::Render)
    }

    fn height_in_lines(&self) -> Option<f32> {
        Some(4.0)
    }

    fn inline_size(&self) -> Size {
        Size::new(40.0, 20.0)
    }

    fn render(&self, _surface: Rect, _display: DisplayType) {
        self.paints.set(self.paints.get() + 1);
    }
}

// "above" 0..5, tile 5, component 6, "below" 7..12, tile 12.
fn with_block() -> SharedSequence {
    DocBuilder::new()
        .paragraph("above")
        .block_component(7)
        .paragraph("below")
        .build()
}

#[test]
fn engine_renders_empty_document() {
    let mut seq = SharedSequence::new(1);
    let mut engine = engine(300.0, 400.0);
    let output = engine.render_pending(&mut seq).unwrap();
    assert!(output.lines.is_empty());
    assert_eq!((output.viewport_start_pos, output.viewport_end_pos), (0, 0));
    assert!(!engine.is_render_pending());
}

#[test]
fn engine_block_component_lifecycle() {
    let mut seq = with_block();
    let mut engine = engine(300.0, 400.0);
    let id = ComponentId(7);

    let output = engine.render_pending(&mut seq).unwrap();
    assert_eq!(output.requested_components, [id]);
    let block = &output.lines[1];
    assert_eq!((block.start, block.end), (6, 7));
    assert_eq!((block.y, block.height), (LINE_HEIGHT + PG_VSPACE, 10.0));
    assert_eq!(output.lines[2].y, block.bottom());
    assert!(matches!(
        engine.components().get(id),
        Some(ComponentTask::Pending)
    ));
    assert_eq!(engine.paint_components(), 0);

    let paints = Rc::new(Cell::new(0));
    engine.resolve_component(
        id,
        Ok(Box::new(Chart {
            paints: Rc::clone(&paints),
        })),
    );
    assert!(engine.is_render_pending());
    let output = engine.render_pending(&mut seq).unwrap();
    assert!(output.requested_components.is_empty());
    let block = &output.lines[1];
    assert_eq!(block.height, (4.0 * LINE_HEIGHT).ceil());
    assert_eq!(output.lines[2].y, block.bottom());

    assert_eq!(engine.paint_components(), 1);
    assert_eq!(paints.get(), 1);
}

#[test]
fn engine_failed_component_is_contained() {
    let mut seq = with_block();
    let mut engine = engine(300.0, 400.0);
    engine.render_pending(&mut seq);
    engine.resolve_component(ComponentId(7), Err(ComponentError::new("unreachable host")));
    let output = engine.render_pending(&mut seq).unwrap();

    let block = &output.lines[1];
    assert_eq!(block.height, LINE_HEIGHT);
    assert!(matches!(block.kind, LineKind::Block { .. }));
    assert_eq!(output.diagnostics.len(), 1);
    let err = &output.diagnostics[0];
    assert_eq!(err.kind(), ErrorKind::AsyncLoadFailure);
    assert_eq!(err.position(), Some(6));
    assert_eq!(err.component(), Some(ComponentId(7)));
    assert_eq!(line_texts(output), ["above", "", "below"]);
}

#[test]
fn engine_remote_edits_schedule_only_when_visible() {
    let mut seq = DocBuilder::new()
        .paragraph("the quick brown fox jumps")
        .paragraph("second one")
        .build();
    let mut engine = engine(120.0, 50.0);
    engine.render_pending(&mut seq);

    let far = RemoteOp {
        client: 3,
        seq: 1,
        ref_seq: 0,
        op: Op::Insert {
            pos: 30,
            kind: SegmentKind::text("zz"),
        },
    };
    let delta = seq.apply(&far).unwrap();
    engine.on_delta(&mut seq, &delta);
    assert!(!engine.is_render_pending());

    let near = RemoteOp {
        client: 3,
        seq: 2,
        ref_seq: 1,
        op: Op::Insert {
            pos: 0,
            kind: SegmentKind::text("a "),
        },
    };
    let delta = seq.apply(&near).unwrap();
    engine.on_delta(&mut seq, &delta);
    assert!(engine.is_render_pending());
    engine.render_pending(&mut seq);

    // Local edits always schedule a pass.
    let delta = seq.insert_text(35, "!").unwrap();
    engine.on_delta(&mut seq, &delta);
    assert!(engine.is_render_pending());
}

#[test]
fn engine_math_gets_cursor_token() {
    // "x " 0..2, begin 2, "a+b" 3..6, end 6, tile 7.
    let mut seq = DocBuilder::new()
        .text("x ")
        .math("a+b")
        .paragraph("")
        .build();
    let mut engine = engine(300.0, 400.0);
    engine.set_cursor(&mut seq, 4, None);
    let output = engine.render_pending(&mut seq).unwrap();

    let LineKind::Text { fragments } = &output.lines[0].kind else {
        panic!("expected text");
    };
    let sources: Vec<&str> = fragments
        .iter()
        .filter_map(|fragment| match &fragment.kind {
            FragmentKind::Math { source } => Some(source.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(sources, ["a\\cursor+b"]);

    // Outside the region the source is untouched.
    engine.set_cursor(&mut seq, 1, None);
    let output = engine.render_pending(&mut seq).unwrap();
    assert_eq!(line_texts(output), ["x $a+b$"]);
}

#[test]
fn engine_dragged_inclusion_settles() {
    let words = ["word"; 40].join(" ");
    // "pic" 0..3, inclusion 3, " here" 4..9, tile 9, words from 10.
    let mut seq = DocBuilder::new()
        .text("pic")
        .segment(SegmentKind::embed(Embed::Inclusion {
            aspect_ratio: None,
            height: None,
        }))
        .paragraph(" here")
        .paragraph(&words)
        .build();
    let mut engine = engine(300.0, 600.0);
    let output = engine.render_pending(&mut seq).unwrap();
    assert_eq!(
        output.exclusions[0].rect,
        Rect::new(0.0, LINE_HEIGHT, 100.0, 100.0)
    );

    let mut drag = DragUpdate {
        client: 2,
        marker_pos: 3,
        dx: 150.0,
        dy: 0.0,
        on_the_move: true,
    };
    assert!(engine.apply_drag(&seq, &drag));
    let output = engine.render_pending(&mut seq).unwrap();
    let exclusion = output.exclusions[0];
    assert_eq!(exclusion.rect, Rect::new(150.0, LINE_HEIGHT, 100.0, 100.0));
    assert!(!exclusion.float_left);
    // The first line beside it reports the anchor: the end of that line.
    assert_eq!(output.settled.len(), 1);
    assert_eq!(output.settled[0].anchor, 25);

    // Nothing moves while the drag is in progress.
    assert!(engine.settle_inclusions(&mut seq).unwrap().is_empty());

    drag.on_the_move = false;
    assert!(engine.apply_drag(&seq, &drag));
    engine.render_pending(&mut seq);
    let deltas = engine.settle_inclusions(&mut seq).unwrap();
    assert_eq!(deltas.len(), 2);
    assert_eq!(deltas[1].range, 24..25);
    assert!(engine.moving_inclusion().is_none());

    let found = seq.containing_segment(24, seq.local_perspective()).unwrap();
    assert!(matches!(found.segment.embed(), Some(Embed::Inclusion { .. })));
    assert!(engine.is_render_pending());
}

#[test]
fn engine_drag_needs_an_inclusion() {
    let mut seq = with_block();
    let mut engine = engine(300.0, 400.0);
    engine.render_pending(&mut seq);
    let drag = DragUpdate {
        client: 2,
        marker_pos: 6,
        dx: 10.0,
        dy: 0.0,
        on_the_move: true,
    };
    assert!(!engine.apply_drag(&seq, &drag));
}

#[test]
fn engine_resize_reflows() {
    let mut seq = DocBuilder::new()
        .paragraph("the quick brown fox jumps")
        .build();
    let mut engine = engine(300.0, 400.0);
    assert_eq!(engine.render_pending(&mut seq).unwrap().lines.len(), 1);

    engine.resize(Size::new(120.0, 400.0));
    let output = engine.render_pending(&mut seq).unwrap();
    assert_eq!(line_texts(output), ["the quick ", "brown fox ", "jumps"]);
    assert_eq!(engine.size(), Size::new(120.0, 400.0));
}
