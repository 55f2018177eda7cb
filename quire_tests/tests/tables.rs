// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use quire::{Label, LineKind, MarkerProps, Point, PropertyPatch, SegmentKind};
use quire_sequence::SharedSequence;

use crate::util::{engine, line_texts, DocBuilder, LINE_HEIGHT, PG_VSPACE};

// intro 0..5, tile 5, table 6, row 7 (cells 8 and 14), row 19 (cells 20 and
// 24), table end 28, outro 29..34, tile 34.
fn sample() -> SharedSequence {
    DocBuilder::new()
        .paragraph("intro")
        .table(&[&["a b", "c"], &["d", ""]])
        .paragraph("outro")
        .build()
}

#[test]
fn table_rows_are_laid_out_cell_by_cell() {
    let mut seq = sample();
    let mut engine = engine(300.0, 400.0);
    let output = engine.render(&mut seq);

    assert_eq!(
        line_texts(output),
        ["intro", "a b", "c", "d", "", "outro"]
    );
    assert_eq!(output.lines.len(), 4);

    // Row height is the cell content plus margins and paragraph spacing.
    let row_height = 3.0 + LINE_HEIGHT + PG_VSPACE + 3.0;
    let first_row = &output.lines[1];
    assert_eq!((first_row.start, first_row.end), (7, 19));
    assert_eq!(first_row.y, LINE_HEIGHT + PG_VSPACE);
    assert_eq!(first_row.height, row_height);
    let LineKind::Row(row) = &first_row.kind else {
        panic!("expected a row, got {:?}", first_row.kind);
    };
    assert_eq!(row.cells.len(), 2);
    assert_eq!((row.cells[0].x, row.cells[0].width), (0.0, 150.0));
    assert_eq!((row.cells[1].x, row.cells[1].width), (150.0, 150.0));
    assert!(row.cells.iter().all(|cell| cell.height == row_height));
    assert_eq!((row.cells[0].lines[0].x, row.cells[0].lines[0].y), (3.0, 34.0));
    assert_eq!((row.cells[1].lines[0].x, row.cells[1].lines[0].y), (153.0, 34.0));

    let second_row = &output.lines[2];
    assert_eq!((second_row.start, second_row.end), (19, 28));
    assert_eq!(second_row.y, first_row.bottom());

    let outro = &output.lines[3];
    assert_eq!(outro.start, 29);
    assert_eq!(outro.y, second_row.bottom() + 9.0);
}

#[test]
fn table_empty_cell_keeps_a_line() {
    let mut seq = sample();
    let mut engine = engine(300.0, 400.0);
    let output = engine.render(&mut seq);

    let LineKind::Row(row) = &output.lines[2].kind else {
        panic!("expected a row");
    };
    let empty = &row.cells[1];
    assert_eq!((empty.start, empty.end), (24, 27));
    assert_eq!(empty.lines.len(), 1);
    assert_eq!((empty.lines[0].start, empty.lines[0].end), (25, 26));
}

#[test]
fn table_hit_testing_descends_into_cells() {
    let mut seq = sample();
    let mut engine = engine(300.0, 400.0);
    engine.render(&mut seq);

    assert_eq!(engine.pixel_to_position(Point::new(160.0, 40.0)), Some(15));
    assert_eq!(engine.pixel_to_position(Point::new(24.0, 40.0)), Some(11));
    let caret = engine.position_to_pixel(21).unwrap();
    assert_eq!((caret.x, caret.y), (3.0, 71.0));
}

#[test]
fn table_moribund_row_is_skipped() {
    let mut seq = sample();
    let mut engine = engine(300.0, 400.0);
    engine.render(&mut seq);
    assert_eq!(engine.cache_stats().tables_parsed, 1);

    let patch = PropertyPatch {
        moribund: Some(true),
        ..PropertyPatch::default()
    };
    let delta = seq.annotate(19..20, &patch).unwrap();
    engine.on_delta(&mut seq, &delta);
    let output = engine.render_pending(&mut seq).unwrap();

    assert_eq!(line_texts(output), ["intro", "a b", "c", "outro"]);
    assert_eq!(output.lines.len(), 3);
    assert_eq!(engine.cache_stats().tables_parsed, 2);
}

#[test]
fn table_structure_is_cached_between_passes() {
    let mut seq = sample();
    let mut engine = engine(300.0, 400.0);
    engine.render(&mut seq);
    engine.render(&mut seq);
    assert_eq!(engine.cache_stats().tables_parsed, 1);
}

#[test]
fn table_scrolled_into_second_row() {
    let mut seq = sample();
    let mut engine = engine(300.0, 400.0);
    engine.scroll_to(21);
    let output = engine.render_pending(&mut seq).unwrap();

    assert_eq!(output.top_position, 21);
    assert_eq!(output.lines[0].start, 19);
    assert_eq!(output.lines[0].y, 0.0);
    assert_eq!(line_texts(output), ["d", "", "outro"]);
}

#[test]
fn table_column_widths_from_properties() {
    let props = MarkerProps {
        column_widths: Some(vec![0.25, 0.75]),
        ..MarkerProps::default()
    };
    let mut seq = DocBuilder::new()
        .table_with(&[&["narrow", "wide"]], props)
        .paragraph("after")
        .build();
    let mut engine = engine(300.0, 400.0);
    let output = engine.render(&mut seq);

    let LineKind::Row(row) = &output.lines[0].kind else {
        panic!("expected a row");
    };
    assert_eq!((row.cells[0].x, row.cells[0].width), (0.0, 75.0));
    assert_eq!((row.cells[1].x, row.cells[1].width), (75.0, 225.0));
}

#[test]
fn table_indent_and_content_fractions() {
    let props = MarkerProps {
        indent_pct: 0.25,
        content_pct: 0.75,
        ..MarkerProps::default()
    };
    // table 0, row 1, cell 2, "narrow" 3..9, cell 11, "wide" 12..16.
    let mut seq = DocBuilder::new()
        .table_with(&[&["narrow", "wide"]], props)
        .paragraph("after")
        .build();
    let mut engine = engine(400.0, 400.0);
    let output = engine.render(&mut seq);

    let row_line = &output.lines[0];
    assert_eq!((row_line.x, row_line.width), (100.0, 300.0));
    let LineKind::Row(row) = &row_line.kind else {
        panic!("expected a row");
    };
    assert_eq!((row.cells[0].x, row.cells[0].width), (100.0, 150.0));
    assert_eq!((row.cells[1].x, row.cells[1].width), (250.0, 150.0));
    assert_eq!(row.cells[1].lines[0].x, 253.0);

    let caret = engine.position_to_pixel(12).unwrap();
    assert_eq!((caret.x, caret.y), (253.0, 3.0));
}

#[test]
fn table_nested_in_cell() {
    let mut seq = DocBuilder::new()
        .segment(SegmentKind::begin(Label::Table))
        .segment(SegmentKind::begin(Label::Row))
        .segment(SegmentKind::begin(Label::Cell))
        .table(&[&["in"]])
        .segment(SegmentKind::end(Label::Cell))
        .segment(SegmentKind::end(Label::Row))
        .segment(SegmentKind::end(Label::Table))
        .paragraph("out")
        .build();
    let mut engine = engine(300.0, 400.0);
    let output = engine.render(&mut seq);

    assert_eq!(line_texts(output), ["in", "out"]);
    let LineKind::Row(outer) = &output.lines[0].kind else {
        panic!("expected a row");
    };
    assert!(matches!(outer.cells[0].lines[0].kind, LineKind::Row(_)));
}
