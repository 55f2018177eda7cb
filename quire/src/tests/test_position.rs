// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::geometry::Point;
use crate::inputs::{ComponentId, MonospaceMeasure};
use crate::itemize::ComponentState;
use crate::outputs::{CellBox, LineBox, LineKind, RowBox};
use crate::position::{closest_north, closest_south, PositionMapper};

use super::utils::{text_line, ADVANCE, LINE_HEIGHT};

fn measure() -> MonospaceMeasure {
    MonospaceMeasure::new(ADVANCE, LINE_HEIGHT)
}

fn paragraph() -> Vec<LineBox> {
    // "the quick " / "brown fox " / "jumps" plus the tile.
    let mut last = text_line(20, "jumps", 0.0, 40.0, 120.0);
    last.end += 1;
    vec![
        text_line(0, "the quick ", 0.0, 0.0, 120.0),
        text_line(10, "brown fox ", 0.0, 20.0, 120.0),
        last,
    ]
}

#[test]
fn caret_positions() {
    let lines = paragraph();
    let measure = measure();
    let mapper = PositionMapper::new(&lines, &measure);

    let caret = mapper.position_to_pixel(12).unwrap();
    assert_eq!((caret.x, caret.y, caret.height), (20.0, 20.0, LINE_HEIGHT));
    assert_eq!(caret.line_start, 10);

    // The tile sits after the last run.
    let end = mapper.position_to_pixel(25).unwrap();
    assert_eq!((end.x, end.y), (50.0, 40.0));

    assert!(mapper.position_to_pixel(26).is_none());
}

#[test]
fn hit_testing() {
    let lines = paragraph();
    let measure = measure();
    let mapper = PositionMapper::new(&lines, &measure);

    assert_eq!(mapper.pixel_to_position(Point::new(0.0, 5.0)), Some(0));
    assert_eq!(mapper.pixel_to_position(Point::new(44.0, 5.0)), Some(4));
    assert_eq!(mapper.pixel_to_position(Point::new(35.0, 25.0)), Some(13));
    // Past the content of a line.
    assert_eq!(mapper.pixel_to_position(Point::new(115.0, 45.0)), Some(25));
    // Below every line.
    assert_eq!(mapper.pixel_to_position(Point::new(10.0, 300.0)), Some(21));
    // Left of the viewport.
    assert_eq!(mapper.pixel_to_position(Point::new(-5.0, 25.0)), Some(10));
}

#[test]
fn hit_then_caret_round_trip() {
    let lines = paragraph();
    let measure = measure();
    let mapper = PositionMapper::new(&lines, &measure);
    for pos in 0..25 {
        let caret = mapper.position_to_pixel(pos).unwrap();
        let hit = mapper
            .pixel_to_position(Point::new(caret.x + 1.0, caret.y + 1.0))
            .unwrap();
        assert_eq!(hit, pos);
    }
}

#[test]
fn nearest_lines() {
    let lines = paragraph();
    assert_eq!(closest_north(&lines, 10.0), None);
    assert_eq!(closest_south(&lines, 10.0), Some(0));
    assert_eq!(closest_north(&lines, 20.0), Some(0));
    assert_eq!(closest_south(&lines, 20.0), Some(1));
    assert_eq!(closest_south(&lines, 60.0), None);
}

#[test]
fn split_zones_pick_the_one_under_the_point() {
    let measure = measure();
    let lines = vec![
        text_line(0, "left ", 0.0, 0.0, 100.0),
        text_line(5, "right", 150.0, 0.0, 150.0),
    ];
    let mapper = PositionMapper::new(&lines, &measure);
    assert_eq!(mapper.pixel_to_position(Point::new(170.0, 10.0)), Some(7));
    assert_eq!(mapper.pixel_to_position(Point::new(30.0, 10.0)), Some(3));
}

#[test]
fn rows_and_blocks() {
    let measure = measure();
    let mut cell_line = text_line(4, "abc", 10.0, 3.0, 80.0);
    cell_line.end += 1;
    let row = LineBox {
        kind: LineKind::Row(RowBox {
            cells: vec![
                CellBox {
                    start: 2,
                    end: 10,
                    x: 0.0,
                    width: 100.0,
                    height: 30.0,
                    lines: vec![cell_line],
                },
                CellBox {
                    start: 10,
                    end: 12,
                    x: 100.0,
                    width: 100.0,
                    height: 30.0,
                    lines: Vec::new(),
                },
            ],
        }),
        end: 13,
        height: 30.0,
        ..text_line(1, "", 0.0, 0.0, 200.0)
    };
    let block = LineBox {
        kind: LineKind::Block {
            component: ComponentId(1),
            state: ComponentState::Pending,
        },
        start: 14,
        end: 15,
        y: 30.0,
        height: 10.0,
        ..text_line(14, "", 0.0, 30.0, 200.0)
    };
    let lines = vec![row, block];
    let mapper = PositionMapper::new(&lines, &measure);

    let caret = mapper.position_to_pixel(5).unwrap();
    assert_eq!((caret.x, caret.y), (20.0, 3.0));
    assert_eq!(mapper.pixel_to_position(Point::new(25.0, 5.0)), Some(5));
    // The empty cell maps to its content start.
    assert_eq!(mapper.pixel_to_position(Point::new(150.0, 5.0)), Some(11));
    assert_eq!(mapper.pixel_to_position(Point::new(50.0, 35.0)), Some(14));
}
