// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::geometry::{Point, Rect};
use crate::layout::{ExclusionRect, MovingInclusion, Viewport};
use crate::segment::SegmentId;

use super::utils::TestEnv;

fn exclusion(id: u64, rect: Rect) -> ExclusionRect {
    ExclusionRect {
        id: SegmentId(id),
        rect,
        float_left: rect.x == 0.0,
        requires_settle: false,
    }
}

#[test]
fn full_width_without_exclusions() {
    let mut viewport = Viewport::new(300.0, 200.0);
    let rect = viewport.line_rect(20.0);
    assert_eq!((rect.x, rect.width), (0.0, 300.0));
    assert!(rect.eol);
    assert_eq!(rect.exclusion, None);
}

#[test]
fn middle_exclusion_splits_the_line() {
    let mut viewport = Viewport::new(300.0, 200.0);
    viewport.add_exclusion(exclusion(1, Rect::new(100.0, 0.0, 50.0, 30.0)));

    let left = viewport.line_rect(20.0);
    assert_eq!((left.x, left.width, left.eol), (0.0, 100.0, false));
    assert_eq!(viewport.line_x(), 150.0);
    viewport.commit_line(20.0, left.eol);
    assert_eq!(viewport.line_top(), 0.0);

    let right = viewport.line_rect(20.0);
    assert_eq!((right.x, right.width, right.eol), (150.0, 150.0, true));
    viewport.commit_line(20.0, right.eol);
    assert_eq!(viewport.line_top(), 20.0);

    // A band starting at the bottom of the exclusion is clear of it.
    viewport.vskip(10.0);
    let below = viewport.line_rect(20.0);
    assert_eq!((below.x, below.width), (0.0, 300.0));
}

#[test]
fn exclusion_at_right_edge_ends_the_line() {
    let mut viewport = Viewport::new(300.0, 200.0);
    viewport.add_exclusion(exclusion(1, Rect::new(200.0, 0.0, 100.0, 30.0)));
    let rect = viewport.line_rect(20.0);
    assert_eq!((rect.x, rect.width), (0.0, 200.0));
    assert!(rect.eol);
    assert_eq!(viewport.line_x(), 0.0);
}

#[test]
fn only_the_first_exclusion_per_zone_counts() {
    let mut viewport = Viewport::new(300.0, 200.0);
    viewport.add_exclusion(exclusion(2, Rect::new(200.0, 0.0, 20.0, 30.0)));
    viewport.add_exclusion(exclusion(1, Rect::new(50.0, 0.0, 20.0, 30.0)));
    assert_eq!(viewport.exclusions()[0].id, SegmentId(1));

    let first = viewport.line_rect(20.0);
    assert_eq!((first.x, first.width), (0.0, 50.0));
    assert_eq!(first.exclusion, Some(SegmentId(1)));
    let second = viewport.line_rect(20.0);
    assert_eq!((second.x, second.width), (70.0, 130.0));
    assert_eq!(second.exclusion, Some(SegmentId(2)));
}

#[test]
fn exclusions_replace_by_id() {
    let mut viewport = Viewport::new(300.0, 200.0);
    viewport.add_exclusion(exclusion(1, Rect::new(50.0, 0.0, 20.0, 30.0)));
    viewport.add_exclusion(exclusion(1, Rect::new(80.0, 0.0, 20.0, 30.0)));
    assert_eq!(viewport.exclusions().len(), 1);
    viewport.add_exclusion(exclusion(1, Rect::new(80.0, 0.0, 0.0, 30.0)));
    assert!(viewport.exclusions().is_empty());
}

#[test]
fn inclusion_placement() {
    let env = TestEnv::new();
    let mut viewport = Viewport::new(300.0, 400.0);

    // Would cross the right edge, so it flips left of the anchor.
    let flipped = viewport
        .add_inclusion(
            SegmentId(1),
            Some(0.5),
            None,
            Point::new(250.0, 0.0),
            20.0,
            &env.config,
            None,
        )
        .unwrap();
    assert_eq!(flipped.rect, Rect::new(150.0, 20.0, 100.0, 50.0));
    assert!(!flipped.float_left);

    // Close to the left edge, so it snaps to it.
    let snapped = viewport
        .add_inclusion(
            SegmentId(2),
            None,
            Some(80.0),
            Point::new(40.0, 100.0),
            20.0,
            &env.config,
            None,
        )
        .unwrap();
    assert_eq!(snapped.rect, Rect::new(0.0, 120.0, 100.0, 80.0));
    assert!(snapped.float_left);
    assert_eq!(viewport.exclusions().len(), 2);
}

#[test]
fn dragged_inclusion_is_placed_once() {
    let env = TestEnv::new();
    let mut viewport = Viewport::new(300.0, 400.0);
    let moving = MovingInclusion {
        client: 2,
        marker: SegmentId(5),
        origin: Rect::new(0.0, 20.0, 100.0, 40.0),
        dx: 130.0,
        dy: 10.0,
        on_the_move: false,
    };
    let placed = viewport.place_moving(&moving, &env.config);
    assert_eq!(placed.rect, Rect::new(130.0, 30.0, 100.0, 40.0));
    assert!(placed.requires_settle);

    let skipped = viewport.add_inclusion(
        SegmentId(5),
        None,
        None,
        Point::new(0.0, 0.0),
        20.0,
        &env.config,
        Some(&moving),
    );
    assert!(skipped.is_none());

    viewport.vskip(30.0);
    let rect = viewport.line_rect(20.0);
    assert_eq!(rect.settle, Some(SegmentId(5)));
    viewport.mark_settled(SegmentId(5));
    assert!(!viewport.exclusions()[0].requires_settle);
}

#[test]
fn paragraph_end_finishes_a_partial_line() {
    let mut viewport = Viewport::new(300.0, 200.0);
    viewport.add_exclusion(exclusion(1, Rect::new(100.0, 0.0, 50.0, 30.0)));
    let left = viewport.line_rect(20.0);
    viewport.commit_line(20.0, left.eol);
    viewport.end_of_paragraph(20.0);
    assert_eq!((viewport.line_top(), viewport.line_x()), (20.0, 0.0));
    assert_eq!(viewport.remaining_height(), 180.0);

    viewport.reset_top();
    assert_eq!(viewport.line_top(), 0.0);
}
