// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::schedule::{RenderScheduler, RenderTrigger};

#[test]
fn triggers_coalesce_into_one_pass() {
    let mut scheduler = RenderScheduler::new();
    assert!(!scheduler.is_pending());
    assert!(scheduler.take().is_none());

    assert!(scheduler.request(RenderTrigger::RemoteEdit, None));
    assert!(!scheduler.request(RenderTrigger::Presence, None));
    assert!(!scheduler.request(RenderTrigger::RemoteEdit, None));
    assert!(scheduler.is_pending());

    let pass = scheduler.take().unwrap();
    assert_eq!(pass.top, None);
    assert_eq!(
        pass.triggers.as_slice(),
        [RenderTrigger::RemoteEdit, RenderTrigger::Presence]
    );
    assert!(!scheduler.is_pending());
}

#[test]
fn latest_scroll_wins() {
    let mut scheduler = RenderScheduler::new();
    scheduler.request(RenderTrigger::Scroll, Some(10));
    scheduler.request(RenderTrigger::LocalEdit, None);
    scheduler.request(RenderTrigger::Scroll, Some(40));
    assert_eq!(scheduler.take().unwrap().top, Some(40));

    scheduler.request(RenderTrigger::Cursor, None);
    assert_eq!(scheduler.take().unwrap().top, None);
}
