// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coalescing render triggers into at most one pending pass.

use smallvec::SmallVec;

/// Why a render was requested.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderTrigger {
    /// A local edit was applied.
    LocalEdit,
    /// A remote edit was applied.
    RemoteEdit,
    /// The viewport changed size.
    Resize,
    /// The viewport scrolled.
    Scroll,
    /// A collaborator's cursor or drag changed.
    Presence,
    /// The local cursor moved.
    Cursor,
    /// A component finished loading.
    ComponentLoaded,
}

/// A pass taken from the scheduler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledRender {
    /// The latest requested top position, if any trigger set one.
    pub top: Option<usize>,
    /// Every trigger coalesced into the pass, in arrival order.
    pub triggers: SmallVec<[RenderTrigger; 4]>,
}

/// Holds at most one pending render pass.
///
/// Triggers arriving while a pass is pending only update its parameters.
#[derive(Clone, Debug, Default)]
pub struct RenderScheduler {
    pending: bool,
    top: Option<usize>,
    triggers: SmallVec<[RenderTrigger; 4]>,
}

impl RenderScheduler {
    /// Creates an idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a pass. Returns `true` if no pass was pending before.
    pub fn request(&mut self, trigger: RenderTrigger, top: Option<usize>) -> bool {
        if top.is_some() {
            self.top = top;
        }
        if !self.triggers.contains(&trigger) {
            self.triggers.push(trigger);
        }
        let scheduled = !self.pending;
        self.pending = true;
        if scheduled {
            tracing::trace!("render scheduled by {trigger:?}");
        }
        scheduled
    }

    /// Whether a pass is pending.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Takes the pending pass, leaving the scheduler idle.
    pub fn take(&mut self) -> Option<ScheduledRender> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        Some(ScheduledRender {
            top: self.top.take(),
            triggers: core::mem::take(&mut self.triggers),
        })
    }
}
