// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-view engine tying layout, presence and scheduling together.

use crate::components::ComponentTasks;
use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect, Size};
use crate::inputs::{
    ClientId, ComponentError, ComponentId, DisplayType, EditableSequence, EmbeddedComponent,
    MathTypesetter, Sequence, SequenceDelta, TextMeasure,
};
use crate::layout::{CacheStats, FlowContext, FlowRenderer, LayoutCaches, MovingInclusion};
use crate::outputs::{FragmentKind, LineBox, LineKind, PresenceCursor, RenderOutput};
use crate::position::{Caret, PositionMapper};
use crate::presence::{DragUpdate, PresenceOutcome, PresenceTracker, PresenceUpdate};
use crate::schedule::{RenderScheduler, RenderTrigger};
use crate::segment::Embed;

/// Layout state of one document view.
///
/// The engine owns its configuration, caches, collaborator cursors and the
/// render scheduler. The document itself is passed in by the caller on every
/// call, so the engine never holds on to it between passes.
///
/// Triggers (edits, presence, scrolling, resizing, component loads) only
/// schedule a pass; [`FlowEngine::render_pending`] runs it.
pub struct FlowEngine {
    config: LayoutConfig,
    measure: Box<dyn TextMeasure>,
    typesetter: Box<dyn MathTypesetter>,
    caches: LayoutCaches,
    components: ComponentTasks,
    presence: PresenceTracker,
    scheduler: RenderScheduler,
    size: Size,
    top_position: usize,
    moving: Option<MovingInclusion>,
    last: Option<RenderOutput>,
}

impl core::fmt::Debug for FlowEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlowEngine")
            .field("config", &self.config)
            .field("caches", &self.caches)
            .field("components", &self.components)
            .field("presence", &self.presence)
            .field("scheduler", &self.scheduler)
            .field("size", &self.size)
            .field("top_position", &self.top_position)
            .field("moving", &self.moving)
            .finish_non_exhaustive()
    }
}

impl FlowEngine {
    /// Creates an engine for a viewport of `size`.
    pub fn new(
        config: LayoutConfig,
        measure: Box<dyn TextMeasure>,
        typesetter: Box<dyn MathTypesetter>,
        size: Size,
    ) -> Self {
        let mut scheduler = RenderScheduler::new();
        scheduler.request(RenderTrigger::Resize, Some(0));
        Self {
            config,
            measure,
            typesetter,
            caches: LayoutCaches::new(),
            components: ComponentTasks::new(),
            presence: PresenceTracker::new(),
            scheduler,
            size,
            top_position: 0,
            moving: None,
            last: None,
        }
    }

    /// The layout configuration.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Replaces the configuration, invalidating all layout.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.caches.invalidate_all();
        self.scheduler.request(RenderTrigger::Resize, None);
    }

    /// The viewport size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// The position shown at the top of the viewport.
    pub fn top_position(&self) -> usize {
        self.top_position
    }

    /// The result of the last render pass.
    pub fn last_output(&self) -> Option<&RenderOutput> {
        self.last.as_ref()
    }

    /// Collaborator cursors.
    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Component load tasks.
    pub fn components(&self) -> &ComponentTasks {
        &self.components
    }

    /// Cache activity so far.
    pub fn cache_stats(&self) -> CacheStats {
        self.caches.stats()
    }

    /// Layout caches.
    pub fn caches(&self) -> &LayoutCaches {
        &self.caches
    }

    /// Whether a render pass is pending.
    pub fn is_render_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// The inclusion being dragged.
    pub fn moving_inclusion(&self) -> Option<&MovingInclusion> {
        self.moving.as_ref()
    }

    /// Changes the viewport size.
    pub fn resize(&mut self, size: Size) {
        if size != self.size {
            self.size = size;
            self.scheduler.request(RenderTrigger::Resize, None);
        }
    }

    /// Shows `top` at the top of the viewport from the next pass on.
    pub fn scroll_to(&mut self, top: usize) {
        self.scheduler.request(RenderTrigger::Scroll, Some(top));
    }

    /// Moves the local caret and selection anchor.
    pub fn set_cursor<S: Sequence + ?Sized>(
        &mut self,
        sequence: &mut S,
        position: usize,
        mark: Option<usize>,
    ) -> PresenceOutcome {
        let update = PresenceUpdate {
            client: sequence.local_client(),
            origin_pos: position.min(sequence.len()),
            origin_mark: mark.map(|mark| mark.min(sequence.len())),
            ref_seq: sequence.current_seq(),
        };
        let outcome = self.presence.apply_update(sequence, &update);
        self.scheduler.request(RenderTrigger::Cursor, None);
        outcome
    }

    /// The local caret position.
    pub fn cursor<S: Sequence + ?Sized>(&self, sequence: &S) -> Option<usize> {
        self.presence
            .get(sequence.local_client())
            .map(|info| info.resolved_position)
    }

    /// The local cursor as an outbound presence update.
    pub fn local_presence<S: Sequence + ?Sized>(&self, sequence: &S) -> Option<PresenceUpdate> {
        let info = self.presence.get(sequence.local_client())?;
        let position = sequence
            .resolve_handle(info.position_handle)
            .unwrap_or(info.resolved_position);
        let mark = info
            .mark_handle
            .and_then(|handle| sequence.resolve_handle(handle));
        Some(PresenceUpdate {
            client: info.client,
            origin_pos: position.min(sequence.len()),
            origin_mark: mark,
            ref_seq: sequence.current_seq(),
        })
    }

    /// Reacts to an applied edit: invalidates the layout it touched and, for
    /// remote edits, moves the author's cursor to the edit.
    ///
    /// Local edits always schedule a pass; remote edits only when they touch
    /// the shown range.
    pub fn on_delta<S: Sequence + ?Sized>(&mut self, sequence: &mut S, delta: &SequenceDelta) {
        self.caches.invalidate_range(sequence, delta.range.clone());
        self.caches.invalidate_segments(&delta.segments);
        if delta.local {
            self.scheduler.request(RenderTrigger::LocalEdit, None);
            return;
        }
        let update = PresenceUpdate {
            client: delta.client,
            origin_pos: delta.op_cursor(),
            origin_mark: None,
            ref_seq: delta.ref_seq,
        };
        self.presence.apply_update(sequence, &update);
        if self.in_viewport(delta.range.start) {
            self.scheduler.request(RenderTrigger::RemoteEdit, None);
        }
    }

    /// Applies a collaborator's cursor update. A pass is scheduled when the
    /// cursor lands in the shown range.
    pub fn apply_presence<S: Sequence + ?Sized>(
        &mut self,
        sequence: &mut S,
        update: &PresenceUpdate,
    ) -> PresenceOutcome {
        let outcome = self.presence.apply_update(sequence, update);
        if let PresenceOutcome::Applied(position) = outcome {
            if self.in_viewport(position) {
                self.scheduler.request(RenderTrigger::Presence, None);
            }
        }
        outcome
    }

    /// Applies a drag of a floating inclusion. Returns `false` if no laid
    /// out inclusion is anchored at the marker position.
    pub fn apply_drag<S: Sequence + ?Sized>(&mut self, sequence: &S, drag: &DragUpdate) -> bool {
        let perspective = sequence.local_perspective();
        let Some(found) = sequence.containing_segment(drag.marker_pos, perspective) else {
            return false;
        };
        let marker = found.segment.id;
        if !matches!(found.segment.embed(), Some(Embed::Inclusion { .. })) {
            return false;
        }
        let origin = match self.moving.filter(|moving| moving.marker == marker) {
            Some(moving) => moving.origin,
            None => {
                let Some(exclusion) = self
                    .last
                    .as_ref()
                    .and_then(|out| out.exclusions.iter().find(|ex| ex.id == marker))
                else {
                    return false;
                };
                exclusion.rect
            }
        };
        self.moving = Some(MovingInclusion {
            client: drag.client,
            marker,
            origin,
            dx: drag.dx,
            dy: drag.dy,
            on_the_move: drag.on_the_move,
        });
        self.scheduler.request(RenderTrigger::Presence, None);
        true
    }

    /// Moves a dropped inclusion's marker to where the last pass settled it.
    /// Returns the applied edits; nothing happens while the drag is still in
    /// progress.
    pub fn settle_inclusions<E: EditableSequence + ?Sized>(
        &mut self,
        sequence: &mut E,
    ) -> Result<Vec<SequenceDelta>, E::Error> {
        let Some(moving) = self.moving.filter(|moving| !moving.on_the_move) else {
            return Ok(Vec::new());
        };
        let Some(settled) = self
            .last
            .as_ref()
            .and_then(|out| out.settled.iter().find(|s| s.marker == moving.marker))
            .copied()
        else {
            return Ok(Vec::new());
        };
        let (Some(from), Some(kind)) = (
            sequence.offset_of(moving.marker),
            sequence.segment(moving.marker).map(|segment| segment.kind.clone()),
        ) else {
            self.moving = None;
            return Ok(Vec::new());
        };
        self.moving = None;
        if settled.anchor == from || settled.anchor == from + 1 {
            self.scheduler.request(RenderTrigger::LocalEdit, None);
            return Ok(Vec::new());
        }
        let removed = sequence.remove(from..from + 1)?;
        self.on_delta(sequence, &removed);
        let to = if settled.anchor > from {
            settled.anchor - 1
        } else {
            settled.anchor
        };
        let inserted = sequence.insert(to, kind)?;
        self.on_delta(sequence, &inserted);
        tracing::debug!("settled inclusion moved from {from} to {to}");
        Ok(vec![removed, inserted])
    }

    /// Records the outcome of loading a component and schedules a pass.
    pub fn resolve_component(
        &mut self,
        id: ComponentId,
        result: Result<Box<dyn EmbeddedComponent>, ComponentError>,
    ) {
        if let Err(err) = &result {
            tracing::warn!("component {id:?} failed to load: {err}");
        }
        self.components.resolve(id, result);
        self.caches.invalidate_component(id);
        self.scheduler.request(RenderTrigger::ComponentLoaded, None);
    }

    /// Forgets a collaborator that left.
    pub fn remove_client<S: Sequence + ?Sized>(&mut self, sequence: &mut S, client: ClientId) {
        if self.presence.remove_client(sequence, client) {
            self.scheduler.request(RenderTrigger::Presence, None);
        }
    }

    /// Runs the pending pass, if any.
    pub fn render_pending<S: Sequence + ?Sized>(
        &mut self,
        sequence: &mut S,
    ) -> Option<&RenderOutput> {
        let scheduled = self.scheduler.take()?;
        if let Some(top) = scheduled.top {
            self.top_position = top;
        }
        tracing::trace!("running render for {:?}", scheduled.triggers);
        Some(self.render(sequence))
    }

    /// Runs a pass now, using the latest state.
    pub fn render<S: Sequence + ?Sized>(&mut self, sequence: &mut S) -> &RenderOutput {
        self.presence.refresh(sequence);
        self.caches.prune(sequence);
        let cursor = self.cursor(sequence);

        let cx = FlowContext {
            sequence: &*sequence,
            config: &self.config,
            measure: self.measure.as_ref(),
            typesetter: self.typesetter.as_ref(),
            components: &self.components,
            moving: self.moving.as_ref(),
            cursor,
        };
        let mut renderer = FlowRenderer::new(cx, &mut self.caches);
        let mut output =
            renderer.render_tree(self.top_position, self.size.width, self.size.height);

        for id in &output.requested_components {
            self.components.request(*id);
        }
        let mapper = PositionMapper::new(&output.lines, self.measure.as_ref());
        let mut cursors: Vec<PresenceCursor> = self
            .presence
            .iter()
            .filter_map(|info| {
                let caret = mapper.position_to_pixel(info.resolved_position)?;
                Some(PresenceCursor {
                    client: info.client,
                    position: info.resolved_position,
                    mark: info.resolved_mark,
                    x: caret.x,
                    y: caret.y,
                    height: caret.height,
                })
            })
            .collect();
        cursors.sort_by_key(|cursor| cursor.client);
        output.cursors = cursors;
        self.presence.mark_rendered();
        tracing::trace!(
            "pass done: {}..{}, {} line(s), {} diagnostic(s)",
            output.viewport_start_pos,
            output.viewport_end_pos,
            output.lines.len(),
            output.diagnostics.len()
        );
        self.last.insert(output)
    }

    /// Height of the document from `start` at the current width, measured
    /// without producing lines.
    pub fn measure_height<S: Sequence + ?Sized>(&mut self, sequence: &S, start: usize) -> f32 {
        let cx = FlowContext {
            sequence,
            config: &self.config,
            measure: self.measure.as_ref(),
            typesetter: self.typesetter.as_ref(),
            components: &self.components,
            moving: None,
            cursor: None,
        };
        FlowRenderer::new(cx, &mut self.caches).measure(start, self.size.width)
    }

    /// Where the caret for `pos` is drawn in the last pass.
    pub fn position_to_pixel(&self, pos: usize) -> Option<Caret> {
        let output = self.last.as_ref()?;
        PositionMapper::new(&output.lines, self.measure.as_ref()).position_to_pixel(pos)
    }

    /// The position under `point` in the last pass.
    pub fn pixel_to_position(&self, point: Point) -> Option<usize> {
        let output = self.last.as_ref()?;
        PositionMapper::new(&output.lines, self.measure.as_ref()).pixel_to_position(point)
    }

    /// Asks every loaded component shown in the last pass to paint itself.
    /// Returns how many were painted.
    pub fn paint_components(&self) -> usize {
        let Some(output) = self.last.as_ref() else {
            return 0;
        };
        let mut painted = 0;
        let mut visit = |line: &LineBox| match &line.kind {
            LineKind::Block { component, .. } => {
                if let Some(ready) = self.components.ready(*component) {
                    ready.render(line.rect(), DisplayType::Block);
                    painted += 1;
                }
            }
            LineKind::Text { fragments } => {
                for fragment in fragments {
                    if let FragmentKind::Component { id, .. } = &fragment.kind {
                        if let Some(ready) = self.components.ready(*id) {
                            let rect = Rect::new(
                                line.x + line.indent_width + fragment.x,
                                line.y,
                                fragment.width,
                                line.height,
                            );
                            ready.render(rect, DisplayType::Inline);
                            painted += 1;
                        }
                    }
                }
            }
            LineKind::Row(_) => {}
        };
        for line in output.leaf_lines() {
            visit(line);
        }
        painted
    }

    fn in_viewport(&self, pos: usize) -> bool {
        self.last
            .as_ref()
            .is_none_or(|output| output.contains_position(pos))
    }
}
