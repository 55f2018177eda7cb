// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flowing the sequence into a viewport.

use crate::components::{ComponentTask, ComponentTasks};
use crate::config::LayoutConfig;
use crate::error::Error;
use crate::inputs::{
    Capability, ComponentId, DisplayType, Font, MathTypesetter, Sequence, StackEntry, TextMeasure,
};
use crate::itemize::{
    itemize_paragraph, ComponentState, Item, ItemKind, MarkerItem, MarkerKind, ParagraphPiece,
};
use crate::layout::cache::{CachedBreaks, LayoutCaches, ParagraphLayoutCache};
use crate::layout::line_break::{BreakLines, BreakOptions, LineBreak, ParagraphMetrics};
use crate::layout::viewport::{MovingInclusion, Viewport};
use crate::outputs::{
    Fragment, FragmentKind, LineBox, LineKind, OverlayMarker, RenderOutput, SettledInclusion,
};
use crate::segment::{Embed, Label, Segment};

/// Collaborators and engine state shared by a whole render pass.
pub struct FlowContext<'a, S: ?Sized> {
    /// The document.
    pub sequence: &'a S,
    /// Layout configuration.
    pub config: &'a LayoutConfig,
    /// Text measurement.
    pub measure: &'a dyn TextMeasure,
    /// Math typesetting.
    pub typesetter: &'a dyn MathTypesetter,
    /// Component load tasks.
    pub components: &'a ComponentTasks,
    /// The inclusion being dragged.
    pub moving: Option<&'a MovingInclusion>,
    /// The local cursor, for math cursor tokens.
    pub cursor: Option<usize>,
}

impl<S: ?Sized> core::fmt::Debug for FlowContext<'_, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlowContext")
            .field("config", &self.config)
            .field("components", &self.components)
            .field("moving", &self.moving)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

/// What one flow traversal should lay out. Never mutated by the traversal.
#[derive(Copy, Clone, Debug)]
pub struct FlowRequest<'s> {
    /// Where traversal starts.
    pub start: usize,
    /// The position that should appear first. Lines ending at or before it
    /// are laid out but not shown.
    pub requested_position: usize,
    /// Measure only: advance the viewport without producing lines.
    pub defer: bool,
    /// Traversal stops here, at the end marker of the enclosing cell or at
    /// the end of the sequence.
    pub limit: usize,
    /// Tables, rows and cells still to descend into on the way to the
    /// requested position, outermost first.
    pub stack: &'s [StackEntry],
}

/// Results of a traversal, built up as it goes.
#[derive(Clone, Debug, Default)]
pub struct FlowOutput {
    /// Lines produced so far.
    pub lines: Vec<LineBox>,
    /// First position shown.
    pub viewport_start_pos: Option<usize>,
    /// One past the last position shown.
    pub viewport_end_pos: usize,
    /// Height of lines laid out above the viewport.
    pub deferred_height: f32,
    /// Overlays met on shown lines.
    pub overlay_markers: Vec<OverlayMarker>,
    /// Inclusions that settled.
    pub settled: Vec<SettledInclusion>,
    /// Components met without a load task.
    pub requested_components: Vec<ComponentId>,
    /// Contained failures.
    pub diagnostics: Vec<Error>,
}

impl FlowOutput {
    pub(crate) fn note_shown(&mut self, start: usize, end: usize) {
        self.viewport_start_pos.get_or_insert(start);
        self.viewport_end_pos = self.viewport_end_pos.max(end);
    }

    fn request_component(&mut self, id: ComponentId) {
        if !self.requested_components.contains(&id) {
            self.requested_components.push(id);
        }
    }

    /// Merges the results of a nested traversal, returning its lines moved by
    /// `(dx, dy)`.
    pub(crate) fn absorb(&mut self, mut other: Self, dx: f32, dy: f32) -> Vec<LineBox> {
        for line in &mut other.lines {
            translate(line, dx, dy);
        }
        if let Some(start) = other.viewport_start_pos {
            self.note_shown(start, other.viewport_end_pos);
        }
        self.deferred_height += other.deferred_height;
        self.overlay_markers.append(&mut other.overlay_markers);
        self.settled.append(&mut other.settled);
        for id in other.requested_components {
            self.request_component(id);
        }
        self.diagnostics.append(&mut other.diagnostics);
        other.lines
    }
}

fn translate(line: &mut LineBox, dx: f32, dy: f32) {
    line.x += dx;
    line.y += dy;
    if let LineKind::Row(row) = &mut line.kind {
        for cell in &mut row.cells {
            cell.x += dx;
            for nested in &mut cell.lines {
                translate(nested, dx, dy);
            }
        }
    }
}

enum Step<'a> {
    Paragraph,
    Table(&'a Segment),
    BlockComponent(ComponentId),
    RegionEnd,
    Skip,
}

fn classify(segment: &Segment) -> Step<'_> {
    if segment.is_range_begin(Label::Table) {
        return Step::Table(segment);
    }
    if segment.is_range_end(Label::Table)
        || segment.is_range_end(Label::Row)
        || segment.is_range_end(Label::Cell)
    {
        return Step::RegionEnd;
    }
    if segment.is_range_begin(Label::Row) || segment.is_range_begin(Label::Cell) {
        return Step::Skip;
    }
    match segment.embed() {
        Some(Embed::Component {
            id,
            display: DisplayType::Block,
        }) => Step::BlockComponent(*id),
        _ => Step::Paragraph,
    }
}

/// Lays out a sequence into a viewport, recursing into tables.
pub struct FlowRenderer<'a, S: ?Sized> {
    pub(crate) cx: FlowContext<'a, S>,
    pub(crate) caches: &'a mut LayoutCaches,
}

impl<S: ?Sized> core::fmt::Debug for FlowRenderer<'_, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlowRenderer")
            .field("cx", &self.cx)
            .field("caches", &self.caches)
            .finish()
    }
}

impl<'a, S: Sequence + ?Sized> FlowRenderer<'a, S> {
    /// Creates a renderer.
    pub fn new(cx: FlowContext<'a, S>, caches: &'a mut LayoutCaches) -> Self {
        Self { cx, caches }
    }

    /// Lays out a viewport of `width` by `height` showing `top` first.
    ///
    /// When `top` lies inside nested tables, traversal starts at the
    /// outermost table and descends into the cells enclosing `top`; the
    /// other cells of those rows are laid out whole.
    pub fn render_tree(&mut self, top: usize, width: f32, height: f32) -> RenderOutput {
        let sequence = self.cx.sequence;
        let len = sequence.len();
        let mut viewport = Viewport::new(width, height);
        if let Some(moving) = self.cx.moving {
            viewport.place_moving(moving, self.cx.config);
        }
        if len == 0 {
            return RenderOutput {
                exclusions: viewport.exclusions().to_vec(),
                ..RenderOutput::default()
            };
        }
        let top = top.min(len - 1);
        let stack = sequence.stack_context(top, &[Label::Table, Label::Row, Label::Cell]);
        let start = match stack.outermost(Label::Table) {
            Some(table) => table.pos,
            None => self.paragraph_start(top),
        };
        let entries: &[StackEntry] = match stack.outermost(Label::Table) {
            Some(_) => stack.entries.as_slice(),
            None => &[],
        };
        let req = FlowRequest {
            start,
            requested_position: top,
            defer: false,
            limit: len,
            stack: entries,
        };
        let mut out = FlowOutput::default();
        let end = self.render_flow(&req, &mut viewport, &mut out);
        tracing::trace!(
            "rendered {} line(s) for top {top}, stopped at {end}",
            out.lines.len()
        );
        RenderOutput {
            top_position: top,
            viewport_start_pos: out.viewport_start_pos.unwrap_or(top),
            viewport_end_pos: out.viewport_end_pos.max(out.viewport_start_pos.unwrap_or(top)),
            deferred_height: out.deferred_height,
            overlay_markers: out.overlay_markers,
            lines: out.lines,
            exclusions: viewport.exclusions().to_vec(),
            settled: out.settled,
            cursors: Vec::new(),
            requested_components: out.requested_components,
            diagnostics: out.diagnostics,
        }
    }

    /// Measures the height of everything from `start` in a viewport `width`
    /// wide, without producing lines.
    pub fn measure(&mut self, start: usize, width: f32) -> f32 {
        let mut viewport = Viewport::new(width, f32::INFINITY);
        let req = FlowRequest {
            start,
            requested_position: start,
            defer: true,
            limit: self.cx.sequence.len(),
            stack: &[],
        };
        let mut out = FlowOutput::default();
        self.render_flow(&req, &mut viewport, &mut out);
        viewport.line_top()
    }

    /// Start of the paragraph, block or table run containing `pos`.
    pub(crate) fn paragraph_start(&self, pos: usize) -> usize {
        let sequence = self.cx.sequence;
        let mut start = sequence
            .find_tile(pos, Label::Paragraph, true)
            .map_or(0, |tile| tile.pos + 1);
        if start < pos {
            let perspective = sequence.local_perspective();
            sequence.visit_range(start..pos, perspective, &mut |segment, seg_start| {
                let structural = !segment.labels().is_empty()
                    && !segment.is_tile(Label::Paragraph)
                    && !segment.labels().contains(&Label::Math);
                let block = matches!(
                    segment.embed(),
                    Some(Embed::Component {
                        display: DisplayType::Block,
                        ..
                    })
                );
                if structural || block {
                    start = seg_start + segment.len();
                }
                true
            });
        }
        start.min(pos)
    }

    /// Traverses from `req.start`, returning where traversal stopped.
    pub(crate) fn render_flow(
        &mut self,
        req: &FlowRequest<'_>,
        viewport: &mut Viewport,
        out: &mut FlowOutput,
    ) -> usize {
        let sequence = self.cx.sequence;
        let config = self.cx.config;
        let perspective = sequence.local_perspective();
        let mut pos = req.start;
        while pos < req.limit {
            if viewport.remaining_height() < config.default_line_height {
                break;
            }
            let Some(found) = sequence.containing_segment(pos, perspective) else {
                break;
            };
            match classify(found.segment) {
                Step::Table(table) => {
                    pos = self.render_table(pos, table, req, viewport, out) + 1;
                    viewport.vskip(config.table_vspace);
                }
                Step::BlockComponent(id) => {
                    self.render_block_component(pos, id, req, viewport, out);
                    pos += 1;
                }
                Step::RegionEnd | Step::Skip => pos += 1,
                Step::Paragraph => {
                    let tile = sequence
                        .find_tile(pos, Label::Paragraph, false)
                        .filter(|tile| tile.pos < req.limit);
                    let Some(tile) = tile else {
                        let err = Error::missing_tile(pos);
                        tracing::warn!("{err}");
                        out.diagnostics.push(err);
                        pos = req.limit;
                        break;
                    };
                    self.render_paragraph(pos, tile.pos, tile.segment, req, viewport, out);
                    pos = tile.pos + 1;
                    viewport.vskip(config.pg_vspace);
                }
            }
        }
        pos
    }

    fn render_block_component(
        &mut self,
        pos: usize,
        id: ComponentId,
        req: &FlowRequest<'_>,
        viewport: &mut Viewport,
        out: &mut FlowOutput,
    ) {
        let config = self.cx.config;
        let (height, state) = match self.cx.components.get(id) {
            Some(ComponentTask::Ready(component)) => {
                let height = component
                    .height_in_lines()
                    .filter(|_| component.query(Capability::Layout))
                    .map_or(config.block_component_fallback_height, |lines| {
                        (lines * config.default_line_height).ceil()
                    });
                (height, ComponentState::Ready)
            }
            Some(ComponentTask::Pending) => {
                (config.pending_component_height, ComponentState::Pending)
            }
            None => {
                out.request_component(id);
                (config.pending_component_height, ComponentState::Pending)
            }
            Some(ComponentTask::Failed(cause)) => {
                let marker = self
                    .cx
                    .sequence
                    .containing_segment(pos, self.cx.sequence.local_perspective())
                    .map(|found| found.segment.id)
                    .unwrap_or_default();
                let err = Error::async_load_failure(id, marker, pos);
                tracing::warn!("{err}: {cause}");
                out.diagnostics.push(err);
                (config.default_line_height, ComponentState::Failed)
            }
        };
        if !req.defer {
            out.note_shown(pos, pos + 1);
            out.lines.push(LineBox {
                start: pos,
                end: pos + 1,
                x: 0.0,
                y: viewport.line_top(),
                width: viewport.width(),
                height,
                indent_width: 0.0,
                break_index: 0,
                paragraph: None,
                font: config.font.clone(),
                indent_symbol: None,
                kind: LineKind::Block {
                    component: id,
                    state,
                },
            });
        }
        viewport.vskip(height);
    }

    fn render_paragraph(
        &mut self,
        start: usize,
        tile_pos: usize,
        tile: &Segment,
        req: &FlowRequest<'_>,
        viewport: &mut Viewport,
        out: &mut FlowOutput,
    ) {
        let config = self.cx.config;
        let props = tile.props().cloned().unwrap_or_default();
        let font = config.paragraph_font(props.header).clone();
        let line_height = config.line_height(props.header);
        let metrics = ParagraphMetrics {
            indent_pct: props.indent_pct,
            content_pct: props.content_pct,
            two_em: self.cx.measure.measure("MM", &config.font),
            indent_width_threshold: config.indent_width_threshold,
        };

        let mut cache = match self.caches.take_paragraph(tile.id) {
            Some(cache) if cache.is_valid() && cache.items.len == tile_pos - start => cache,
            _ => {
                let pieces = self.collect_pieces(start, tile_pos);
                let items = itemize_paragraph(
                    &pieces,
                    &font,
                    self.cx.measure,
                    self.cx.typesetter,
                    self.cx.components,
                    config,
                );
                self.caches.note_itemized();
                ParagraphLayoutCache::new(items)
            }
        };
        for id in &cache.items.components {
            if self.cx.components.get(*id).is_none() {
                out.request_component(*id);
            }
        }

        let start_offset = if !req.defer
            && req.requested_position > start
            && req.requested_position <= tile_pos
        {
            req.requested_position - start
        } else {
            0
        };

        let reusable = viewport.line_x() == 0.0
            && !viewport.has_exclusions_below(viewport.line_top());
        let breaks = match cache
            .breaks_for(viewport.width(), &metrics)
            .filter(|_| reusable)
        {
            Some(lines) => {
                self.caches.note_reused();
                lines.to_vec()
            }
            None => {
                let options = BreakOptions {
                    base: start,
                    start_offset,
                    min_line_height: line_height,
                    trailing: (tile_pos + 1 - start).saturating_sub(cache.items.len),
                    metrics,
                    config,
                    moving: self.cx.moving,
                };
                let outcome = BreakLines::new(&cache.items.items, viewport, options).break_all();
                self.caches.note_broken();
                out.diagnostics.extend(outcome.diagnostics);
                cache.breaks = outcome.uniform_width.map(|width| CachedBreaks {
                    width,
                    metrics,
                    lines: outcome.lines.clone(),
                });
                outcome.lines
            }
        };

        self.place_lines(
            &breaks,
            &cache.items.items,
            start,
            tile_pos,
            start_offset,
            &metrics,
            &font,
            props.list_symbol.as_deref(),
            tile,
            req,
            viewport,
            out,
        );
        self.caches.put_paragraph(tile.id, cache);
    }

    fn collect_pieces(&self, start: usize, end: usize) -> Vec<ParagraphPiece<'a>> {
        let sequence: &'a S = self.cx.sequence;
        let mut pieces = Vec::new();
        sequence.visit_range(
            start..end,
            sequence.local_perspective(),
            &mut |segment, seg_start| {
                let from = start.saturating_sub(seg_start);
                let to = (end - seg_start).min(segment.len());
                if from < to {
                    pieces.push(ParagraphPiece {
                        segment,
                        range: from..to,
                    });
                }
                true
            },
        );
        pieces
    }

    /// Writes broken lines into the viewport and produces their boxes.
    fn place_lines(
        &self,
        breaks: &[LineBreak],
        items: &[Item],
        start: usize,
        tile_pos: usize,
        start_offset: usize,
        metrics: &ParagraphMetrics,
        font: &Font,
        list_symbol: Option<&str>,
        tile: &Segment,
        req: &FlowRequest<'_>,
        viewport: &mut Viewport,
        out: &mut FlowOutput,
    ) {
        let config = self.cx.config;
        let mut last_height = 0.0;
        for (index, brk) in breaks.iter().enumerate() {
            if viewport.remaining_height() < config.default_line_height {
                break;
            }
            let rect = viewport.line_rect(brk.height);
            let indent = metrics.indent(rect.width);
            let content_width = metrics.content_width(rect.width);
            let line_start = start + brk.start;
            let line_end = start + brk.end;
            if content_width > rect.width {
                let err = Error::layout_inconsistency(line_start, content_width, rect.width);
                tracing::warn!("paragraph content wider than its line: {err}");
                out.diagnostics.push(err);
            }
            if let Some(marker) = rect.settle {
                let float_left = viewport
                    .exclusions()
                    .iter()
                    .any(|ex| ex.id == marker && ex.float_left);
                let anchor = if float_left {
                    line_start
                } else {
                    line_end.min(tile_pos)
                };
                tracing::debug!("inclusion {marker:?} settles at {anchor}");
                out.settled.push(SettledInclusion { marker, anchor });
                viewport.mark_settled(marker);
            }
            last_height = brk.height;

            if start_offset > 0 && brk.end <= start_offset {
                out.deferred_height += brk.height;
                viewport.reset_top();
                continue;
            }
            if !req.defer {
                let fragments = self.fragments(&items[brk.items.clone()], start, out);
                out.note_shown(line_start, line_end);
                out.lines.push(LineBox {
                    start: line_start,
                    end: line_end,
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: brk.height,
                    indent_width: indent,
                    break_index: index,
                    paragraph: Some(tile.id),
                    font: font.clone(),
                    indent_symbol: if index == 0 {
                        list_symbol.map(str::to_owned)
                    } else {
                        None
                    },
                    kind: LineKind::Text { fragments },
                });
            }
            viewport.commit_line(brk.height, rect.eol);
        }
        viewport.end_of_paragraph(last_height);
    }

    fn fragments(&self, items: &[Item], base: usize, out: &mut FlowOutput) -> Vec<Fragment> {
        let mut x = 0.0;
        let mut fragments = Vec::with_capacity(items.len());
        for item in items {
            let start = base + item.start;
            let kind = match &item.kind {
                ItemKind::Text(run) => FragmentKind::Text(run.clone()),
                ItemKind::Glue => FragmentKind::Glue,
                ItemKind::Math { source } => FragmentKind::Math {
                    source: self.splice_cursor(source, start, base + item.end() - 1),
                },
                ItemKind::Marker(MarkerItem { segment, kind }) => match kind {
                    MarkerKind::Component { id, state } => {
                        if *state == ComponentState::Failed {
                            let err = Error::async_load_failure(*id, *segment, start);
                            tracing::warn!("{err}");
                            out.diagnostics.push(err);
                        }
                        FragmentKind::Component {
                            id: *id,
                            state: *state,
                        }
                    }
                    MarkerKind::Overlay => {
                        out.overlay_markers.push(OverlayMarker {
                            marker: *segment,
                            position: start,
                        });
                        FragmentKind::Marker(*segment)
                    }
                    MarkerKind::Plain | MarkerKind::Inclusion { .. } => {
                        FragmentKind::Marker(*segment)
                    }
                },
            };
            fragments.push(Fragment {
                start,
                end: base + item.end(),
                x,
                width: item.width,
                kind,
            });
            x += item.width;
        }
        fragments
    }

    /// Splices the cursor token into math source when the cursor lies after
    /// the begin marker and at or before the end marker.
    fn splice_cursor(&self, source: &str, begin: usize, end_marker: usize) -> String {
        match self.cx.cursor {
            Some(cursor) if cursor > begin && cursor <= end_marker => {
                let offset = cursor - begin - 1;
                let split = source
                    .char_indices()
                    .nth(offset)
                    .map_or(source.len(), |(index, _)| index);
                let mut spliced =
                    String::with_capacity(source.len() + self.cx.config.cursor_token.len());
                spliced.push_str(&source[..split]);
                spliced.push_str(&self.cx.config.cursor_token);
                spliced.push_str(&source[split..]);
                spliced
            }
            _ => source.to_owned(),
        }
    }
}
