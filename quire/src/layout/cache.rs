// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout caches kept in side tables keyed by segment id.

use core::ops::Range;

use hashbrown::HashMap;

use crate::inputs::{ComponentId, Sequence};
use crate::itemize::ParagraphItems;
use crate::layout::line_break::{LineBreak, ParagraphMetrics};
use crate::layout::table::TableLayout;
use crate::segment::{Label, SegmentId};

/// Line breaks that can be replayed without breaking again.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedBreaks {
    /// Width every line was broken against.
    pub width: f32,
    /// Metrics the lines were broken with.
    pub metrics: ParagraphMetrics,
    /// The lines.
    pub lines: Vec<LineBreak>,
}

/// Cached layout of one paragraph, keyed by its tile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParagraphLayoutCache {
    /// Itemized content.
    pub items: ParagraphItems,
    /// Breaks, kept only when no exclusion shaped them.
    pub breaks: Option<CachedBreaks>,
    valid: bool,
}

impl ParagraphLayoutCache {
    /// A valid cache holding `items`.
    pub fn new(items: ParagraphItems) -> Self {
        Self {
            items,
            breaks: None,
            valid: true,
        }
    }

    /// Whether the items still describe the paragraph.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Cached breaks usable at `width` with `metrics`.
    pub fn breaks_for(&self, width: f32, metrics: &ParagraphMetrics) -> Option<&[LineBreak]> {
        self.breaks
            .as_ref()
            .filter(|b| b.width == width && b.metrics == *metrics)
            .map(|b| b.lines.as_slice())
    }

    fn invalidate(&mut self) {
        self.valid = false;
        self.breaks = None;
    }
}

/// Counters of cache activity since the caches were created.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Paragraphs itemized.
    pub itemized: usize,
    /// Paragraphs broken into lines.
    pub broken: usize,
    /// Paragraphs whose breaks were replayed.
    pub reused: usize,
    /// Tables whose structure was parsed.
    pub tables_parsed: usize,
}

/// Side tables of paragraph and table layouts.
#[derive(Clone, Debug, Default)]
pub struct LayoutCaches {
    paragraphs: HashMap<SegmentId, ParagraphLayoutCache>,
    tables: HashMap<SegmentId, TableLayout>,
    stats: CacheStats,
}

impl LayoutCaches {
    /// Creates empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache activity so far.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// The valid cache of the paragraph ending at `tile`.
    pub fn paragraph(&self, tile: SegmentId) -> Option<&ParagraphLayoutCache> {
        self.paragraphs.get(&tile).filter(|cache| cache.valid)
    }

    /// Returns `true` if the paragraph ending at `tile` has a valid cache.
    pub fn is_valid(&self, tile: SegmentId) -> bool {
        self.paragraph(tile).is_some()
    }

    pub(crate) fn take_paragraph(&mut self, tile: SegmentId) -> Option<ParagraphLayoutCache> {
        self.paragraphs.remove(&tile)
    }

    pub(crate) fn put_paragraph(&mut self, tile: SegmentId, cache: ParagraphLayoutCache) {
        self.paragraphs.insert(tile, cache);
    }

    pub(crate) fn table(&self, table: SegmentId) -> Option<&TableLayout> {
        self.tables.get(&table)
    }

    pub(crate) fn put_table(&mut self, table: SegmentId, layout: TableLayout) {
        self.stats.tables_parsed += 1;
        self.tables.insert(table, layout);
    }

    pub(crate) fn note_itemized(&mut self) {
        self.stats.itemized += 1;
    }

    pub(crate) fn note_broken(&mut self) {
        self.stats.broken += 1;
    }

    pub(crate) fn note_reused(&mut self) {
        self.stats.reused += 1;
    }

    /// Invalidates the paragraph ending at `tile`.
    pub fn invalidate_paragraph(&mut self, tile: SegmentId) {
        if let Some(cache) = self.paragraphs.get_mut(&tile) {
            tracing::trace!("invalidating paragraph {tile:?}");
            cache.invalidate();
        }
    }

    /// Forgets the structure of `table`.
    pub fn invalidate_table(&mut self, table: SegmentId) {
        if self.tables.remove(&table).is_some() {
            tracing::trace!("invalidating table {table:?}");
        }
    }

    /// Invalidates every paragraph and table touched by an edit of `range`.
    ///
    /// The paragraphs containing either end of the range and every paragraph
    /// tile inside it are invalidated, together with all tables enclosing
    /// the range start.
    pub fn invalidate_range<S: Sequence + ?Sized>(&mut self, sequence: &S, range: Range<usize>) {
        for pos in [range.start, range.end] {
            if let Some(tile) = sequence.find_tile(pos, Label::Paragraph, false) {
                self.invalidate_paragraph(tile.segment.id);
            }
        }
        if !range.is_empty() {
            let perspective = sequence.local_perspective();
            let mut tiles = Vec::new();
            sequence.visit_range(range.clone(), perspective, &mut |segment, _| {
                if segment.is_tile(Label::Paragraph) {
                    tiles.push(segment.id);
                }
                true
            });
            for tile in tiles {
                self.invalidate_paragraph(tile);
            }
        }
        let stack = sequence.stack_context(range.start, &[Label::Table]);
        for entry in &stack.entries {
            self.invalidate_table(entry.segment);
        }
    }

    /// Invalidates the caches of removed segments.
    pub fn invalidate_segments(&mut self, segments: &[SegmentId]) {
        for id in segments {
            self.invalidate_paragraph(*id);
            self.invalidate_table(*id);
        }
    }

    /// Invalidates paragraphs that display `component` inline.
    pub fn invalidate_component(&mut self, component: ComponentId) {
        for (tile, cache) in &mut self.paragraphs {
            if cache.items.components.contains(&component) {
                tracing::trace!("invalidating paragraph {tile:?} for component {component:?}");
                cache.invalidate();
            }
        }
    }

    /// Invalidates every cache, e.g. after a configuration change.
    pub fn invalidate_all(&mut self) {
        for cache in self.paragraphs.values_mut() {
            cache.invalidate();
        }
        self.tables.clear();
    }

    /// Drops caches of segments that no longer exist.
    pub fn prune<S: Sequence + ?Sized>(&mut self, sequence: &S) {
        self.paragraphs
            .retain(|tile, _| sequence.segment(*tile).is_some());
        self.tables.retain(|table, _| sequence.segment(*table).is_some());
    }

    /// Number of paragraph caches, valid or not.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }
}
