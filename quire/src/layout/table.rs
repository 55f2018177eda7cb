// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Table structure and row layout.

use crate::error::Error;
use crate::inputs::Sequence;
use crate::layout::flow::{FlowOutput, FlowRenderer, FlowRequest};
use crate::layout::viewport::Viewport;
use crate::outputs::{CellBox, LineBox, LineKind, RowBox};
use crate::segment::{Label, Segment};

/// Structure of one table. Offsets are relative to the table begin marker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableLayout {
    /// Offset of the table end marker.
    pub end: usize,
    /// Column widths as fractions of the table width.
    pub column_widths: Option<Vec<f32>>,
    /// Left offset as a fraction of the enclosing width.
    pub indent_pct: f32,
    /// Width as a fraction of the enclosing width.
    pub content_pct: f32,
    /// Rows in order, including moribund ones.
    pub rows: Vec<RowLayout>,
}

/// Structure of one row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowLayout {
    /// Offset of the row begin marker.
    pub begin: usize,
    /// Offset of the row end marker.
    pub end: usize,
    /// The row is pending removal.
    pub moribund: bool,
    /// Cells in order, including moribund ones.
    pub cells: Vec<CellLayout>,
}

/// Structure of one cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CellLayout {
    /// Offset of the cell begin marker.
    pub begin: usize,
    /// Offset of the cell end marker.
    pub end: usize,
    /// The cell is pending removal.
    pub moribund: bool,
}

impl TableLayout {
    /// Reads the structure of the table whose begin marker is at `begin`.
    /// Nested tables are skipped. Returns `None` if the table is not closed.
    pub fn parse<S: Sequence + ?Sized>(
        sequence: &S,
        table: &Segment,
        begin: usize,
    ) -> Option<Self> {
        let props = table.props().cloned().unwrap_or_default();
        let mut layout = Self {
            column_widths: props.column_widths,
            indent_pct: props.indent_pct,
            content_pct: props.content_pct,
            ..Self::default()
        };
        let mut depth = 0_usize;
        let mut row: Option<RowLayout> = None;
        let mut cell: Option<CellLayout> = None;
        let mut closed = false;
        let perspective = sequence.local_perspective();
        sequence.visit_range(begin..sequence.len(), perspective, &mut |segment, pos| {
            let offset = pos - begin;
            if segment.is_range_begin(Label::Table) {
                depth += 1;
            } else if segment.is_range_end(Label::Table) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    layout.end = offset;
                    closed = true;
                    return false;
                }
            } else if depth == 1 {
                if segment.is_range_begin(Label::Row) {
                    row = Some(RowLayout {
                        begin: offset,
                        moribund: segment.is_moribund(),
                        ..RowLayout::default()
                    });
                } else if segment.is_range_end(Label::Row) {
                    if let Some(mut done) = row.take() {
                        done.end = offset;
                        layout.rows.push(done);
                    }
                } else if segment.is_range_begin(Label::Cell) {
                    cell = Some(CellLayout {
                        begin: offset,
                        end: offset,
                        moribund: segment.is_moribund(),
                    });
                } else if segment.is_range_end(Label::Cell) {
                    if let (Some(mut done), Some(open_row)) = (cell.take(), row.as_mut()) {
                        done.end = offset;
                        open_row.cells.push(done);
                    }
                }
            }
            true
        });
        closed.then_some(layout)
    }

    /// Left offset and width of the table in an enclosing `width`.
    pub fn extent(&self, width: f32) -> (f32, f32) {
        let indent = (self.indent_pct * width).floor();
        let table_width = (self.content_pct * width).floor();
        (indent, table_width)
    }

    /// Widths of the live cells of `row` in a table `width` wide.
    pub fn cell_widths(&self, row: &RowLayout, width: f32) -> Vec<f32> {
        let live = row.cells.iter().filter(|cell| !cell.moribund).count();
        match &self.column_widths {
            Some(fractions) if fractions.len() >= live && live > 0 => fractions[..live]
                .iter()
                .map(|fraction| (fraction * width).floor())
                .collect(),
            _ if live > 0 => {
                #[allow(clippy::cast_precision_loss, reason = "cell counts are tiny")]
                let each = (width / live as f32).floor();
                vec![each; live]
            }
            _ => Vec::new(),
        }
    }
}

impl<S: Sequence + ?Sized> FlowRenderer<'_, S> {
    /// Lays out the table whose begin marker is at `begin`, row by row.
    /// Returns the position of the table end marker.
    pub(crate) fn render_table(
        &mut self,
        begin: usize,
        table: &Segment,
        req: &FlowRequest<'_>,
        viewport: &mut Viewport,
        out: &mut FlowOutput,
    ) -> usize {
        let layout = match self.caches.table(table.id) {
            Some(layout) => layout.clone(),
            None => match TableLayout::parse(self.cx.sequence, table, begin) {
                Some(layout) => {
                    self.caches.put_table(table.id, layout.clone());
                    layout
                }
                None => {
                    let err = Error::missing_tile(begin);
                    tracing::warn!("unterminated table: {err}");
                    out.diagnostics.push(err);
                    return self.cx.sequence.len();
                }
            },
        };
        let config = self.cx.config;
        let end = begin + layout.end;

        // Descend towards the requested position if it lies in this table.
        let (start_row, start_cell, rest) = match req.stack {
            [table_entry, row_entry, cell_entry, rest @ ..]
                if table_entry.segment == table.id
                    && row_entry.label == Label::Row
                    && cell_entry.label == Label::Cell =>
            {
                (
                    layout
                        .rows
                        .iter()
                        .position(|row| begin + row.begin == row_entry.pos),
                    Some(cell_entry.pos),
                    rest,
                )
            }
            _ => (None, None, &[][..]),
        };

        let (table_x, table_width) = layout.extent(viewport.width());
        for row in &layout.rows[start_row.unwrap_or(0)..] {
            if row.moribund {
                continue;
            }
            if viewport.remaining_height() < config.default_line_height {
                break;
            }
            let row_top = viewport.line_top();
            let widths = layout.cell_widths(row, table_width);
            let mut cells = Vec::with_capacity(widths.len());
            let mut cell_x = table_x;
            let mut row_height: f32 = 0.0;
            for (cell, width) in row.cells.iter().filter(|cell| !cell.moribund).zip(widths) {
                let cell_begin = begin + cell.begin;
                let cell_end = begin + cell.end;
                let content_start = cell_begin + 1;
                let is_start_cell = start_cell == Some(cell_begin);

                let mut sub = Viewport::new(
                    (width - 2.0 * config.cell_h_margin).max(0.0),
                    viewport.remaining_height(),
                );
                sub.vskip(config.cell_top_margin);
                let sub_req = if is_start_cell {
                    let start = match rest.first() {
                        Some(nested) => nested.pos,
                        None => self
                            .paragraph_start(req.requested_position)
                            .max(content_start),
                    };
                    FlowRequest {
                        start,
                        requested_position: req.requested_position,
                        defer: req.defer,
                        limit: cell_end,
                        stack: rest,
                    }
                } else {
                    FlowRequest {
                        start: content_start,
                        requested_position: content_start,
                        defer: req.defer,
                        limit: cell_end,
                        stack: &[],
                    }
                };
                let mut sub_out = FlowOutput::default();
                self.render_flow(&sub_req, &mut sub, &mut sub_out);

                let mut content_height = sub.line_top();
                if content_start >= cell_end {
                    content_height =
                        content_height.max(config.cell_top_margin + config.default_line_height);
                }
                let cell_height = content_height + config.cell_vspace;
                row_height = row_height.max(cell_height);

                let lines = out.absorb(sub_out, cell_x + config.cell_h_margin, row_top);
                cells.push(CellBox {
                    start: cell_begin,
                    end: cell_end + 1,
                    x: cell_x,
                    width,
                    height: cell_height,
                    lines,
                });
                cell_x += width;
            }

            // The row is committed only once every cell has been measured.
            for cell in &mut cells {
                cell.height = row_height;
            }
            if !req.defer {
                out.note_shown(begin + row.begin, begin + row.end + 1);
                out.lines.push(LineBox {
                    start: begin + row.begin,
                    end: begin + row.end + 1,
                    x: table_x,
                    y: row_top,
                    width: table_width,
                    height: row_height,
                    indent_width: 0.0,
                    break_index: 0,
                    paragraph: None,
                    font: config.font.clone(),
                    indent_symbol: None,
                    kind: LineKind::Row(RowBox { cells }),
                });
            }
            viewport.vskip(row_height);
        }
        end
    }
}
