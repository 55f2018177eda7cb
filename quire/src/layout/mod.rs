// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line breaking, viewport geometry and flow layout.

mod cache;
mod flow;
mod line_break;
mod table;
mod viewport;

pub use cache::{CacheStats, CachedBreaks, LayoutCaches, ParagraphLayoutCache};
pub use flow::{FlowContext, FlowOutput, FlowRenderer, FlowRequest};
pub use line_break::{BreakLines, BreakOptions, BreakOutcome, LineBreak, ParagraphMetrics};
pub use table::{CellLayout, RowLayout, TableLayout};
pub use viewport::{ExclusionRect, LineRect, MovingInclusion, Viewport};
