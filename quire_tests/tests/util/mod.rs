// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod asserts;
mod samples;

pub(crate) use asserts::{assert_lines_ordered, line_texts};
pub(crate) use samples::{engine, DocBuilder, ADVANCE, LINE_HEIGHT, PG_VSPACE};
