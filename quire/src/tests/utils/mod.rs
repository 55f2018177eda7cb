// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod samples;

pub(crate) use samples::{text_items, text_line, TestEnv, ADVANCE, LINE_HEIGHT};
