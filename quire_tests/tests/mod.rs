// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the integration test suite for `quire`.
//!
//! - The `util` module contains shared document builders, the fixed-advance
//!   measurement every test lays out with, and assertion helpers.
//! - We do not use the default Rust test harness, but instead use this `mod.rs` file as the
//!   entry point to run all other tests, so that the utilities can be shared.
//! - Documents are built with `quire_sequence::SharedSequence`. Every character is
//!   10px wide and body lines are 22px tall under the default configuration.
//! - If you want to add new tests, put them into the module of their topic (flow, wrap,
//!   tables, position, presence, cache, engine), or into `properties.rs` when they are
//!   property tests over generated documents. Put the topic at the start of the test name,
//!   e.g. `presence_stale_update_ignored` rather than `stale_presence_update_ignored`.

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

mod cache;
mod engine;
mod tables;
mod util;
