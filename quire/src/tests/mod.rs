// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod test_position;
mod test_schedule;
mod test_viewport;
mod utils;
