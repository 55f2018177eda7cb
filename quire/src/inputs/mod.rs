// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator interfaces the engine consumes.

mod component;
mod measure;
mod sequence;

pub use component::{Capability, ComponentError, ComponentId, DisplayType, EmbeddedComponent};
pub use measure::{Font, MathTypesetter, MonospaceMeasure, TextMeasure};
pub use sequence::{
    ClientId, DeltaKind, EditableSequence, LocationHandle, Perspective, SegmentOffset, SeqNum,
    Sequence, SequenceDelta, StackContext, StackEntry, TileHit,
};
