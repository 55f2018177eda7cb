// Copyright 2026 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Load state of embedded components.

use hashbrown::HashMap;

use crate::inputs::{ComponentError, ComponentId, EmbeddedComponent};

/// The load task of one component.
pub enum ComponentTask {
    /// The host is loading the component.
    Pending,
    /// The component is loaded.
    Ready(Box<dyn EmbeddedComponent>),
    /// Loading failed.
    Failed(ComponentError),
}

impl core::fmt::Debug for ComponentTask {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Ready(_) => f.write_str("Ready(..)"),
            Self::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
        }
    }
}

/// Component load tasks keyed by component id.
///
/// Layout polls this table; it never holds callbacks. Components that layout
/// meets without a task are reported in
/// [`RenderOutput::requested_components`](crate::RenderOutput::requested_components)
/// and become [`ComponentTask::Pending`] until the host resolves them.
#[derive(Debug, Default)]
pub struct ComponentTasks {
    tasks: HashMap<ComponentId, ComponentTask>,
}

impl ComponentTasks {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The task for `id`, if loading was requested.
    pub fn get(&self, id: ComponentId) -> Option<&ComponentTask> {
        self.tasks.get(&id)
    }

    /// The loaded component for `id`.
    pub fn ready(&self, id: ComponentId) -> Option<&dyn EmbeddedComponent> {
        match self.tasks.get(&id) {
            Some(ComponentTask::Ready(component)) => Some(component.as_ref()),
            _ => None,
        }
    }

    /// Marks `id` as loading. Returns `false` if a task already exists.
    pub fn request(&mut self, id: ComponentId) -> bool {
        if self.tasks.contains_key(&id) {
            return false;
        }
        self.tasks.insert(id, ComponentTask::Pending);
        true
    }

    /// Records the outcome of loading `id`.
    pub fn resolve(
        &mut self,
        id: ComponentId,
        result: Result<Box<dyn EmbeddedComponent>, ComponentError>,
    ) {
        let task = match result {
            Ok(component) => ComponentTask::Ready(component),
            Err(err) => ComponentTask::Failed(err),
        };
        self.tasks.insert(id, task);
    }

    /// Forgets the task for `id`.
    pub fn remove(&mut self, id: ComponentId) -> Option<ComponentTask> {
        self.tasks.remove(&id)
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if there are no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
