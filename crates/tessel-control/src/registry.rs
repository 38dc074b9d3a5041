// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Worker registry with priority ordering.

use crate::worker::unit::WorkerUnit;
use crate::worker::{SchedulingPolicy, WorkerStatus};
use tessel_core::WorkerId;

/// Owns every registered worker unit, sorted by priority (highest first).
///
/// Units with equal priority keep their registration order.
#[derive(Default)]
pub struct WorkerRegistry {
    units: Vec<WorkerUnit>,
}

impl WorkerRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self { units: Vec::new() }
    }

    /// Inserts a unit at its priority position and returns that position.
    pub(crate) fn register(&mut self, unit: WorkerUnit) -> usize {
        log::info!(
            "WorkerRegistry: Registered '{}' ({:?}, priority={:.2})",
            unit.name(),
            unit.policy(),
            unit.priority()
        );

        // Stable: after every unit with a priority >= the new one.
        let index = self
            .units
            .partition_point(|existing| existing.priority() >= unit.priority());
        self.units.insert(index, unit);
        index
    }

    /// Returns the number of registered workers.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if no workers are registered.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub(crate) fn remove(&mut self, index: usize) -> WorkerUnit {
        self.units.remove(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut WorkerUnit> {
        self.units.get_mut(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &WorkerUnit> {
        self.units.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut WorkerUnit> {
        self.units.iter_mut()
    }

    /// Units scheduled with `policy`, in priority order.
    pub(crate) fn with_policy(
        &self,
        policy: SchedulingPolicy,
    ) -> impl Iterator<Item = &WorkerUnit> {
        self.units.iter().filter(move |unit| unit.policy() == policy)
    }

    /// Returns the status of the worker with the given ID, if registered.
    pub fn status_of(&self, id: WorkerId) -> Option<WorkerStatus> {
        self.units
            .iter()
            .find(|unit| unit.id() == id)
            .map(WorkerUnit::status)
    }

    /// Statuses of every worker, in priority order.
    pub fn statuses(&self) -> Vec<WorkerStatus> {
        self.units.iter().map(WorkerUnit::status).collect()
    }
}

impl std::fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.units.iter().map(WorkerUnit::name))
            .finish()
    }
}
