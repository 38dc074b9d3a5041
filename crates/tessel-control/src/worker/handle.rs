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

use super::shared::UnitShared;
use super::{SchedulingPolicy, Worker, WorkerState, WorkerStatus};
use crate::completion::{CommandCallback, Task};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tessel_core::{CommandError, CommandRecord, CommandResult, WorkerId};

/// A cloneable, thread-safe handle to a registered worker.
///
/// Commands enqueued through a handle run on the worker's thread during its
/// next cycle. Callbacks run later, on the orchestrator's thread, when the
/// completion is drained at the end of a tick.
pub struct WorkerHandle<T> {
    shared: Arc<UnitShared>,
    _worker: PhantomData<fn() -> T>,
}

impl<T: Worker> WorkerHandle<T> {
    pub(crate) fn new(shared: Arc<UnitShared>) -> Self {
        Self {
            shared,
            _worker: PhantomData,
        }
    }

    /// The worker's identifier.
    pub fn id(&self) -> WorkerId {
        self.shared.id
    }

    /// The worker's name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The policy chosen at registration.
    pub fn policy(&self) -> SchedulingPolicy {
        self.shared.policy
    }

    /// The worker's current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.shared.state()
    }

    /// A snapshot of the worker's counters.
    pub fn status(&self) -> WorkerStatus {
        self.shared.status()
    }

    /// Queues `command`, with an optional callback for its result.
    ///
    /// ## Errors
    /// * `CommandError::UnknownMethod` - If the worker registered no such command.
    /// * `CommandError::NotAccepting` - If the worker has no thread or was stopped.
    pub fn enqueue(
        &self,
        command: CommandRecord,
        callback: Option<CommandCallback>,
    ) -> Result<(), CommandError> {
        self.shared.accept(command.method())?;
        log::trace!(
            "Worker '{}': queued '{}' ({} args).",
            self.shared.name,
            command.method(),
            command.arguments().len()
        );
        self.shared.push(Task::new(command, callback));
        Ok(())
    }

    /// Queues `command` without a callback.
    pub fn send(&self, command: CommandRecord) -> Result<(), CommandError> {
        self.enqueue(command, None)
    }

    /// Queues `command` and calls `on_result` with its result.
    pub fn call<F>(&self, command: CommandRecord, on_result: F) -> Result<(), CommandError>
    where
        F: FnOnce(CommandResult) + Send + 'static,
    {
        self.enqueue(command, Some(Box::new(on_result)))
    }

    /// Asks the worker to leave its loop after the current cycle.
    ///
    /// The thread is joined, and teardown observed, when the orchestrator
    /// shuts down.
    pub fn stop(&self) {
        self.shared.request_stop();
    }
}

impl<T> Clone for WorkerHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            _worker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for WorkerHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("policy", &self.shared.policy)
            .finish()
    }
}
