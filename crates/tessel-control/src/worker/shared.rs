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

//! State shared between a worker thread, the orchestrator, and handles.

use super::{SchedulingPolicy, WorkerState, WorkerStatus};
use crate::completion::Task;
use crate::signal::SignalSet;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;
use tessel_core::{CommandError, WorkerId};

pub(crate) struct UnitShared {
    pub(crate) id: WorkerId,
    pub(crate) name: String,
    pub(crate) policy: SchedulingPolicy,
    pub(crate) priority: f32,
    methods: HashSet<String>,
    state: AtomicU8,
    // Cleared to make the loop exit.
    running: AtomicBool,
    // Set once by `request_stop`; the unit no longer accepts commands.
    stopped: AtomicBool,
    inbox: Mutex<VecDeque<Task>>,
    // Sync signal used to unblock a waiting thread on stop.
    wake: OnceLock<SignalSet>,
    cycles: AtomicU64,
    failed_steps: AtomicU64,
    failed_commands: AtomicU64,
    last_step_us: AtomicU64,
}

impl UnitShared {
    pub(crate) fn new(
        name: String,
        policy: SchedulingPolicy,
        priority: f32,
        methods: HashSet<String>,
    ) -> Self {
        Self {
            id: WorkerId::new(),
            name,
            policy,
            priority,
            methods,
            state: AtomicU8::new(WorkerState::Init as u8),
            running: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            inbox: Mutex::new(VecDeque::new()),
            wake: OnceLock::new(),
            cycles: AtomicU64::new(0),
            failed_steps: AtomicU64::new(0),
            failed_commands: AtomicU64::new(0),
            last_step_us: AtomicU64::new(0),
        }
    }

    pub(crate) fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: WorkerState) {
        let previous = WorkerState::from_u8(self.state.swap(state as u8, Ordering::AcqRel));
        if previous != state {
            log::trace!("Worker '{}': {} -> {}", self.name, previous, state);
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub(crate) fn install_wake(&self, signal: SignalSet) {
        if self.wake.set(signal).is_err() {
            log::warn!("Worker '{}': wake signal installed twice.", self.name);
        }
    }

    /// Clears the running flag and sends the final sync signal.
    pub(crate) fn request_stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.set_running(false);
        if let Some(wake) = self.wake.get() {
            wake.set();
        }
        log::debug!("Worker '{}': stop requested.", self.name);
    }

    /// Checks that a command can be queued on this unit.
    pub(crate) fn accept(&self, method: &str) -> Result<(), CommandError> {
        if !self.policy.has_thread() || self.is_stopped() {
            return Err(CommandError::NotAccepting {
                worker: self.name.clone(),
            });
        }
        if !self.methods.contains(method) {
            return Err(CommandError::UnknownMethod {
                worker: self.name.clone(),
                method: method.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn push(&self, task: Task) {
        self.lock_inbox().push_back(task);
    }

    /// Takes every queued task, oldest first. Tasks pushed afterwards wait
    /// for the next cycle.
    pub(crate) fn take_tasks(&self) -> VecDeque<Task> {
        std::mem::take(&mut *self.lock_inbox())
    }

    pub(crate) fn record_cycle(&self, step: Duration, step_failed: bool) {
        self.cycles.fetch_add(1, Ordering::AcqRel);
        self.last_step_us
            .store(step.as_micros() as u64, Ordering::Release);
        if step_failed {
            self.failed_steps.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub(crate) fn record_failed_command(&self) {
        self.failed_commands.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn status(&self) -> WorkerStatus {
        WorkerStatus {
            id: self.id,
            name: self.name.clone(),
            policy: self.policy,
            priority: self.priority,
            state: self.state(),
            cycles: self.cycles.load(Ordering::Acquire),
            failed_steps: self.failed_steps.load(Ordering::Acquire),
            failed_commands: self.failed_commands.load(Ordering::Acquire),
            queued: self.lock_inbox().len(),
            last_step: Duration::from_micros(self.last_step_us.load(Ordering::Acquire)),
        }
    }

    fn lock_inbox(&self) -> MutexGuard<'_, VecDeque<Task>> {
        self.inbox.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
