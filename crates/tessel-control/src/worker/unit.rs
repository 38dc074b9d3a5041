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

//! The type-erased worker unit owned by the orchestrator, and the loop its
//! thread runs.

use super::commands::CommandTable;
use super::handle::WorkerHandle;
use super::shared::UnitShared;
use super::{panic_message, SchedulingPolicy, Worker, WorkerState, WorkerStatus};
use crate::completion::{CompletedTask, CompletionQueue, Task};
use crate::config::SchedulerConfig;
use crate::error::ControlError;
use crate::signal::{self, SignalClosed, SignalSet, SignalWait};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tessel_core::CommandResult;

/// What the orchestrator needs to start a unit.
pub(crate) struct LaunchContext<'a> {
    pub(crate) config: &'a SchedulerConfig,
    pub(crate) completions: &'a Arc<CompletionQueue>,
}

type Launcher = Box<dyn FnOnce(&LaunchContext<'_>) -> Result<UnitPhase, ControlError> + Send>;

enum UnitPhase {
    /// Registered before load; setup and thread start are deferred.
    Pending(Launcher),
    /// A `SyncService` or `SyncRenderService` thread.
    Synced {
        sync: SignalSet,
        finish: SignalWait,
        thread: JoinHandle<()>,
    },
    /// An `AsyncService` thread.
    Free { thread: JoinHandle<()> },
    /// A `None` worker: set up inline, torn down at shutdown.
    Inline {
        teardown: Box<dyn FnOnce() + Send>,
    },
    Closed,
}

/// A registered worker, as seen by the orchestrator.
pub(crate) struct WorkerUnit {
    shared: Arc<UnitShared>,
    phase: UnitPhase,
}

impl WorkerUnit {
    /// Builds the unit and validates its command table. Nothing runs yet.
    pub(crate) fn new<T: Worker>(
        worker: T,
        policy: SchedulingPolicy,
        priority: f32,
    ) -> Result<(Self, WorkerHandle<T>), ControlError> {
        let name = worker.name().to_string();
        let mut table = CommandTable::new();
        T::register_commands(&mut table).map_err(|source| ControlError::CommandTable {
            name: name.clone(),
            source,
        })?;

        let methods = table.methods().map(str::to_string).collect();
        let shared = Arc::new(UnitShared::new(name, policy, priority, methods));
        let launch_shared = Arc::clone(&shared);
        let launcher: Launcher = Box::new(move |ctx| launch(worker, table, launch_shared, ctx));

        let handle = WorkerHandle::new(Arc::clone(&shared));
        Ok((
            Self {
                shared,
                phase: UnitPhase::Pending(launcher),
            },
            handle,
        ))
    }

    pub(crate) fn name(&self) -> &str {
        &self.shared.name
    }

    pub(crate) fn priority(&self) -> f32 {
        self.shared.priority
    }

    pub(crate) fn policy(&self) -> SchedulingPolicy {
        self.shared.policy
    }

    pub(crate) fn status(&self) -> WorkerStatus {
        self.shared.status()
    }

    pub(crate) fn id(&self) -> tessel_core::WorkerId {
        self.shared.id
    }

    /// Runs setup and starts the thread if the unit is still pending.
    pub(crate) fn start(&mut self, ctx: &LaunchContext<'_>) -> Result<(), ControlError> {
        match std::mem::replace(&mut self.phase, UnitPhase::Closed) {
            UnitPhase::Pending(_) if self.shared.is_stopped() => {
                log::debug!("Worker '{}' was stopped before it started.", self.name());
                self.shared.set_state(WorkerState::Closed);
                Ok(())
            }
            UnitPhase::Pending(launcher) => {
                self.phase = launcher(ctx)?;
                Ok(())
            }
            other => {
                self.phase = other;
                Ok(())
            }
        }
    }

    /// Sets the sync signal of a live synced unit. Returns whether the
    /// orchestrator should wait for its finish signal.
    pub(crate) fn release(&self) -> bool {
        match &self.phase {
            UnitPhase::Synced { sync, .. } if self.shared.is_running() => {
                sync.set();
                true
            }
            _ => false,
        }
    }

    /// Blocks until the unit reports the end of its cycle.
    pub(crate) fn await_finish(&self) -> Result<(), SignalClosed> {
        match &self.phase {
            UnitPhase::Synced { finish, .. } => finish.wait(),
            _ => Ok(()),
        }
    }

    pub(crate) fn request_stop(&self) {
        self.shared.request_stop();
    }

    /// Waits for the unit to reach `Closed`.
    pub(crate) fn join(&mut self) {
        match std::mem::replace(&mut self.phase, UnitPhase::Closed) {
            UnitPhase::Synced { thread, .. } | UnitPhase::Free { thread } => {
                if let Err(payload) = thread.join() {
                    log::error!(
                        "Worker '{}' thread terminated abnormally: {}",
                        self.name(),
                        panic_message(payload.as_ref())
                    );
                    self.shared.set_state(WorkerState::Closed);
                }
            }
            UnitPhase::Inline { teardown } => teardown(),
            UnitPhase::Pending(_) | UnitPhase::Closed => {
                self.shared.set_state(WorkerState::Closed);
            }
        }
    }
}

fn launch<T: Worker>(
    mut worker: T,
    table: CommandTable<T>,
    shared: Arc<UnitShared>,
    ctx: &LaunchContext<'_>,
) -> Result<UnitPhase, ControlError> {
    shared.set_state(WorkerState::Init);
    log::debug!("Worker '{}': running setup.", shared.name);
    worker
        .setup()
        .map_err(|e| ControlError::SetupFailed {
            name: shared.name.clone(),
            details: format!("{e:#}"),
        })?;

    let policy = shared.policy;
    if policy == SchedulingPolicy::None {
        shared.set_state(WorkerState::Idle);
        log::info!("Worker '{}' set up inline (no thread).", shared.name);
        let teardown_shared = Arc::clone(&shared);
        return Ok(UnitPhase::Inline {
            teardown: Box::new(move || {
                teardown_shared.set_state(WorkerState::Closing);
                if let Err(payload) = catch_unwind(AssertUnwindSafe(|| worker.teardown())) {
                    log::error!(
                        "Worker '{}' panicked during teardown: {}",
                        teardown_shared.name,
                        panic_message(payload.as_ref())
                    );
                }
                teardown_shared.set_state(WorkerState::Closed);
            }),
        });
    }

    let interval = worker
        .async_interval()
        .unwrap_or_else(|| ctx.config.async_interval());
    let builder = thread::Builder::new().name(ctx.config.thread_name(&shared.name));
    let name = shared.name.clone();
    let cycle = Cycle {
        worker,
        table,
        shared: Arc::clone(&shared),
        completions: Arc::clone(ctx.completions),
    };

    shared.set_running(true);
    let spawned = if policy.is_synced() {
        let (sync_set, sync_wait) = signal::auto_reset();
        let (finish_set, finish_wait) = signal::auto_reset();
        shared.install_wake(sync_set.clone());
        builder
            .spawn(move || cycle.run_synced(sync_wait, finish_set))
            .map(|thread| UnitPhase::Synced {
                sync: sync_set,
                finish: finish_wait,
                thread,
            })
    } else {
        builder
            .spawn(move || cycle.run_free(interval))
            .map(|thread| UnitPhase::Free { thread })
    };

    spawned.map_err(|source| {
        shared.set_running(false);
        ControlError::Spawn { name, source }
    })
}

/// Everything a worker thread owns.
struct Cycle<T: Worker> {
    worker: T,
    table: CommandTable<T>,
    shared: Arc<UnitShared>,
    completions: Arc<CompletionQueue>,
}

impl<T: Worker> Cycle<T> {
    fn run_synced(mut self, sync: SignalWait, finish: SignalSet) {
        log::info!(
            "Worker '{}' thread started ({:?}).",
            self.shared.name,
            self.shared.policy
        );
        self.shared.set_state(WorkerState::Idle);

        while sync.wait().is_ok() {
            if !self.shared.is_running() {
                break;
            }
            self.run_once();
            finish.set();
        }

        self.close();
    }

    fn run_free(mut self, interval: Duration) {
        log::info!(
            "Worker '{}' thread started (AsyncService, every {:?}).",
            self.shared.name,
            interval
        );

        while self.shared.is_running() {
            self.run_once();
            thread::sleep(interval);
        }

        self.close();
    }

    fn run_once(&mut self) {
        self.shared.set_state(WorkerState::Running);

        for task in self.shared.take_tasks() {
            self.execute(task);
        }

        let started = Instant::now();
        let failed = match catch_unwind(AssertUnwindSafe(|| self.worker.step())) {
            Ok(Ok(())) => false,
            Ok(Err(e)) => {
                log::error!("Worker '{}': step failed: {e:#}", self.shared.name);
                true
            }
            Err(payload) => {
                log::error!(
                    "Worker '{}': step panicked: {}",
                    self.shared.name,
                    panic_message(payload.as_ref())
                );
                true
            }
        };
        self.shared.record_cycle(started.elapsed(), failed);

        self.shared.set_state(WorkerState::Idle);
    }

    fn execute(&mut self, task: Task) {
        match self
            .table
            .invoke(&self.shared.name, &mut self.worker, &task.command)
        {
            Ok(payload) => self.completions.push(CompletedTask {
                worker: self.shared.id,
                task,
                result: CommandResult::success(payload),
            }),
            Err(e) => {
                self.shared.record_failed_command();
                log::error!("Worker '{}': {e}", self.shared.name);
                if task.callback.is_some() {
                    log::debug!(
                        "Worker '{}': callback of '{}' dropped.",
                        self.shared.name,
                        task.command.method()
                    );
                }
            }
        }
    }

    fn close(mut self) {
        self.shared.set_state(WorkerState::Closing);
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| self.worker.teardown())) {
            log::error!(
                "Worker '{}' panicked during teardown: {}",
                self.shared.name,
                panic_message(payload.as_ref())
            );
        }
        self.shared.set_state(WorkerState::Closed);
        log::info!("Worker '{}' thread stopped.", self.shared.name);
    }
}
