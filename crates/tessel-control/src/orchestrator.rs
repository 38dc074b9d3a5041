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

//! The frame orchestrator: owns the worker units and runs the per-tick
//! rendezvous with the host loop.

use crate::completion::CompletionQueue;
use crate::config::SchedulerConfig;
use crate::error::ControlError;
use crate::registry::WorkerRegistry;
use crate::worker::unit::{LaunchContext, WorkerUnit};
use crate::worker::{panic_message, SchedulingPolicy, Worker, WorkerHandle, WorkerStatus};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tessel_core::WorkerId;

/// Counters kept by the orchestrator across its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Calls to [`FrameOrchestrator::on_update`].
    pub update_ticks: u64,
    /// Calls to [`FrameOrchestrator::on_render`].
    pub render_ticks: u64,
    /// Finish signals waited on, across both ticks.
    pub finish_waits: u64,
    /// Result callbacks that ran to completion.
    pub callbacks_invoked: u64,
    /// Result callbacks that panicked.
    pub callbacks_failed: u64,
}

/// Owns every worker unit and keeps them in lockstep with the host loop.
///
/// Each update tick releases every `SyncService` unit, waits for all of
/// them to finish their cycle, then delivers queued results on the calling
/// thread. The render tick does the same for `SyncRenderService` units.
pub struct FrameOrchestrator {
    config: SchedulerConfig,
    registry: WorkerRegistry,
    completions: Arc<CompletionQueue>,
    loaded: bool,
    shut_down: bool,
    stats: FrameStats,
}

impl FrameOrchestrator {
    /// Creates an orchestrator with no workers. Nothing runs until
    /// [`on_load`](Self::on_load).
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            registry: WorkerRegistry::new(),
            completions: Arc::new(CompletionQueue::new()),
            loaded: false,
            shut_down: false,
            stats: FrameStats::default(),
        }
    }

    /// Registers a worker under `policy` with the given priority (higher
    /// runs first).
    ///
    /// Before load, setup and thread start are deferred to
    /// [`on_load`](Self::on_load). After load, they happen here.
    ///
    /// ## Errors
    /// * `ControlError::CommandTable` - If the worker's command table is invalid.
    /// * `ControlError::SetupFailed` - If the worker was started here and its setup failed.
    /// * `ControlError::Spawn` - If its thread could not be spawned.
    /// * `ControlError::ShutDown` - If the orchestrator already shut down.
    pub fn register_worker<T: Worker>(
        &mut self,
        worker: T,
        policy: SchedulingPolicy,
        priority: f32,
    ) -> Result<WorkerHandle<T>, ControlError> {
        if self.shut_down {
            return Err(ControlError::ShutDown);
        }

        let (unit, handle) = WorkerUnit::new(worker, policy, priority)?;
        let index = self.registry.register(unit);

        if self.loaded {
            self.start_at(index)?;
        } else {
            log::debug!(
                "FrameOrchestrator: '{}' deferred until load.",
                handle.name()
            );
        }
        Ok(handle)
    }

    /// Runs deferred setup and starts every pending worker, in priority order.
    ///
    /// ## Errors
    /// The first setup or spawn failure. The failing worker is removed;
    /// workers after it stay pending and a later call resumes with them.
    pub fn on_load(&mut self) -> Result<(), ControlError> {
        if self.shut_down {
            return Err(ControlError::ShutDown);
        }
        if self.loaded {
            log::warn!("FrameOrchestrator: on_load called twice.");
            return Ok(());
        }

        let mut index = 0;
        while index < self.registry.len() {
            self.start_at(index)?;
            index += 1;
        }

        self.loaded = true;
        log::info!(
            "FrameOrchestrator: loaded with {} worker(s).",
            self.registry.len()
        );
        Ok(())
    }

    /// The update tick: a rendezvous with every `SyncService` worker,
    /// followed by result delivery.
    pub fn on_update(&mut self, dt: Duration) {
        self.stats.update_ticks += 1;
        log::trace!("FrameOrchestrator: update tick ({dt:?}).");
        self.rendezvous(SchedulingPolicy::SyncService);
        self.deliver_completions();
    }

    /// The render tick: a rendezvous with every `SyncRenderService` worker,
    /// followed by result delivery.
    pub fn on_render(&mut self, dt: Duration) {
        self.stats.render_ticks += 1;
        log::trace!("FrameOrchestrator: render tick ({dt:?}).");
        self.rendezvous(SchedulingPolicy::SyncRenderService);
        self.deliver_completions();
    }

    /// Drains the completion queue in FIFO order and runs every pending
    /// callback on the calling thread. Returns the number of callbacks run.
    pub fn deliver_completions(&mut self) -> usize {
        let mut delivered = 0;
        for completed in self.completions.drain() {
            let worker = completed.worker;
            let method = completed.task.command.method().to_string();
            match catch_unwind(AssertUnwindSafe(|| completed.deliver())) {
                Ok(true) => {
                    delivered += 1;
                    self.stats.callbacks_invoked += 1;
                }
                Ok(false) => {}
                Err(payload) => {
                    self.stats.callbacks_failed += 1;
                    log::error!(
                        "FrameOrchestrator: callback of '{}' (worker {}) panicked: {}",
                        method,
                        worker,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        delivered
    }

    /// Stops every worker and joins every thread. Idempotent.
    ///
    /// When this returns, every worker is `Closed` and its teardown has run.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        log::info!(
            "FrameOrchestrator: shutting down {} worker(s).",
            self.registry.len()
        );

        for unit in self.registry.iter() {
            unit.request_stop();
        }
        for unit in self.registry.iter_mut() {
            unit.join();
        }

        let late = self.deliver_completions();
        if late > 0 {
            log::debug!("FrameOrchestrator: delivered {late} late callback(s) at shutdown.");
        }
    }

    /// The orchestrator's counters.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// The configuration in use.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The number of registered workers.
    pub fn worker_count(&self) -> usize {
        self.registry.len()
    }

    /// The status of one worker, if registered.
    pub fn worker_status(&self, id: WorkerId) -> Option<WorkerStatus> {
        self.registry.status_of(id)
    }

    /// Statuses of every worker, in priority order.
    pub fn statuses(&self) -> Vec<WorkerStatus> {
        self.registry.statuses()
    }

    /// Whether [`on_load`](Self::on_load) completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Completions waiting for the next delivery.
    pub fn pending_completions(&self) -> usize {
        self.completions.len()
    }

    fn start_at(&mut self, index: usize) -> Result<(), ControlError> {
        let ctx = LaunchContext {
            config: &self.config,
            completions: &self.completions,
        };
        let Some(unit) = self.registry.get_mut(index) else {
            return Ok(());
        };

        if let Err(e) = unit.start(&ctx) {
            log::error!("FrameOrchestrator: {e}");
            let mut failed = self.registry.remove(index);
            failed.request_stop();
            failed.join();
            return Err(e);
        }
        Ok(())
    }

    fn rendezvous(&mut self, policy: SchedulingPolicy) {
        // Release everything first so the units cycle in parallel.
        let released: Vec<&WorkerUnit> = self
            .registry
            .with_policy(policy)
            .filter(|unit| unit.release())
            .collect();

        let mut waits = 0;
        for unit in released {
            if unit.await_finish().is_err() {
                log::error!(
                    "FrameOrchestrator: worker '{}' exited without signalling its finish.",
                    unit.name()
                );
            }
            waits += 1;
        }
        self.stats.finish_waits += waits;
    }
}

impl Drop for FrameOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for FrameOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameOrchestrator")
            .field("workers", &self.registry)
            .field("loaded", &self.loaded)
            .field("shut_down", &self.shut_down)
            .field("stats", &self.stats)
            .finish()
    }
}
