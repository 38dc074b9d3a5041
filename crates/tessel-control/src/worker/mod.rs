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

//! Worker units: a subsystem's private thread, inbound command queue, and
//! lifecycle state machine.
//!
//! A unit moves through `Init → Running → Idle → Running → … → Closing → Closed`.
//! Each cycle drains the inbound queue, runs [`Worker::step`], and returns to
//! `Idle`. Failures inside a cycle are logged and never leave the thread.

mod commands;
mod handle;
mod shared;
pub(crate) mod unit;

pub use self::commands::CommandTable;
pub use self::handle::WorkerHandle;

use std::fmt;
use std::time::Duration;
pub(crate) use tessel_core::panic_message;
use tessel_core::{CommandError, WorkerId};

/// A subsystem that runs under the frame orchestrator.
///
/// The worker value is moved onto its own thread once started; the
/// orchestrator keeps only a type-erased unit and hands out
/// [`WorkerHandle`]s for cross-thread commands.
pub trait Worker: Send + 'static {
    /// A short name used for the thread name and in log records.
    fn name(&self) -> &str;

    /// One-time setup, run in the `Init` state before the thread starts.
    ///
    /// An error here is fatal for the worker and is returned from
    /// registration (or from `on_load` for workers registered before load).
    fn setup(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// The per-cycle work. Errors and panics are logged and the next cycle
    /// runs as usual.
    fn step(&mut self) -> anyhow::Result<()>;

    /// Runs once in the `Closing` state, after the last cycle.
    fn teardown(&mut self) {}

    /// Overrides the configured sleep between cycles of an `AsyncService` worker.
    fn async_interval(&self) -> Option<Duration> {
        None
    }

    /// Declares the commands other threads may invoke on this worker.
    fn register_commands(table: &mut CommandTable<Self>) -> Result<(), CommandError>
    where
        Self: Sized,
    {
        let _ = table;
        Ok(())
    }
}

/// When a worker's cycles run. Chosen once, at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulingPolicy {
    /// One cycle per update tick; the update tick waits for it.
    SyncService,
    /// One cycle per render tick; the render tick waits for it.
    SyncRenderService,
    /// Cycles continuously on its own thread, sleeping between cycles.
    AsyncService,
    /// No thread. Setup runs inline and the worker never cycles.
    None,
}

impl SchedulingPolicy {
    /// Whether the policy gives the worker a thread.
    pub fn has_thread(self) -> bool {
        !matches!(self, SchedulingPolicy::None)
    }

    /// Whether the orchestrator waits on the worker each tick.
    pub fn is_synced(self) -> bool {
        matches!(
            self,
            SchedulingPolicy::SyncService | SchedulingPolicy::SyncRenderService
        )
    }
}

/// The lifecycle state of a worker unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WorkerState {
    /// Registered, setup not finished yet.
    Init = 0,
    /// Executing commands or its step.
    Running = 1,
    /// Between cycles.
    Idle = 2,
    /// Leaving the loop, teardown in progress.
    Closing = 3,
    /// Teardown finished. Terminal.
    Closed = 4,
}

impl WorkerState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Init,
            1 => WorkerState::Running,
            2 => WorkerState::Idle,
            3 => WorkerState::Closing,
            _ => WorkerState::Closed,
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Init => "INIT",
            WorkerState::Running => "RUNNING",
            WorkerState::Idle => "IDLE",
            WorkerState::Closing => "CLOSING",
            WorkerState::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

/// A point-in-time report of a worker unit.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerStatus {
    /// The unit's identifier.
    pub id: WorkerId,
    /// The worker's name.
    pub name: String,
    /// The scheduling policy chosen at registration.
    pub policy: SchedulingPolicy,
    /// The registration priority. Higher runs first.
    pub priority: f32,
    /// The current lifecycle state.
    pub state: WorkerState,
    /// Completed cycles.
    pub cycles: u64,
    /// Cycles whose step returned an error or panicked.
    pub failed_steps: u64,
    /// Commands whose handler failed.
    pub failed_commands: u64,
    /// Commands waiting in the inbound queue.
    pub queued: usize,
    /// Duration of the last step.
    pub last_step: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips_through_u8() {
        for state in [
            WorkerState::Init,
            WorkerState::Running,
            WorkerState::Idle,
            WorkerState::Closing,
            WorkerState::Closed,
        ] {
            assert_eq!(WorkerState::from_u8(state as u8), state);
        }
    }

    #[test]
    fn policy_classification() {
        assert!(SchedulingPolicy::SyncService.is_synced());
        assert!(SchedulingPolicy::SyncRenderService.is_synced());
        assert!(!SchedulingPolicy::AsyncService.is_synced());
        assert!(SchedulingPolicy::AsyncService.has_thread());
        assert!(!SchedulingPolicy::None.has_thread());
    }
}
