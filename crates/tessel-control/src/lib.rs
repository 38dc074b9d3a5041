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

//! # Tessel Control
//!
//! Runs subsystem workers on their own threads and keeps them in lockstep
//! with the host loop.
//!
//! - [`Worker`]: the trait a subsystem implements (setup, step, teardown, commands).
//! - [`FrameOrchestrator`]: owns every registered worker and runs the
//!   per-tick rendezvous for the update and render ticks.
//! - [`WorkerHandle`]: the typed handle used to enqueue commands from any thread.

pub mod completion;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod signal;
pub mod worker;

pub use completion::{CommandCallback, CompletedTask, CompletionQueue, Task};
pub use config::SchedulerConfig;
pub use error::ControlError;
pub use orchestrator::{FrameOrchestrator, FrameStats};
pub use worker::{
    CommandTable, SchedulingPolicy, Worker, WorkerHandle, WorkerState, WorkerStatus,
};
