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

use tessel_core::CommandError;
use thiserror::Error;

/// Errors raised while registering, starting, or configuring workers.
#[derive(Debug, Error)]
pub enum ControlError {
    /// A worker's one-time setup returned an error.
    #[error("worker '{name}' failed during setup: {details}")]
    SetupFailed {
        /// The worker's name.
        name: String,
        /// The setup error, formatted with its causes.
        details: String,
    },

    /// The OS refused to spawn the worker thread.
    #[error("failed to spawn thread for worker '{name}'")]
    Spawn {
        /// The worker's name.
        name: String,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The worker's command table is invalid.
    #[error("invalid command table for worker '{name}'")]
    CommandTable {
        /// The worker's name.
        name: String,
        /// The first table error.
        #[source]
        source: CommandError,
    },

    /// Registration was attempted after the orchestrator shut down.
    #[error("the orchestrator has already shut down")]
    ShutDown,

    /// The scheduler configuration could not be parsed.
    #[error("invalid scheduler configuration: {0}")]
    Config(String),
}
