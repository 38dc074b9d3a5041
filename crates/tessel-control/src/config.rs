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

use crate::error::ControlError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the frame orchestrator and its worker threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Sleep between two cycles of an `AsyncService` worker, in milliseconds.
    /// Workers may override it individually.
    pub async_interval_ms: u64,
    /// Prefix of every worker thread name. The worker's name is appended.
    pub thread_name_prefix: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            async_interval_ms: 10,
            thread_name_prefix: "tessel-worker".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Parses a configuration from RON. Missing fields take their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self, ControlError> {
        ron::from_str(source).map_err(|e| ControlError::Config(e.to_string()))
    }

    /// The default sleep between async cycles.
    pub fn async_interval(&self) -> Duration {
        Duration::from_millis(self.async_interval_ms)
    }

    pub(crate) fn thread_name(&self, worker: &str) -> String {
        format!("{}-{}", self.thread_name_prefix, worker)
    }
}
