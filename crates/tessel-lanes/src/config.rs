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

use crate::error::DispatchError;
use serde::{Deserialize, Serialize};

/// Configuration for the render dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Objects a single recording thread is expected to handle per pass.
    /// Divided by the worker count to obtain the chunk size.
    pub max_records_per_worker: usize,
    /// Recording threads. `0` picks `max(1, hardware parallelism - 1)`.
    pub max_workers: usize,
    /// Prefix of every recording thread name. The thread index is appended.
    pub thread_name_prefix: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_records_per_worker: 4096,
            max_workers: 0,
            thread_name_prefix: "tessel-record".to_string(),
        }
    }
}

impl DispatchConfig {
    /// Parses a configuration from RON. Missing fields take their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self, DispatchError> {
        ron::from_str(source).map_err(|e| DispatchError::Config(e.to_string()))
    }

    /// The number of recording threads, with `0` resolved against the
    /// hardware. One core is left to the dispatching thread.
    pub fn resolved_workers(&self) -> usize {
        if self.max_workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2)
                .saturating_sub(1)
                .max(1)
        } else {
            self.max_workers
        }
    }

    /// Objects per chunk: `max_records_per_worker / workers`, at least 1.
    pub fn chunk_size(&self) -> usize {
        crate::partition::chunk_size(self.max_records_per_worker, self.resolved_workers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_workers_is_at_least_one() {
        let config = DispatchConfig::default();
        assert!(config.resolved_workers() >= 1);
        assert!(config.chunk_size() >= 1);
    }

    #[test]
    fn chunk_size_follows_explicit_workers() {
        let config = DispatchConfig {
            max_records_per_worker: 4096,
            max_workers: 8,
            ..Default::default()
        };
        assert_eq!(config.resolved_workers(), 8);
        assert_eq!(config.chunk_size(), 512);

        let tiny = DispatchConfig {
            max_records_per_worker: 3,
            max_workers: 8,
            ..Default::default()
        };
        assert_eq!(tiny.chunk_size(), 1);
    }

    #[test]
    fn ron_overrides_only_given_fields() {
        let config = DispatchConfig::from_ron_str("(max_workers: 2)").unwrap();
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.max_records_per_worker, 4096);
        assert!(DispatchConfig::from_ron_str("(max_workers: \"two\")").is_err());
    }
}
