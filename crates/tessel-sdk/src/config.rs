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

//! Engine configuration, loadable from RON.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tessel_control::SchedulerConfig;
use tessel_lanes::DispatchConfig;

/// Settings of the host loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Fixed time step passed to every update and render tick, in milliseconds.
    pub fixed_dt_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { fixed_dt_ms: 16 }
    }
}

impl HostConfig {
    /// The fixed time step.
    pub fn fixed_dt(&self) -> Duration {
        Duration::from_millis(self.fixed_dt_ms)
    }
}

/// Every setting of an [`Engine`](crate::Engine). Each field is optional in
/// RON and falls back to its default.
///
/// ```ron
/// (
///     scheduler: (async_interval_ms: 5),
///     dispatch: (max_workers: 4, max_records_per_worker: 2048),
///     host: (fixed_dt_ms: 8),
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker thread settings.
    pub scheduler: SchedulerConfig,
    /// Recording pool settings.
    pub dispatch: DispatchConfig,
    /// Host loop settings.
    pub host: HostConfig,
}

impl EngineConfig {
    /// Parses a configuration from a RON string.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::from_str(source).context("Failed to parse engine configuration")
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine configuration '{}'", path.display()))?;
        Self::from_ron_str(&source)
            .with_context(|| format!("Invalid engine configuration in '{}'", path.display()))
    }

    /// Serializes the configuration to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize engine configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ron_gives_defaults() {
        assert_eq!(EngineConfig::from_ron_str("()").unwrap(), EngineConfig::default());
    }

    #[test]
    fn nested_overrides_keep_other_defaults() {
        let config = EngineConfig::from_ron_str(
            "(scheduler: (async_interval_ms: 5), dispatch: (max_workers: 4))",
        )
        .unwrap();

        assert_eq!(config.scheduler.async_interval_ms, 5);
        assert_eq!(config.scheduler.thread_name_prefix, "tessel-worker");
        assert_eq!(config.dispatch.max_workers, 4);
        assert_eq!(config.dispatch.max_records_per_worker, 4096);
        assert_eq!(config.host.fixed_dt(), Duration::from_millis(16));
    }

    #[test]
    fn written_config_reads_back() {
        let mut config = EngineConfig::default();
        config.host.fixed_dt_ms = 8;
        let text = config.to_ron_string().unwrap();
        assert_eq!(EngineConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = EngineConfig::load("does/not/exist.ron").unwrap_err();
        assert!(format!("{err:#}").contains("does/not/exist.ron"));
    }
}
