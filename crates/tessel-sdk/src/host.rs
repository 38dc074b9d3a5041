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

//! A fixed-step host loop with no window.

use crate::config::HostConfig;
use anyhow::Result;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tessel_core::platform::WindowListener;
use tessel_core::scene::ViewportSize;

/// What a [`HeadlessHost`] run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSummary {
    /// Frames driven (one update and one render tick each).
    pub frames: u64,
    /// Resize events delivered.
    pub resizes: usize,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

/// Drives a [`WindowListener`] for a fixed number of frames.
///
/// Each frame is one `on_update` followed by one `on_render`, both with the
/// same fixed delta. Resizes can be scheduled ahead of a given frame.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    delta: Duration,
    resizes: BTreeMap<u64, ViewportSize>,
}

impl HeadlessHost {
    /// Creates a host with the given fixed time step.
    pub fn new(delta: Duration) -> Self {
        Self {
            delta,
            resizes: BTreeMap::new(),
        }
    }

    /// Creates a host from configuration.
    pub fn from_config(config: &HostConfig) -> Self {
        Self::new(config.fixed_dt())
    }

    /// Delivers `on_resize(size)` right before frame `frame` (0-based).
    pub fn resize_before(mut self, frame: u64, size: ViewportSize) -> Self {
        self.resizes.insert(frame, size);
        self
    }

    /// Calls `on_load`, runs `frames` frames, then calls `on_close`.
    ///
    /// ## Errors
    /// Returns the error of `on_load`; no frame runs in that case.
    pub fn run(&self, listener: &mut dyn WindowListener, frames: u64) -> Result<HostSummary> {
        let started = Instant::now();
        listener.on_load()?;
        log::info!("HeadlessHost: running {frames} frame(s) at {:?}.", self.delta);

        let mut resizes = 0;
        for frame in 0..frames {
            if let Some(size) = self.resizes.get(&frame) {
                listener.on_resize(*size);
                resizes += 1;
            }
            listener.on_update(self.delta);
            listener.on_render(self.delta);
        }

        listener.on_close();
        let summary = HostSummary {
            frames,
            resizes,
            elapsed: started.elapsed(),
        };
        log::info!(
            "HeadlessHost: {} frame(s) in {:.2?}.",
            summary.frames,
            summary.elapsed
        );
        Ok(summary)
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::from_config(&HostConfig::default())
    }
}
