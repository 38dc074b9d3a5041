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

use crate::config::EngineConfig;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tessel_control::{ControlError, FrameOrchestrator, SchedulingPolicy, Worker, WorkerHandle};
use tessel_core::platform::WindowListener;
use tessel_core::renderer::GraphicsDevice;
use tessel_core::scene::{FrameSource, ViewportSize};
use tessel_lanes::{FrameReport, RenderDispatcher};

/// The frame-scheduling core, driven by a host loop through [`WindowListener`].
///
/// Each render tick records and submits the frame's drawables, then runs the
/// `SyncRenderService` rendezvous, then settles viewports that were dirty.
/// Closing shuts every worker down before the device is drained.
pub struct Engine {
    device: Arc<dyn GraphicsDevice>,
    orchestrator: FrameOrchestrator,
    dispatcher: RenderDispatcher,
    source: Box<dyn FrameSource>,
    last_report: Option<FrameReport>,
    closed: bool,
}

impl Engine {
    /// Creates an engine rendering `source` on `device`.
    pub fn new(
        config: EngineConfig,
        device: Arc<dyn GraphicsDevice>,
        source: Box<dyn FrameSource>,
    ) -> Result<Self> {
        let dispatcher = RenderDispatcher::new(Arc::clone(&device), config.dispatch)
            .context("Failed to create the render dispatcher")?;
        log::info!("Engine: created on {:?}.", device);

        Ok(Self {
            device,
            orchestrator: FrameOrchestrator::new(config.scheduler),
            dispatcher,
            source,
            last_report: None,
            closed: false,
        })
    }

    /// Registers a subsystem worker. See [`FrameOrchestrator::register_worker`].
    pub fn register_worker<T: Worker>(
        &mut self,
        worker: T,
        policy: SchedulingPolicy,
        priority: f32,
    ) -> Result<WorkerHandle<T>, ControlError> {
        self.orchestrator.register_worker(worker, policy, priority)
    }

    /// The orchestrator driving the workers.
    pub fn orchestrator(&self) -> &FrameOrchestrator {
        &self.orchestrator
    }

    /// The render dispatcher.
    pub fn dispatcher(&self) -> &RenderDispatcher {
        &self.dispatcher
    }

    /// The graphics device.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// The report of the last successful dispatch.
    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    /// Whether `on_close` already ran.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl WindowListener for Engine {
    fn on_load(&mut self) -> Result<()> {
        self.orchestrator
            .on_load()
            .context("Failed to start the registered workers")
    }

    fn on_update(&mut self, delta: Duration) {
        if self.closed {
            return;
        }
        self.orchestrator.on_update(delta);
    }

    fn on_render(&mut self, delta: Duration) {
        if self.closed {
            return;
        }

        let drawables = self.source.visible_drawables();
        match self.dispatcher.dispatch(&drawables) {
            Ok(report) => self.last_report = Some(report),
            Err(e) => log::error!("Engine: frame {} not rendered: {e:#}", self.dispatcher.frames()),
        }

        self.orchestrator.on_render(delta);

        for viewport in self.source.viewports() {
            if viewport.settle() {
                log::debug!("Engine: viewport '{}' settled.", viewport.label());
            }
        }
    }

    fn on_resize(&mut self, size: ViewportSize) {
        log::info!("Engine: resized to {}x{}.", size.width, size.height);
        for viewport in self.source.viewports() {
            viewport.resize(size);
        }
    }

    fn on_close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        log::info!("Engine: closing...");

        self.orchestrator.shutdown();
        if let Err(e) = self.device.wait_for_idle() {
            log::error!("Engine: device did not drain on close: {e}");
        }

        let stats = self.orchestrator.stats();
        log::info!(
            "Engine: closed after {} update and {} render tick(s), {} frame(s) dispatched.",
            stats.update_ticks,
            stats.render_ticks,
            self.dispatcher.frames()
        );
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.on_close();
    }
}
