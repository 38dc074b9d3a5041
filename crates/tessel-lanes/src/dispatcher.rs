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

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::partition::{self, FrameViews};
use crate::pool::RecordingPool;
use crate::recorder::record_chunk;
use crate::report::{ChunkOutput, FrameReport};
use std::sync::Arc;
use tessel_core::renderer::{CommandBufferId, GraphicsDevice, PassKind};
use tessel_core::scene::Drawable;

/// Pre-allocated command buffers, one per slot per pass.
#[derive(Debug, Default)]
struct SlotTable {
    prepare: Vec<CommandBufferId>,
    draw_3d: Vec<CommandBufferId>,
    draw_2d: Vec<CommandBufferId>,
}

impl SlotTable {
    fn get(&self, pass: PassKind) -> &[CommandBufferId] {
        match pass {
            PassKind::Prepare => &self.prepare,
            PassKind::Draw3D => &self.draw_3d,
            PassKind::Draw2D => &self.draw_2d,
        }
    }

    fn get_mut(&mut self, pass: PassKind) -> &mut Vec<CommandBufferId> {
        match pass {
            PassKind::Prepare => &mut self.prepare,
            PassKind::Draw3D => &mut self.draw_3d,
            PassKind::Draw2D => &mut self.draw_2d,
        }
    }
}

/// Records a frame's draw work in parallel and submits it in a fixed order.
///
/// The dispatcher is driven from a single thread (the render tick). Only that
/// thread allocates command buffers, submits, and waits for idle; pooled
/// threads only record.
pub struct RenderDispatcher {
    device: Arc<dyn GraphicsDevice>,
    config: DispatchConfig,
    chunk_size: usize,
    pool: RecordingPool,
    slots: SlotTable,
    frames: u64,
}

impl RenderDispatcher {
    /// Builds the recording pool and allocates one command buffer per worker
    /// per pass.
    ///
    /// ## Errors
    /// * `DispatchError::Pool` - If the thread pool cannot be built.
    /// * `DispatchError::SlotAllocation` - If the device refuses a command buffer.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        config: DispatchConfig,
    ) -> Result<Self, DispatchError> {
        let workers = config.resolved_workers();
        let chunk_size = config.chunk_size();
        let pool = RecordingPool::new(workers, &config.thread_name_prefix)?;

        let mut dispatcher = Self {
            device,
            config,
            chunk_size,
            pool,
            slots: SlotTable::default(),
            frames: 0,
        };
        for pass in PassKind::SUBMISSION_ORDER {
            dispatcher.ensure_slots(pass, workers)?;
        }

        log::info!(
            "RenderDispatcher: {} recording thread(s), {} object(s) per chunk.",
            workers,
            chunk_size
        );
        Ok(dispatcher)
    }

    /// Objects per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Recording threads in the pool.
    pub fn workers(&self) -> usize {
        self.pool.threads()
    }

    /// Command buffers currently allocated for `pass`.
    pub fn slot_count(&self, pass: PassKind) -> usize {
        self.slots.get(pass).len()
    }

    /// Frames dispatched so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The configuration in use.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// The device recorded into.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// Grows the slot table of `pass` to at least `needed` buffers.
    fn ensure_slots(&mut self, pass: PassKind, needed: usize) -> Result<(), DispatchError> {
        let slots = self.slots.get_mut(pass);
        while slots.len() < needed {
            let label = format!("{}-slot-{}", pass.label(), slots.len());
            let buffer = self
                .device
                .create_command_buffer(Some(&label))
                .map_err(|source| DispatchError::SlotAllocation { pass, source })?;
            log::debug!("RenderDispatcher: allocated {label} ({buffer:?}).");
            slots.push(buffer);
        }
        Ok(())
    }

    /// Records and submits one frame.
    ///
    /// 1. Every preparation chunk records; the dispatcher joins them all.
    /// 2. If any of them created or updated a resource, the device waits for idle.
    /// 3. 3D and 2D chunks record concurrently.
    /// 4. Buffers are submitted: preparation, then 3D, then 2D, each group in
    ///    the order its chunks completed.
    ///
    /// ## Errors
    /// Device-level failures only: slot allocation, idle-wait, submission.
    /// Objects that fail are logged and counted in the report.
    pub fn dispatch(
        &mut self,
        drawables: &[Arc<dyn Drawable>],
    ) -> Result<FrameReport, DispatchError> {
        self.frames += 1;
        let views = FrameViews::classify(drawables);
        log::trace!("RenderDispatcher: frame {} {:?}", self.frames, views);

        for pass in PassKind::SUBMISSION_ORDER {
            let needed = partition::chunk_count(views.view(pass).len(), self.chunk_size);
            self.ensure_slots(pass, needed)?;
        }

        let mut report = FrameReport {
            rejected: views.rejected(),
            ..Default::default()
        };

        let prepared = self.record_passes(&views, &[PassKind::Prepare]);
        if prepared.iter().any(|c| c.resources_changed) {
            self.device
                .wait_for_idle()
                .map_err(DispatchError::IdleWait)?;
            report.waited_for_idle = true;
        }

        let drawn = self.record_passes(&views, &[PassKind::Draw3D, PassKind::Draw2D]);
        let (drawn_3d, drawn_2d): (Vec<_>, Vec<_>) =
            drawn.into_iter().partition(|c| c.pass == PassKind::Draw3D);

        report.chunks = prepared;
        report.chunks.extend(drawn_3d);
        report.chunks.extend(drawn_2d);

        for chunk in report.chunks.iter().filter(|c| c.submittable) {
            self.device
                .submit(chunk.buffer)
                .map_err(|source| DispatchError::Submit {
                    pass: chunk.pass,
                    buffer: chunk.buffer,
                    source,
                })?;
            report.submitted.push((chunk.pass, chunk.buffer));
        }

        if report.rejected > 0 {
            log::warn!(
                "RenderDispatcher: frame {}: {} object(s) could not be classified.",
                self.frames,
                report.rejected
            );
        }
        if report.failed() > 0 {
            log::warn!(
                "RenderDispatcher: frame {}: {} object(s) failed to record.",
                self.frames,
                report.failed()
            );
        }
        Ok(report)
    }

    /// Records every chunk of `passes` concurrently on the pool.
    /// Returns the outputs in completion order.
    fn record_passes(&self, views: &FrameViews, passes: &[PassKind]) -> Vec<ChunkOutput> {
        let device = self.device.as_ref();
        let mut jobs = Vec::new();
        for &pass in passes {
            let buffers = self.slots.get(pass);
            for (slot, chunk) in partition::chunks(views.view(pass), self.chunk_size).enumerate() {
                let buffer = buffers[slot];
                jobs.push(move || record_chunk(device, pass, slot, buffer, chunk));
            }
        }
        self.pool
            .run(jobs)
            .into_iter()
            .map(|done| ChunkOutput {
                sequence: done.sequence,
                completed_at: done.finished_at,
                ..done.value
            })
            .collect()
    }
}

impl std::fmt::Debug for RenderDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderDispatcher")
            .field("device", &self.device)
            .field("chunk_size", &self.chunk_size)
            .field("pool", &self.pool)
            .field("slots", &self.slots)
            .field("frames", &self.frames)
            .finish()
    }
}
