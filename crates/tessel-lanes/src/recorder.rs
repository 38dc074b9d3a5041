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

//! Recording one chunk of drawables into one command buffer.

use crate::report::ChunkOutput;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tessel_core::panic_message;
use tessel_core::renderer::{
    BufferDescriptor, BufferId, CommandBufferId, GraphicsDevice, PassKind, RecordedCommand,
    RenderError, Renderer, ResourceError, ResourceSetDescriptor, ResourceSetId,
};
use tessel_core::scene::{DrawDimension, Drawable};

/// The [`Renderer`] handed to drawables while a chunk records.
///
/// Bound to one command buffer and one pass. Resource calls are forwarded to
/// the device during [`PassKind::Prepare`] and refused otherwise.
pub struct RecordingContext<'a> {
    device: &'a dyn GraphicsDevice,
    pass: PassKind,
    buffer: CommandBufferId,
    resources_changed: bool,
}

impl<'a> RecordingContext<'a> {
    /// Binds a context to `buffer`, which must already be recording.
    pub fn new(device: &'a dyn GraphicsDevice, pass: PassKind, buffer: CommandBufferId) -> Self {
        Self {
            device,
            pass,
            buffer,
            resources_changed: false,
        }
    }

    /// Whether a resource was created or updated through this context.
    pub fn resources_changed(&self) -> bool {
        self.resources_changed
    }

    fn check_preparation(&self) -> Result<(), ResourceError> {
        if self.pass == PassKind::Prepare {
            Ok(())
        } else {
            Err(ResourceError::OutsidePreparation { pass: self.pass })
        }
    }
}

impl Renderer for RecordingContext<'_> {
    fn pass(&self) -> PassKind {
        self.pass
    }

    fn command_buffer(&self) -> CommandBufferId {
        self.buffer
    }

    fn record(&mut self, command: RecordedCommand) -> Result<(), RenderError> {
        self.device.record(self.buffer, command)
    }

    fn create_buffer(&mut self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        self.check_preparation()?;
        let id = self.device.create_buffer(descriptor)?;
        self.resources_changed = true;
        Ok(id)
    }

    fn create_resource_set(
        &mut self,
        descriptor: &ResourceSetDescriptor,
    ) -> Result<ResourceSetId, ResourceError> {
        self.check_preparation()?;
        let id = self.device.create_resource_set(descriptor)?;
        self.resources_changed = true;
        Ok(id)
    }

    fn update_buffer(
        &mut self,
        id: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        self.check_preparation()?;
        self.device.update_buffer(id, offset, data)?;
        self.resources_changed = true;
        Ok(())
    }
}

/// Runs the pass callback of one drawable.
///
/// Returns `None` when the object does not take part in `pass`.
fn run_callback(
    drawable: &dyn Drawable,
    pass: PassKind,
    renderer: &mut dyn Renderer,
) -> Option<anyhow::Result<()>> {
    match pass {
        PassKind::Prepare => drawable.as_prepare().map(|p| p.before_draw(renderer)),
        PassKind::Draw3D => drawable.as_draw_3d().map(|d| d.on_draw_3d(renderer)),
        PassKind::Draw2D => drawable.as_draw_2d().map(|d| d.on_draw_2d(renderer)),
    }
}

/// Whether the object's viewport lets it draw in `pass`.
fn viewport_accepts(drawable: &dyn Drawable, pass: PassKind) -> bool {
    let dimension = match pass {
        PassKind::Prepare => return true,
        PassKind::Draw3D => DrawDimension::ThreeD,
        PassKind::Draw2D => DrawDimension::TwoD,
    };
    drawable
        .viewport()
        .map_or(true, |viewport| viewport.accepts(dimension))
}

/// The object's name for log records, even if `name` itself panics.
pub(crate) fn object_name(drawable: &dyn Drawable) -> String {
    catch_unwind(AssertUnwindSafe(|| drawable.name().to_string()))
        .unwrap_or_else(|_| "<unnamed>".to_string())
}

/// Records `chunk` into `buffer`, strictly in order.
///
/// `sequence` and `completed_at` are placeholders; the dispatcher stamps them
/// when the output comes back from the pool.
///
/// Failures of single objects are logged with the recording thread and
/// counted; the rest of the chunk still records.
pub fn record_chunk(
    device: &dyn GraphicsDevice,
    pass: PassKind,
    slot: usize,
    buffer: CommandBufferId,
    chunk: &[Arc<dyn Drawable>],
) -> ChunkOutput {
    let thread = std::thread::current();
    let thread_label = thread.name().unwrap_or("unnamed");
    let mut output = ChunkOutput {
        pass,
        slot,
        buffer,
        objects: chunk.len(),
        recorded: 0,
        skipped: 0,
        failed: 0,
        resources_changed: false,
        submittable: false,
        sequence: 0,
        completed_at: Instant::now(),
    };

    if let Err(e) = device.begin_recording(buffer) {
        log::error!(
            "RenderDispatcher: [{}:{:?}] cannot begin '{}' slot {}: {}",
            thread_label,
            thread.id(),
            pass,
            slot,
            e
        );
        output.failed = chunk.len();
        return output;
    }

    let mut context = RecordingContext::new(device, pass, buffer);
    for drawable in chunk {
        // Viewport queries run under the guard as well.
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            if !viewport_accepts(drawable.as_ref(), pass) {
                return None;
            }
            run_callback(drawable.as_ref(), pass, &mut context)
        }));
        match outcome {
            Ok(Some(Ok(()))) => output.recorded += 1,
            Ok(None) => output.skipped += 1,
            Ok(Some(Err(e))) => {
                output.failed += 1;
                log::error!(
                    "RenderDispatcher: [{}:{:?}] '{}' failed during '{}': {:#}",
                    thread_label,
                    thread.id(),
                    object_name(drawable.as_ref()),
                    pass,
                    e
                );
            }
            Err(payload) => {
                output.failed += 1;
                log::error!(
                    "RenderDispatcher: [{}:{:?}] '{}' panicked during '{}': {}",
                    thread_label,
                    thread.id(),
                    object_name(drawable.as_ref()),
                    pass,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
    output.resources_changed = context.resources_changed();

    match device.end_recording(buffer) {
        Ok(()) => output.submittable = true,
        Err(e) => log::error!(
            "RenderDispatcher: [{}:{:?}] cannot end '{}' slot {}: {}",
            thread_label,
            thread.id(),
            pass,
            slot,
            e
        ),
    }

    output
}
