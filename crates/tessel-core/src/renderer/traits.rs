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

//! The device and recording traits the render dispatcher is written against.

use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ResourceError};
use std::fmt::Debug;

/// The graphics device the render dispatcher records into and submits to.
///
/// Recording methods (`begin_recording`, `record`, `end_recording`) may be
/// called concurrently from several threads, each on its own command buffer.
/// `submit` and `wait_for_idle` are only ever called from the dispatching
/// thread.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Allocates a reusable command buffer.
    /// ## Arguments
    /// * `label` - An optional debug label for the buffer.
    /// ## Errors
    /// * `ResourceError` - If the backend cannot allocate the buffer.
    fn create_command_buffer(&self, label: Option<&str>) -> Result<CommandBufferId, ResourceError>;

    /// Resets `buffer` and starts recording into it.
    /// ## Errors
    /// * `RenderError::AlreadyRecording` - If the buffer is already being recorded.
    fn begin_recording(&self, buffer: CommandBufferId) -> Result<(), RenderError>;

    /// Appends a command to a buffer that is currently recording.
    fn record(&self, buffer: CommandBufferId, command: RecordedCommand) -> Result<(), RenderError>;

    /// Finishes recording `buffer`, making it ready for submission.
    fn end_recording(&self, buffer: CommandBufferId) -> Result<(), RenderError>;

    /// Submits a finished command buffer to the device queue.
    fn submit(&self, buffer: CommandBufferId) -> Result<(), RenderError>;

    /// Blocks until every submitted and pending device operation has completed.
    fn wait_for_idle(&self) -> Result<(), RenderError>;

    /// Creates a new GPU buffer.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Creates a resource set binding the given buffers.
    fn create_resource_set(
        &self,
        descriptor: &ResourceSetDescriptor,
    ) -> Result<ResourceSetId, ResourceError>;

    /// Writes `data` into a GPU buffer at `offset`.
    fn update_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;
}

/// The recording interface handed to drawables during a pass.
///
/// A `Renderer` is bound to exactly one command buffer for the duration of one
/// chunk. Resource creation is only permitted during [`PassKind::Prepare`].
pub trait Renderer {
    /// The pass being recorded.
    fn pass(&self) -> PassKind;

    /// The command buffer this renderer records into.
    fn command_buffer(&self) -> CommandBufferId;

    /// Records a command into the bound buffer.
    fn record(&mut self, command: RecordedCommand) -> Result<(), RenderError>;

    /// Records a draw call into the bound buffer.
    fn draw(&mut self, draw: DrawCommand) -> Result<(), RenderError> {
        self.record(RecordedCommand::Draw(draw))
    }

    /// Creates a GPU buffer. Preparation pass only.
    fn create_buffer(&mut self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Creates a resource set. Preparation pass only.
    fn create_resource_set(
        &mut self,
        descriptor: &ResourceSetDescriptor,
    ) -> Result<ResourceSetId, ResourceError>;

    /// Writes into a GPU buffer. Preparation pass only.
    fn update_buffer(&mut self, id: BufferId, offset: u64, data: &[u8])
        -> Result<(), ResourceError>;
}
