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

use tessel_core::renderer::{BufferId, CommandBufferId, RecordedCommand, ResourceSetId};

/// One call observed by a [`HeadlessDevice`](super::HeadlessDevice).
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// A command buffer was allocated.
    CommandBufferCreated(CommandBufferId),
    /// A GPU buffer was created.
    BufferCreated(BufferId),
    /// A resource set was created.
    ResourceSetCreated(ResourceSetId),
    /// A GPU buffer was written.
    BufferUpdated {
        /// The written buffer.
        id: BufferId,
        /// Byte offset of the write.
        offset: u64,
        /// Number of bytes written.
        len: usize,
    },
    /// A finished command buffer was submitted.
    Submitted(CommandBufferId),
    /// The device was drained with `wait_for_idle`.
    WaitForIdle,
}

impl DeviceEvent {
    /// Whether this event created or modified a resource.
    pub fn touches_resources(&self) -> bool {
        matches!(
            self,
            DeviceEvent::BufferCreated(_)
                | DeviceEvent::ResourceSetCreated(_)
                | DeviceEvent::BufferUpdated { .. }
        )
    }
}

/// A submitted command buffer and the commands it carried.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// The submitted buffer.
    pub buffer: CommandBufferId,
    /// The label given at allocation, if any.
    pub label: Option<String>,
    /// The commands recorded since the last `begin_recording`.
    pub commands: Vec<RecordedCommand>,
}

impl Submission {
    /// Number of draw calls in the submission.
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::Draw(_)))
            .count()
    }
}
