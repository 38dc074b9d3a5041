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

//! Handles, descriptors, and recorded commands exchanged with a graphics device.

use std::borrow::Cow;
use std::fmt;

/// An opaque handle to a reusable command buffer.
///
/// Obtained once from [`GraphicsDevice::create_command_buffer`](super::GraphicsDevice::create_command_buffer)
/// and re-recorded every frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CommandBufferId(pub u64);

/// An opaque handle to a GPU buffer resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// An opaque handle to a set of resources bound together for a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceSetId(pub usize);

/// How a buffer is going to be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Per-vertex attributes.
    Vertex,
    /// Index data.
    Index,
    /// Small, frequently updated constants.
    Uniform,
    /// Large read/write shader storage.
    Storage,
}

/// A descriptor used to create a [`BufferId`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// How the buffer will be used.
    pub usage: BufferUsage,
}

/// A descriptor used to create a [`ResourceSetId`].
#[derive(Debug, Clone)]
pub struct ResourceSetDescriptor<'a> {
    /// An optional debug label for the set.
    pub label: Option<Cow<'a, str>>,
    /// The buffers bound by this set, in binding order.
    pub buffers: &'a [BufferId],
}

/// A single draw call recorded into a command buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// The buffer providing vertex data.
    pub vertex_buffer: BufferId,
    /// Optional index buffer. Draws are non-indexed when `None`.
    pub index_buffer: Option<BufferId>,
    /// Resources bound for the draw (uniforms, textures).
    pub resource_set: Option<ResourceSetId>,
    /// Number of vertices or indices to draw.
    pub element_count: u32,
    /// Number of instances to draw.
    pub instance_count: u32,
}

/// A pixel rectangle of the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A command recorded into a command buffer between
/// `begin_recording` and `end_recording`.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    /// Restricts subsequent draws to a viewport rectangle.
    SetViewport(Rect),
    /// Restricts subsequent draws to a scissor rectangle.
    SetScissor(Rect),
    /// Issues a draw call.
    Draw(DrawCommand),
}

/// The recording passes of a frame, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassKind {
    /// Creates and updates GPU resources ahead of the draw passes.
    Prepare,
    /// Records 3D geometry.
    Draw3D,
    /// Records 2D overlays.
    Draw2D,
}

impl PassKind {
    /// All passes, in the order their buffers are submitted.
    pub const SUBMISSION_ORDER: [PassKind; 3] = [PassKind::Prepare, PassKind::Draw3D, PassKind::Draw2D];

    /// A short label used for debug names and logs.
    pub fn label(self) -> &'static str {
        match self {
            PassKind::Prepare => "prepare",
            PassKind::Draw3D => "draw3d",
            PassKind::Draw2D => "draw2d",
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_order_is_prepare_then_3d_then_2d() {
        let mut passes = vec![PassKind::Draw2D, PassKind::Prepare, PassKind::Draw3D];
        passes.sort();
        assert_eq!(passes, PassKind::SUBMISSION_ORDER.to_vec());
    }
}
