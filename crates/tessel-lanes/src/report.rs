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

//! What a dispatch did.

use std::time::Instant;
use tessel_core::renderer::{CommandBufferId, PassKind};

/// The outcome of recording one chunk.
#[derive(Debug, Clone)]
pub struct ChunkOutput {
    /// The pass the chunk was recorded for.
    pub pass: PassKind,
    /// The slot (and therefore command buffer) index within the pass.
    pub slot: usize,
    /// The command buffer the chunk was recorded into.
    pub buffer: CommandBufferId,
    /// Objects in the chunk.
    pub objects: usize,
    /// Objects whose callback succeeded.
    pub recorded: usize,
    /// Objects skipped because of their viewport.
    pub skipped: usize,
    /// Objects whose callback returned an error or panicked.
    pub failed: usize,
    /// Whether any object created or updated a GPU resource.
    pub resources_changed: bool,
    /// False if the buffer could not be opened or closed; it is then not submitted.
    pub submittable: bool,
    /// Position of the chunk in the completion order of its recording round.
    /// Preparation is one round; 3D and 2D share the next.
    pub sequence: usize,
    /// When the chunk's result reached the dispatcher.
    pub completed_at: Instant,
}

/// The outcome of one [`RenderDispatcher::dispatch`](crate::RenderDispatcher::dispatch).
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Every chunk, grouped by pass in submission order, each group in
    /// completion order.
    pub chunks: Vec<ChunkOutput>,
    /// Objects left out of every pass because their capability query panicked.
    pub rejected: usize,
    /// Whether the device idle-wait ran between preparation and drawing.
    pub waited_for_idle: bool,
    /// Submitted buffers, in submission order.
    pub submitted: Vec<(PassKind, CommandBufferId)>,
}

impl FrameReport {
    /// Chunks recorded for `pass`, in completion order.
    pub fn chunks_for(&self, pass: PassKind) -> impl Iterator<Item = &ChunkOutput> {
        self.chunks.iter().filter(move |c| c.pass == pass)
    }

    /// Objects whose callback succeeded, across all passes.
    pub fn recorded(&self) -> usize {
        self.chunks.iter().map(|c| c.recorded).sum()
    }

    /// Objects skipped because of their viewport, across all passes.
    pub fn skipped(&self) -> usize {
        self.chunks.iter().map(|c| c.skipped).sum()
    }

    /// Objects whose callback failed, across all passes.
    pub fn failed(&self) -> usize {
        self.chunks.iter().map(|c| c.failed).sum()
    }

    /// The pass of every submitted buffer, in submission order.
    pub fn submission_passes(&self) -> Vec<PassKind> {
        self.submitted.iter().map(|(pass, _)| *pass).collect()
    }
}
