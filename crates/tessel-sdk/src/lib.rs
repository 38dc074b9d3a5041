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

//! The public-facing entry point of Tessel.
//!
//! [`Engine`] owns a [`FrameOrchestrator`](tessel_control::FrameOrchestrator)
//! and a [`RenderDispatcher`](tessel_lanes::RenderDispatcher) and implements
//! [`WindowListener`](tessel_core::platform::WindowListener), so any host loop
//! can drive it. [`HeadlessHost`] is such a loop, with no window at all.

pub mod config;
pub mod engine;
pub mod host;
pub mod logging;

pub use config::{EngineConfig, HostConfig};
pub use engine::Engine;
pub use host::{HeadlessHost, HostSummary};
pub use logging::{init_logging, init_logging_with};

pub mod prelude {
    pub use crate::{init_logging, Engine, EngineConfig, HeadlessHost};
    pub use tessel_control::{
        CommandTable, FrameOrchestrator, SchedulingPolicy, Worker, WorkerHandle, WorkerState,
    };
    pub use tessel_core::platform::WindowListener;
    pub use tessel_core::renderer::{
        BufferDescriptor, BufferId, BufferUsage, DrawCommand, GraphicsDevice, PassKind, Rect,
        RecordedCommand, Renderer, ResourceSetDescriptor,
    };
    pub use tessel_core::scene::{
        Draw2D, Draw3D, DrawDimension, Drawable, FrameSource, PrepareDraw, Viewport, ViewportSize,
    };
    pub use tessel_core::{CommandError, CommandRecord, CommandResult, CommandValue};
    pub use tessel_infra::HeadlessDevice;
}
