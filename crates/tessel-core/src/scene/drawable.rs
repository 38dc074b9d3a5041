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

//! Drawables and the per-pass capabilities they may expose.

use super::viewport::Viewport;
use crate::renderer::Renderer;
use std::sync::Arc;

/// Records GPU resource work before the draw passes of a frame.
pub trait PrepareDraw {
    /// Creates or updates the GPU resources this object draws with.
    fn before_draw(&self, renderer: &mut dyn Renderer) -> anyhow::Result<()>;
}

/// Records 2D draw calls.
pub trait Draw2D {
    /// Records this object's 2D commands.
    fn on_draw_2d(&self, renderer: &mut dyn Renderer) -> anyhow::Result<()>;
}

/// Records 3D draw calls.
pub trait Draw3D {
    /// Records this object's 3D commands.
    fn on_draw_3d(&self, renderer: &mut dyn Renderer) -> anyhow::Result<()>;
}

/// A visible object of the current frame.
///
/// Capabilities are opt-in: an object only takes part in the passes whose
/// accessor returns `Some`. Drawables are shared with recording threads, so
/// any per-frame state they keep must use interior mutability.
pub trait Drawable: Send + Sync {
    /// A short name used in log records.
    fn name(&self) -> &str;

    /// The viewport this object renders into, if any.
    fn viewport(&self) -> Option<&Viewport> {
        None
    }

    /// Returns the preparation capability.
    fn as_prepare(&self) -> Option<&dyn PrepareDraw> {
        None
    }

    /// Returns the 2D capability.
    fn as_draw_2d(&self) -> Option<&dyn Draw2D> {
        None
    }

    /// Returns the 3D capability.
    fn as_draw_3d(&self) -> Option<&dyn Draw3D> {
        None
    }
}

/// Supplies the list of visible drawables each render tick.
pub trait FrameSource: Send {
    /// Returns the frame's visible objects in scene order.
    fn visible_drawables(&mut self) -> Vec<Arc<dyn Drawable>>;

    /// Returns every viewport the scene renders into.
    fn viewports(&self) -> Vec<Arc<Viewport>> {
        Vec::new()
    }
}
