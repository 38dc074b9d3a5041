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

//! The host window loop contract.

use crate::scene::ViewportSize;
use std::time::Duration;

/// The callbacks a host window loop drives.
///
/// Any windowing backend (winit, SDL2, a headless test loop) can call into a
/// `WindowListener`; the listener never owns the loop itself.
pub trait WindowListener {
    /// Called once, after the graphics device exists and before the first tick.
    fn on_load(&mut self) -> anyhow::Result<()>;

    /// Called once per simulation tick.
    fn on_update(&mut self, delta: Duration);

    /// Called once per rendered frame.
    fn on_render(&mut self, delta: Duration);

    /// Called when the window's drawable area changes size.
    fn on_resize(&mut self, size: ViewportSize);

    /// Called once when the window closes. No tick follows.
    fn on_close(&mut self);
}
