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

//! Contracts between the scene and the render dispatcher.
//!
//! The scene graph itself lives elsewhere. All the dispatcher needs is the
//! frame's list of visible [`Drawable`]s and the [`Viewport`] each one renders
//! into.

mod drawable;
mod viewport;

pub use self::drawable::{Draw2D, Draw3D, Drawable, FrameSource, PrepareDraw};
pub use self::viewport::{DrawDimension, Viewport, ViewportSize};
