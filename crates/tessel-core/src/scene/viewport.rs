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

//! Viewports shared between the host and the objects drawn into them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// The draw dimension a viewport can enable or disable independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawDimension {
    /// 2D overlays.
    TwoD,
    /// 3D geometry.
    ThreeD,
}

/// The size of a viewport in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ViewportSize {
    /// Creates a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn pack(self) -> u64 {
        ((self.width as u64) << 32) | self.height as u64
    }

    fn unpack(bits: u64) -> Self {
        Self {
            width: (bits >> 32) as u32,
            height: bits as u32,
        }
    }
}

/// A render target region shared between the scene and the recording threads.
///
/// Every flag is atomic so recording threads can read it while the host thread
/// resizes or toggles the viewport.
#[derive(Debug)]
pub struct Viewport {
    label: String,
    visible: AtomicBool,
    draw_2d: AtomicBool,
    draw_3d: AtomicBool,
    dirty: AtomicBool,
    size: AtomicU64,
}

impl Viewport {
    /// Creates a visible viewport with both dimensions enabled.
    pub fn new(label: impl Into<String>, size: ViewportSize) -> Self {
        Self {
            label: label.into(),
            visible: AtomicBool::new(true),
            draw_2d: AtomicBool::new(true),
            draw_3d: AtomicBool::new(true),
            dirty: AtomicBool::new(false),
            size: AtomicU64::new(size.pack()),
        }
    }

    /// The debug label of the viewport.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current size in pixels.
    pub fn size(&self) -> ViewportSize {
        ViewportSize::unpack(self.size.load(Ordering::Acquire))
    }

    /// Whether the viewport is shown at all.
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    /// Shows or hides the viewport.
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Release);
    }

    /// Whether `dimension` is enabled for this viewport.
    pub fn is_enabled(&self, dimension: DrawDimension) -> bool {
        match dimension {
            DrawDimension::TwoD => self.draw_2d.load(Ordering::Acquire),
            DrawDimension::ThreeD => self.draw_3d.load(Ordering::Acquire),
        }
    }

    /// Enables or disables `dimension`.
    pub fn set_enabled(&self, dimension: DrawDimension, enabled: bool) {
        match dimension {
            DrawDimension::TwoD => self.draw_2d.store(enabled, Ordering::Release),
            DrawDimension::ThreeD => self.draw_3d.store(enabled, Ordering::Release),
        }
    }

    /// Whether the viewport is being reconfigured.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Flags the viewport as being reconfigured.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Applies a new size and flags the viewport dirty until the next [`settle`](Self::settle).
    pub fn resize(&self, size: ViewportSize) {
        self.size.store(size.pack(), Ordering::Release);
        self.mark_dirty();
    }

    /// Clears the dirty flag. Returns whether it was set.
    pub fn settle(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// Whether objects of `dimension` should be recorded this frame.
    pub fn accepts(&self, dimension: DrawDimension) -> bool {
        self.is_visible() && self.is_enabled(dimension) && !self.is_dirty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_requires_visible_enabled_and_clean() {
        let viewport = Viewport::new("main", ViewportSize::new(1280, 720));
        assert!(viewport.accepts(DrawDimension::ThreeD));

        viewport.set_enabled(DrawDimension::ThreeD, false);
        assert!(!viewport.accepts(DrawDimension::ThreeD));
        assert!(viewport.accepts(DrawDimension::TwoD));

        viewport.set_visible(false);
        assert!(!viewport.accepts(DrawDimension::TwoD));
    }

    #[test]
    fn resize_marks_dirty_until_settled() {
        let viewport = Viewport::new("main", ViewportSize::new(800, 600));
        viewport.resize(ViewportSize::new(1920, 1080));

        assert_eq!(viewport.size(), ViewportSize::new(1920, 1080));
        assert!(viewport.is_dirty());
        assert!(!viewport.accepts(DrawDimension::TwoD));

        assert!(viewport.settle());
        assert!(!viewport.settle());
        assert!(viewport.accepts(DrawDimension::TwoD));
    }
}
