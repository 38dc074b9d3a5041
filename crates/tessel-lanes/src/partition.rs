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

//! Splitting a frame's visible objects into typed views and fixed-size chunks.

use crate::recorder::object_name;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tessel_core::panic_message;
use tessel_core::renderer::PassKind;
use tessel_core::scene::Drawable;

/// Objects per chunk for a given budget: `max_records_per_worker / workers`,
/// never less than 1.
pub fn chunk_size(max_records_per_worker: usize, workers: usize) -> usize {
    (max_records_per_worker / workers.max(1)).max(1)
}

/// Number of chunks `len` items produce with `size` items per chunk.
pub fn chunk_count(len: usize, size: usize) -> usize {
    len.div_ceil(size.max(1))
}

/// Cuts `items` into consecutive chunks of `size` items. The last chunk may
/// be shorter. Concatenating the chunks gives back `items`.
pub fn chunks<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}

/// The three typed views of one frame's visible objects.
///
/// Each view keeps scene order. An object appears in every view whose
/// capability it exposes.
#[derive(Default)]
pub struct FrameViews {
    prepare: Vec<Arc<dyn Drawable>>,
    draw_3d: Vec<Arc<dyn Drawable>>,
    draw_2d: Vec<Arc<dyn Drawable>>,
    rejected: usize,
}

impl FrameViews {
    /// Sorts `drawables` into views by capability.
    ///
    /// An object whose capability query panics is logged and left out of
    /// every view.
    pub fn classify(drawables: &[Arc<dyn Drawable>]) -> Self {
        let mut views = Self::default();
        for drawable in drawables {
            let capabilities = catch_unwind(AssertUnwindSafe(|| {
                (
                    drawable.as_prepare().is_some(),
                    drawable.as_draw_3d().is_some(),
                    drawable.as_draw_2d().is_some(),
                )
            }));
            let (prepare, draw_3d, draw_2d) = match capabilities {
                Ok(found) => found,
                Err(payload) => {
                    views.rejected += 1;
                    let thread = std::thread::current();
                    log::error!(
                        "RenderDispatcher: [{}:{:?}] '{}' panicked while classified: {}",
                        thread.name().unwrap_or("unnamed"),
                        thread.id(),
                        object_name(drawable.as_ref()),
                        panic_message(payload.as_ref())
                    );
                    continue;
                }
            };
            if prepare {
                views.prepare.push(Arc::clone(drawable));
            }
            if draw_3d {
                views.draw_3d.push(Arc::clone(drawable));
            }
            if draw_2d {
                views.draw_2d.push(Arc::clone(drawable));
            }
        }
        views
    }

    /// Objects left out because their capability query panicked.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// The objects taking part in `pass`.
    pub fn view(&self, pass: PassKind) -> &[Arc<dyn Drawable>] {
        match pass {
            PassKind::Prepare => &self.prepare,
            PassKind::Draw3D => &self.draw_3d,
            PassKind::Draw2D => &self.draw_2d,
        }
    }

    /// Returns true if no object takes part in any pass.
    pub fn is_empty(&self) -> bool {
        self.prepare.is_empty() && self.draw_3d.is_empty() && self.draw_2d.is_empty()
    }
}

impl std::fmt::Debug for FrameViews {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameViews")
            .field("prepare", &self.prepare.len())
            .field("draw_3d", &self.draw_3d.len())
            .field("draw_2d", &self.draw_2d.len())
            .field("rejected", &self.rejected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_core::renderer::Renderer;
    use tessel_core::scene::{Draw2D, Draw3D, PrepareDraw};

    struct Sprite;
    struct Mesh;

    impl Draw2D for Sprite {
        fn on_draw_2d(&self, _: &mut dyn Renderer) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl Drawable for Sprite {
        fn name(&self) -> &str {
            "sprite"
        }

        fn as_draw_2d(&self) -> Option<&dyn Draw2D> {
            Some(self)
        }
    }

    impl PrepareDraw for Mesh {
        fn before_draw(&self, _: &mut dyn Renderer) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl Draw3D for Mesh {
        fn on_draw_3d(&self, _: &mut dyn Renderer) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl Drawable for Mesh {
        fn name(&self) -> &str {
            "mesh"
        }

        fn as_prepare(&self) -> Option<&dyn PrepareDraw> {
            Some(self)
        }

        fn as_draw_3d(&self) -> Option<&dyn Draw3D> {
            Some(self)
        }
    }

    #[test]
    fn classify_by_capability_in_scene_order() {
        let drawables: Vec<Arc<dyn Drawable>> =
            vec![Arc::new(Mesh), Arc::new(Sprite), Arc::new(Mesh)];
        let views = FrameViews::classify(&drawables);

        assert_eq!(views.view(PassKind::Prepare).len(), 2);
        assert_eq!(views.view(PassKind::Draw3D).len(), 2);
        assert_eq!(views.view(PassKind::Draw2D).len(), 1);
        assert!(Arc::ptr_eq(&views.view(PassKind::Draw3D)[1], &drawables[2]));
    }

    struct Broken;

    impl Drawable for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn as_draw_3d(&self) -> Option<&dyn Draw3D> {
            panic!("capabilities unavailable")
        }
    }

    #[test]
    fn panicking_capability_query_rejects_only_that_object() {
        let drawables: Vec<Arc<dyn Drawable>> =
            vec![Arc::new(Mesh), Arc::new(Broken), Arc::new(Sprite)];
        let views = FrameViews::classify(&drawables);

        assert_eq!(views.rejected(), 1);
        assert_eq!(views.view(PassKind::Draw3D).len(), 1);
        assert_eq!(views.view(PassKind::Draw2D).len(), 1);
        assert!(!views.is_empty());
    }

    #[test]
    fn chunk_arithmetic() {
        assert_eq!(chunk_size(4096, 7), 585);
        assert_eq!(chunk_size(4, 8), 1);
        assert_eq!(chunk_size(10, 0), 10);
        assert_eq!(chunk_count(0, 4), 0);
        assert_eq!(chunk_count(9, 4), 3);
        assert_eq!(chunks(&[1, 2, 3, 4, 5], 2).last(), Some(&[5][..]));
    }
}
