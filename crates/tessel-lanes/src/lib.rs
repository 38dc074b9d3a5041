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

//! # Tessel Lanes
//!
//! The render dispatcher and the pieces it is made of.
//!
//! Each render tick, [`RenderDispatcher::dispatch`] splits the frame's
//! visible objects into three typed views (preparation, 3D, 2D), cuts each
//! view into fixed-size chunks, records every chunk on a pooled thread into
//! its own pre-allocated command buffer, and submits the buffers in pass
//! order: preparation, then 3D, then 2D.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod partition;
pub mod pool;
pub mod recorder;
pub mod report;

pub use config::DispatchConfig;
pub use dispatcher::RenderDispatcher;
pub use error::DispatchError;
pub use partition::FrameViews;
pub use recorder::RecordingContext;
pub use report::{ChunkOutput, FrameReport};
