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

use tessel_core::renderer::{CommandBufferId, PassKind, RenderError, ResourceError};
use thiserror::Error;

/// Errors that abort a dispatch or prevent the dispatcher from starting.
///
/// Failures of individual objects never show up here: they are logged and
/// counted in the [`FrameReport`](crate::FrameReport).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The dispatch configuration could not be parsed.
    #[error("invalid dispatch configuration: {0}")]
    Config(String),

    /// The recording pool could not be built.
    #[error("failed to build the recording pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// A command buffer slot could not be allocated.
    #[error("failed to allocate a '{pass}' command buffer")]
    SlotAllocation {
        /// The pass the slot was for.
        pass: PassKind,
        /// The device error.
        #[source]
        source: ResourceError,
    },

    /// The device waited for idle and failed.
    #[error("wait for idle failed after the preparation pass")]
    IdleWait(#[source] RenderError),

    /// A recorded buffer could not be submitted.
    #[error("failed to submit '{pass}' buffer {buffer:?}")]
    Submit {
        /// The pass the buffer belongs to.
        pass: PassKind,
        /// The buffer that failed.
        buffer: CommandBufferId,
        /// The device error.
        #[source]
        source: RenderError,
    },
}
