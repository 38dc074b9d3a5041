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

//! Defines the error types for the rendering contracts.

use crate::renderer::api::{CommandBufferId, PassKind};
use std::fmt;

/// An error related to the creation or use of a GPU resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// No resource exists under the given ID.
    NotFound,
    /// The handle does not refer to a live resource of the expected kind.
    InvalidHandle,
    /// A write extended past the end of the resource.
    OutOfBounds,
    /// Resources may only be created or updated during the preparation pass.
    OutsidePreparation {
        /// The pass that attempted the operation.
        pass: PassKind,
    },
    /// A failure reported by the device implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound => write!(f, "No resource exists under that ID."),
            ResourceError::InvalidHandle => write!(f, "Stale or mismatched resource handle."),
            ResourceError::OutOfBounds => write!(f, "Write past the end of the resource."),
            ResourceError::OutsidePreparation { pass } => {
                write!(
                    f,
                    "Resource creation or update attempted during the '{pass}' pass."
                )
            }
            ResourceError::BackendError(msg) => {
                write!(f, "Device resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// An error raised while recording or submitting command buffers.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// `begin_recording` was called on a buffer that is already recording.
    AlreadyRecording(CommandBufferId),
    /// A command was recorded into, or `end_recording` called on, an idle buffer.
    NotRecording(CommandBufferId),
    /// A buffer was submitted while still recording.
    SubmitWhileRecording(CommandBufferId),
    /// The graphics device was lost.
    DeviceLost,
    /// An error occurred while managing a GPU resource.
    ResourceError(ResourceError),
    /// Any other device failure.
    Internal(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::AlreadyRecording(id) => {
                write!(f, "Command buffer {id:?} is already recording.")
            }
            RenderError::NotRecording(id) => {
                write!(f, "Command buffer {id:?} is not recording.")
            }
            RenderError::SubmitWhileRecording(id) => {
                write!(f, "Command buffer {id:?} was submitted while recording.")
            }
            RenderError::DeviceLost => write!(f, "The graphics device was lost."),
            RenderError::ResourceError(err) => {
                write!(f, "Resource operation failed: {err}")
            }
            RenderError::Internal(msg) => {
                write!(f, "Device failure: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn render_error_wraps_resource_error() {
        let err: RenderError = ResourceError::OutsidePreparation {
            pass: PassKind::Draw2D,
        }
        .into();
        assert_eq!(
            format!("{err}"),
            "Resource operation failed: Resource creation or update attempted during the 'draw2d' pass."
        );
        assert!(err.source().is_some());
    }
}
