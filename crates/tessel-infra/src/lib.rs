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

//! # Tessel Infra
//!
//! Concrete implementations of the contracts defined in `tessel-core`.
//!
//! - `graphics::headless`: a [`GraphicsDevice`](tessel_core::renderer::GraphicsDevice)
//!   with no GPU behind it. It validates the recording protocol and keeps a
//!   journal of every call, which makes it the device of choice for tests,
//!   benchmarks, and the sandbox.

#[cfg(feature = "graphics")]
pub mod graphics;

#[cfg(feature = "graphics")]
pub use graphics::headless::{DeviceEvent, HeadlessDevice, Submission};
