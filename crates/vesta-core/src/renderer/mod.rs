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

//! Provides the public, backend-agnostic rendering contracts.
//!
//! This module defines the "common language" for all rendering operations: the
//! [`Renderer`] trait, the typed resource handles it hands out, the value types it
//! consumes, and the error types it reports. The concrete backends in `vesta-infra`
//! implement [`Renderer`]; the wrappers in [`scene`] and [`crate::asset`] consume it
//! without knowing which backend is active.

pub mod api;
pub mod error;
pub mod handles;
pub mod reflection;
pub mod scene;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::{RenderError, ResourceError, ShaderError};
pub use self::handles::*;
pub use self::traits::{CameraView, Renderer, SharedRenderer};
