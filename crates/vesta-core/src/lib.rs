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

//! # Vesta Core
//!
//! Foundational crate containing the renderer contract, the handle pools backing every
//! backend, and the GPU resource wrappers (meshes, effects, textures, framebuffers,
//! materials) built on top of that contract.
//!
//! Concrete backends live in `vesta-infra`.

#![warn(missing_docs)]

pub mod asset;
pub mod memory;
pub mod renderer;

pub use memory::{HandlePool, RawHandle};
pub use renderer::{Renderer, SharedRenderer};
