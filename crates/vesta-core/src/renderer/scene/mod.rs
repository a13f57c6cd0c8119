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

//! Owning wrappers around renderer resources.
//!
//! Each wrapper holds a [`SharedRenderer`](crate::renderer::SharedRenderer) and
//! destroys the handles it owns when dropped, derived resources before the resources
//! they were built from.

mod camera;
mod context;
mod effect;
mod frame_buffer;
mod mesh;
mod texture;

pub use self::camera::{Camera, Projection};
pub use self::context::RenderContext;
pub use self::effect::Effect;
pub use self::frame_buffer::FrameBuffer;
pub use self::mesh::{Mesh, MeshPrefab};
pub use self::texture::{CubeTexture, Texture, Texture2d};
