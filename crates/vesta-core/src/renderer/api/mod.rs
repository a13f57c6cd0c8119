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

//! Backend-agnostic value types exchanged through the [`Renderer`] contract.
//!
//! - **[`vertex`]**: vertex attribute semantics and buffer layouts.
//! - **[`texture`]**: pixel formats, cube faces and sampling state.
//! - **[`state`]**: immediate pipeline state (culling, blending, depth, primitives).
//! - **[`uniform`]**: uniform types and the values written to them.
//! - **[`shader`]**: shader stages.
//! - **[`backend`]**: backend identification and renderer configuration.
//! - **[`stats`]**: live resource counters.
//!
//! [`Renderer`]: crate::renderer::Renderer

pub mod backend;
pub mod shader;
pub mod state;
pub mod stats;
pub mod texture;
pub mod uniform;
pub mod vertex;

pub use self::backend::*;
pub use self::shader::*;
pub use self::state::*;
pub use self::stats::*;
pub use self::texture::*;
pub use self::uniform::*;
pub use self::vertex::*;
