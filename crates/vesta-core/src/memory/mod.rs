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

//! Index-based storage used by the renderer backends.
//!
//! Native graphics objects are never referenced by pointer outside of a backend.
//! Instead every backend keeps one [`HandlePool`] per resource kind and hands out
//! [`RawHandle`]s (wrapped in typed handles, see [`crate::renderer::handles`]).

mod handle_pool;

pub use self::handle_pool::{HandlePool, RawHandle};
