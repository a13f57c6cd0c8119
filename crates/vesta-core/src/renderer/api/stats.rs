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

//! Live resource counters reported by a renderer.

/// A snapshot of how many resources of each kind a renderer currently holds, plus the
/// number of draw calls it has issued since it was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RendererStats {
    /// Live textures.
    pub textures: usize,
    /// Live framebuffers.
    pub frame_buffers: usize,
    /// Live vertex buffers.
    pub vertex_buffers: usize,
    /// Live index buffers.
    pub index_buffers: usize,
    /// Live programs.
    pub programs: usize,
    /// Live vertex bindings.
    pub vertex_bindings: usize,
    /// Live uniforms.
    pub uniforms: usize,
    /// Draw calls issued.
    pub draw_calls: u64,
}

impl RendererStats {
    /// Total number of live resources of every kind.
    pub fn live_resources(&self) -> usize {
        self.textures
            + self.frame_buffers
            + self.vertex_buffers
            + self.index_buffers
            + self.programs
            + self.vertex_bindings
            + self.uniforms
    }
}
