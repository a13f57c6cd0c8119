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

//! Backend identification and renderer configuration.

use serde::{Deserialize, Serialize};

/// The concrete implementations of the renderer contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RendererBackendType {
    /// OpenGL 2.1+ / OpenGL ES 2.0+ through `glow`.
    OpenGl,
    /// No GPU. Resources are tracked and draw calls recorded, nothing is rasterized.
    Headless,
}

/// Fixed capacities of the per-kind handle pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Maximum live textures.
    pub textures: usize,
    /// Maximum live framebuffers.
    pub frame_buffers: usize,
    /// Maximum live vertex buffers.
    pub vertex_buffers: usize,
    /// Maximum live index buffers.
    pub index_buffers: usize,
    /// Maximum live programs.
    pub programs: usize,
    /// Maximum live vertex bindings.
    pub vertex_bindings: usize,
    /// Maximum live uniforms.
    pub uniforms: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            textures: 1024,
            frame_buffers: 128,
            vertex_buffers: 4096,
            index_buffers: 4096,
            programs: 512,
            vertex_bindings: 4096,
            uniforms: 8192,
        }
    }
}

/// Renderer start-up configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Backends to try, in order of preference.
    pub preferred_backends: Vec<RendererBackendType>,
    /// Handle pool capacities.
    pub limits: ResourceLimits,
    /// Colour used by the initial clear state.
    pub clear_color: [f32; 4],
    /// Initial viewport size; `None` keeps the backend's default.
    pub viewport: Option<(u32, u32)>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            preferred_backends: vec![RendererBackendType::OpenGl, RendererBackendType::Headless],
            limits: ResourceLimits::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            viewport: None,
        }
    }
}

impl RendererConfig {
    /// Parses a configuration written in RON. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// A configuration that selects the headless backend only.
    pub fn headless() -> Self {
        Self {
            preferred_backends: vec![RendererBackendType::Headless],
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_ron() {
        let config = RendererConfig::from_ron_str(
            "(preferred_backends: [Headless], limits: (textures: 4))",
        )
        .unwrap();
        assert_eq!(config.preferred_backends, vec![RendererBackendType::Headless]);
        assert_eq!(config.limits.textures, 4);
        assert_eq!(
            config.limits.programs,
            ResourceLimits::default().programs,
            "unspecified limits keep their defaults"
        );
    }

    #[test]
    fn default_prefers_opengl() {
        let config = RendererConfig::default();
        assert_eq!(config.preferred_backends[0], RendererBackendType::OpenGl);
        assert!(RendererConfig::from_ron_str("(preferred_backends: [Vulkan])").is_err());
    }
}
