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

use crate::renderer::traits::CameraView;
use glam::Mat4;

/// The per-draw references auto-bound material parameters are computed from.
///
/// Nothing here is owned: the scene layer lends the active camera and the relevant
/// world transforms for the duration of one draw. `None` means "not available this
/// draw"; parameters that need a missing entry are skipped.
#[derive(Clone, Copy, Default)]
pub struct RenderContext<'a> {
    /// The camera rendering this pass.
    pub camera: Option<&'a dyn CameraView>,
    /// World transform of the camera's node.
    pub camera_transform: Option<&'a Mat4>,
    /// World transform of the node being drawn.
    pub node_transform: Option<&'a Mat4>,
}

impl<'a> RenderContext<'a> {
    /// A context with nothing available.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the active camera and its world transform.
    pub fn with_camera(mut self, camera: &'a dyn CameraView, transform: &'a Mat4) -> Self {
        self.camera = Some(camera);
        self.camera_transform = Some(transform);
        self
    }

    /// Sets the world transform of the node being drawn.
    pub fn with_node(mut self, transform: &'a Mat4) -> Self {
        self.node_transform = Some(transform);
        self
    }
}

impl std::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("camera", &self.camera.is_some())
            .field("camera_transform", &self.camera_transform)
            .field("node_transform", &self.node_transform)
            .finish()
    }
}
