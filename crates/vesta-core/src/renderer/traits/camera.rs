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

use glam::Mat4;

/// The matrices a camera supplies to the renderer.
///
/// Cameras belong to the scene layer; the renderer only reads them through this
/// trait while resolving auto-bound material parameters.
pub trait CameraView {
    /// World → view transform.
    fn view_matrix(&self) -> Mat4;

    /// View → clip transform.
    fn projection_matrix(&self) -> Mat4;

    /// World → clip transform.
    fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
