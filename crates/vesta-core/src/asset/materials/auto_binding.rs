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

//! Material parameters computed from the render context.

use crate::renderer::api::{UniformType, UniformValue};
use crate::renderer::scene::RenderContext;
use glam::Mat4;

/// A value a material parameter derives from the camera and node transforms of the
/// current draw instead of storing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoBinding {
    /// The drawn node's world transform.
    WorldMatrix,
    /// The camera's view matrix.
    ViewMatrix,
    /// The camera's projection matrix.
    ProjectionMatrix,
    /// `view × world`.
    WorldViewMatrix,
    /// `projection × view`.
    ViewProjectionMatrix,
    /// `projection × view × world`.
    WorldViewProjectionMatrix,
    /// Inverse transpose of the world transform, for normals.
    InverseTransposedWorldMatrix,
    /// Inverse transpose of `view × world`, for view-space normals.
    InverseTransposedWorldViewMatrix,
    /// Translation of the camera's world transform.
    CameraWorldPosition,
}

impl AutoBinding {
    /// The uniform type the computed value has.
    pub fn uniform_type(&self) -> UniformType {
        match self {
            AutoBinding::CameraWorldPosition => UniformType::Vector3,
            _ => UniformType::Matrix,
        }
    }

    /// Computes the value for this draw.
    ///
    /// Returns `None` when the context lacks a reference the value depends on.
    pub fn evaluate(&self, context: &RenderContext<'_>) -> Option<UniformValue<'static>> {
        let world = || context.node_transform.copied();
        let camera = context.camera;

        let value = match self {
            AutoBinding::WorldMatrix => UniformValue::Matrix(world()?),
            AutoBinding::ViewMatrix => UniformValue::Matrix(camera?.view_matrix()),
            AutoBinding::ProjectionMatrix => UniformValue::Matrix(camera?.projection_matrix()),
            AutoBinding::WorldViewMatrix => {
                UniformValue::Matrix(camera?.view_matrix() * world()?)
            }
            AutoBinding::ViewProjectionMatrix => {
                UniformValue::Matrix(camera?.view_projection_matrix())
            }
            AutoBinding::WorldViewProjectionMatrix => {
                UniformValue::Matrix(camera?.view_projection_matrix() * world()?)
            }
            AutoBinding::InverseTransposedWorldMatrix => {
                UniformValue::Matrix(inverse_transpose(world()?))
            }
            AutoBinding::InverseTransposedWorldViewMatrix => {
                UniformValue::Matrix(inverse_transpose(camera?.view_matrix() * world()?))
            }
            AutoBinding::CameraWorldPosition => {
                let transform = context.camera_transform?;
                UniformValue::Vector3(transform.w_axis.truncate())
            }
        };
        Some(value)
    }
}

fn inverse_transpose(matrix: Mat4) -> Mat4 {
    matrix.inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::scene::Camera;
    use crate::renderer::traits::CameraView;
    use approx::assert_relative_eq;
    use glam::{Quat, Vec3};

    fn camera() -> Camera {
        let mut camera = Camera::perspective(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        camera.set_world_transform(Mat4::from_translation(Vec3::new(0.0, 1.0, 8.0)));
        camera
    }

    fn matrix(value: Option<UniformValue<'static>>) -> Mat4 {
        match value {
            Some(UniformValue::Matrix(m)) => m,
            other => panic!("expected a matrix, got {other:?}"),
        }
    }

    #[test]
    fn world_view_projection_composes_camera_and_node() {
        let camera = camera();
        let node = Mat4::from_rotation_translation(
            Quat::from_rotation_y(0.7),
            Vec3::new(2.0, 0.0, -3.0),
        );
        let context = RenderContext::new()
            .with_camera(&camera, camera.world_transform())
            .with_node(&node);

        let wvp = matrix(AutoBinding::WorldViewProjectionMatrix.evaluate(&context));
        let expected = camera.projection_matrix() * camera.world_transform().inverse() * node;
        assert_relative_eq!(wvp, expected, epsilon = 1e-5);
    }

    #[test]
    fn inverse_transpose_keeps_normals_perpendicular() {
        let node = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let context = RenderContext::new().with_node(&node);
        let normal_matrix = matrix(AutoBinding::InverseTransposedWorldMatrix.evaluate(&context));

        let tangent = node.transform_vector3(Vec3::new(1.0, 1.0, 0.0));
        let normal = normal_matrix.transform_vector3(Vec3::new(1.0, -1.0, 0.0));
        assert_relative_eq!(tangent.dot(normal), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn missing_references_yield_nothing() {
        let camera = camera();
        let node = Mat4::IDENTITY;

        let no_camera = RenderContext::new().with_node(&node);
        assert!(AutoBinding::WorldViewProjectionMatrix.evaluate(&no_camera).is_none());
        assert!(AutoBinding::CameraWorldPosition.evaluate(&no_camera).is_none());
        assert!(AutoBinding::WorldMatrix.evaluate(&no_camera).is_some());

        let no_node = RenderContext::new().with_camera(&camera, camera.world_transform());
        assert!(AutoBinding::WorldViewMatrix.evaluate(&no_node).is_none());
        assert!(AutoBinding::ViewProjectionMatrix.evaluate(&no_node).is_some());
        assert_eq!(
            AutoBinding::CameraWorldPosition.evaluate(&no_node),
            Some(UniformValue::Vector3(Vec3::new(0.0, 1.0, 8.0)))
        );
    }
}
