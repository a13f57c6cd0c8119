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

/// The projection model of a [`Camera`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Right-handed perspective projection with an OpenGL depth range.
    Perspective {
        /// Vertical field of view, in radians.
        fov_y: f32,
        /// Width / height.
        aspect: f32,
        /// Near clip distance.
        near: f32,
        /// Far clip distance.
        far: f32,
    },
    /// Right-handed orthographic projection with an OpenGL depth range.
    Orthographic {
        /// Half of the visible width.
        half_width: f32,
        /// Half of the visible height.
        half_height: f32,
        /// Near clip distance.
        near: f32,
        /// Far clip distance.
        far: f32,
    },
}

impl Projection {
    /// The view → clip matrix.
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh_gl(fov_y, aspect, near, far),
            Projection::Orthographic {
                half_width,
                half_height,
                near,
                far,
            } => Mat4::orthographic_rh_gl(
                -half_width,
                half_width,
                -half_height,
                half_height,
                near,
                far,
            ),
        }
    }
}

/// A minimal camera: a projection plus the world transform of the node carrying it.
///
/// The view matrix is the inverse of the world transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    projection: Projection,
    world: Mat4,
}

impl Camera {
    /// A perspective camera at the origin looking down -Z.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            },
            world: Mat4::IDENTITY,
        }
    }

    /// An orthographic camera at the origin looking down -Z.
    pub fn orthographic(half_width: f32, half_height: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Orthographic {
                half_width,
                half_height,
                near,
                far,
            },
            world: Mat4::IDENTITY,
        }
    }

    /// Moves the camera.
    pub fn set_world_transform(&mut self, world: Mat4) {
        self.world = world;
    }

    /// The camera's world transform.
    pub fn world_transform(&self) -> &Mat4 {
        &self.world
    }

    /// The camera's projection model.
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Changes the aspect ratio of a perspective camera; orthographic cameras are
    /// left untouched.
    pub fn set_aspect(&mut self, new_aspect: f32) {
        if let Projection::Perspective { aspect, .. } = &mut self.projection {
            *aspect = new_aspect;
        }
    }
}

impl CameraView for Camera {
    fn view_matrix(&self) -> Mat4 {
        self.world.inverse()
    }

    fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::{Vec3, Vec4};

    #[test]
    fn view_is_inverse_of_world() {
        let mut camera = Camera::perspective(1.0, 1.5, 0.1, 100.0);
        let world = Mat4::from_translation(Vec3::new(0.0, 2.0, 5.0));
        camera.set_world_transform(world);

        assert_relative_eq!(camera.view_matrix() * world, Mat4::IDENTITY, epsilon = 1e-6);
    }

    #[test]
    fn orthographic_maps_extent_to_unit_cube() {
        let camera = Camera::orthographic(4.0, 2.0, 0.0, 10.0);
        let clip = camera.view_projection_matrix() * Vec4::new(4.0, -2.0, -10.0, 1.0);
        assert_relative_eq!(clip, Vec4::new(1.0, -1.0, 1.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn set_aspect_only_affects_perspective() {
        let mut camera = Camera::orthographic(1.0, 1.0, 0.1, 10.0);
        camera.set_aspect(2.0);
        assert_eq!(camera.projection(), Camera::orthographic(1.0, 1.0, 0.1, 10.0).projection());

        let mut camera = Camera::perspective(1.0, 1.0, 0.1, 10.0);
        camera.set_aspect(2.0);
        assert!(matches!(
            camera.projection(),
            Projection::Perspective { aspect, .. } if aspect == 2.0
        ));
    }
}
