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

//! Uniform types and the values written to them.

use crate::renderer::handles::TextureHandle;
use glam::{Mat4, Vec2, Vec3, Vec4};

/// The type a uniform is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    /// `float`.
    Float,
    /// `float[N]`.
    FloatArray,
    /// `vec2`.
    Vector2,
    /// `vec2[N]`.
    Vector2Array,
    /// `vec3`.
    Vector3,
    /// `vec3[N]`.
    Vector3Array,
    /// `vec4`.
    Vector4,
    /// `vec4[N]`.
    Vector4Array,
    /// `mat4`.
    Matrix,
    /// `mat4[N]`.
    MatrixArray,
    /// `sampler2D` or `samplerCube`.
    Texture,
}

impl UniformType {
    /// Returns `true` for the sampler type.
    pub fn is_texture(&self) -> bool {
        matches!(self, UniformType::Texture)
    }

    /// The type of a uniform declared with `array_size` elements of `self`.
    ///
    /// Sizes of 0 or 1 leave the type unchanged; so do textures and types that are
    /// already arrays.
    pub fn with_array_size(self, array_size: u32) -> Self {
        if array_size <= 1 {
            return self;
        }
        match self {
            UniformType::Float => UniformType::FloatArray,
            UniformType::Vector2 => UniformType::Vector2Array,
            UniformType::Vector3 => UniformType::Vector3Array,
            UniformType::Vector4 => UniformType::Vector4Array,
            UniformType::Matrix => UniformType::MatrixArray,
            other => other,
        }
    }
}

/// A value written to a uniform with [`Renderer::set_uniform`].
///
/// Array variants borrow the caller's data for the duration of the call only; the
/// element count written is the slice length.
///
/// [`Renderer::set_uniform`]: crate::renderer::Renderer::set_uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a> {
    /// A single float.
    Float(f32),
    /// A float array.
    FloatArray(&'a [f32]),
    /// A 2-component vector.
    Vector2(Vec2),
    /// An array of 2-component vectors.
    Vector2Array(&'a [Vec2]),
    /// A 3-component vector.
    Vector3(Vec3),
    /// An array of 3-component vectors.
    Vector3Array(&'a [Vec3]),
    /// A 4-component vector.
    Vector4(Vec4),
    /// An array of 4-component vectors.
    Vector4Array(&'a [Vec4]),
    /// A column-major 4x4 matrix.
    Matrix(Mat4),
    /// An array of 4x4 matrices.
    MatrixArray(&'a [Mat4]),
    /// A texture bound to the uniform's texture unit.
    Texture(TextureHandle),
}

impl UniformValue<'_> {
    /// The uniform type this value can be written to.
    pub fn uniform_type(&self) -> UniformType {
        match self {
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::FloatArray(_) => UniformType::FloatArray,
            UniformValue::Vector2(_) => UniformType::Vector2,
            UniformValue::Vector2Array(_) => UniformType::Vector2Array,
            UniformValue::Vector3(_) => UniformType::Vector3,
            UniformValue::Vector3Array(_) => UniformType::Vector3Array,
            UniformValue::Vector4(_) => UniformType::Vector4,
            UniformValue::Vector4Array(_) => UniformType::Vector4Array,
            UniformValue::Matrix(_) => UniformType::Matrix,
            UniformValue::MatrixArray(_) => UniformType::MatrixArray,
            UniformValue::Texture(_) => UniformType::Texture,
        }
    }

    /// Number of elements written (1 for non-array values).
    pub fn count(&self) -> usize {
        match self {
            UniformValue::FloatArray(v) => v.len(),
            UniformValue::Vector2Array(v) => v.len(),
            UniformValue::Vector3Array(v) => v.len(),
            UniformValue::Vector4Array(v) => v.len(),
            UniformValue::MatrixArray(v) => v.len(),
            _ => 1,
        }
    }

    /// The value flattened to floats, as the native uniform upload expects them.
    ///
    /// Returns `None` for textures.
    pub fn to_floats(&self) -> Option<Vec<f32>> {
        let floats = match self {
            UniformValue::Float(v) => vec![*v],
            UniformValue::FloatArray(v) => v.to_vec(),
            UniformValue::Vector2(v) => v.to_array().to_vec(),
            UniformValue::Vector2Array(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Vector3(v) => v.to_array().to_vec(),
            UniformValue::Vector3Array(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Vector4(v) => v.to_array().to_vec(),
            UniformValue::Vector4Array(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Matrix(m) => m.to_cols_array().to_vec(),
            UniformValue::MatrixArray(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Texture(_) => return None,
        };
        Some(floats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_values_report_their_length() {
        let data = [Vec3::X, Vec3::Y, Vec3::Z];
        let value = UniformValue::Vector3Array(&data);
        assert_eq!(value.uniform_type(), UniformType::Vector3Array);
        assert_eq!(value.count(), 3);
        assert_eq!(value.to_floats().unwrap().len(), 9);
    }

    #[test]
    fn array_size_promotes_scalar_types() {
        assert_eq!(UniformType::Float.with_array_size(1), UniformType::Float);
        assert_eq!(UniformType::Vector4.with_array_size(8), UniformType::Vector4Array);
        assert_eq!(UniformType::Texture.with_array_size(4), UniformType::Texture);
    }

    #[test]
    fn matrix_flattens_column_major() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let floats = UniformValue::Matrix(m).to_floats().unwrap();
        assert_eq!(&floats[12..15], &[1.0, 2.0, 3.0]);
        assert!(UniformValue::Texture(TextureHandle::EMPTY)
            .to_floats()
            .is_none());
    }
}
