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

//! Named material inputs bound to program uniforms.

use super::auto_binding::AutoBinding;
use crate::renderer::api::{UniformType, UniformValue};
use crate::renderer::error::ResourceError;
use crate::renderer::handles::UniformHandle;
use crate::renderer::scene::{Effect, RenderContext, Texture};
use crate::renderer::traits::SharedRenderer;
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::rc::Rc;

/// A value stored by a [`MaterialParameter`].
///
/// Array payloads are owned copies; nothing here aliases caller memory.
#[derive(Clone)]
pub enum ParameterValue {
    /// A single float.
    Float(f32),
    /// An array of floats.
    FloatArray(Vec<f32>),
    /// A 2-component vector.
    Vector2(Vec2),
    /// An array of 2-component vectors.
    Vector2Array(Vec<Vec2>),
    /// A 3-component vector.
    Vector3(Vec3),
    /// An array of 3-component vectors.
    Vector3Array(Vec<Vec3>),
    /// A 4-component vector.
    Vector4(Vec4),
    /// An array of 4-component vectors.
    Vector4Array(Vec<Vec4>),
    /// A 4×4 matrix.
    Matrix(Mat4),
    /// An array of 4×4 matrices.
    MatrixArray(Vec<Mat4>),
    /// A shared texture, bound before its unit is written.
    Texture(Rc<dyn Texture>),
}

impl ParameterValue {
    /// The uniform type this value writes.
    pub fn uniform_type(&self) -> UniformType {
        match self {
            ParameterValue::Float(_) => UniformType::Float,
            ParameterValue::FloatArray(_) => UniformType::FloatArray,
            ParameterValue::Vector2(_) => UniformType::Vector2,
            ParameterValue::Vector2Array(_) => UniformType::Vector2Array,
            ParameterValue::Vector3(_) => UniformType::Vector3,
            ParameterValue::Vector3Array(_) => UniformType::Vector3Array,
            ParameterValue::Vector4(_) => UniformType::Vector4,
            ParameterValue::Vector4Array(_) => UniformType::Vector4Array,
            ParameterValue::Matrix(_) => UniformType::Matrix,
            ParameterValue::MatrixArray(_) => UniformType::MatrixArray,
            ParameterValue::Texture(_) => UniformType::Texture,
        }
    }

    /// Borrows the value in the form the renderer accepts.
    pub fn as_uniform_value(&self) -> UniformValue<'_> {
        match self {
            ParameterValue::Float(v) => UniformValue::Float(*v),
            ParameterValue::FloatArray(v) => UniformValue::FloatArray(v),
            ParameterValue::Vector2(v) => UniformValue::Vector2(*v),
            ParameterValue::Vector2Array(v) => UniformValue::Vector2Array(v),
            ParameterValue::Vector3(v) => UniformValue::Vector3(*v),
            ParameterValue::Vector3Array(v) => UniformValue::Vector3Array(v),
            ParameterValue::Vector4(v) => UniformValue::Vector4(*v),
            ParameterValue::Vector4Array(v) => UniformValue::Vector4Array(v),
            ParameterValue::Matrix(m) => UniformValue::Matrix(*m),
            ParameterValue::MatrixArray(v) => UniformValue::MatrixArray(v),
            ParameterValue::Texture(t) => UniformValue::Texture(t.handle()),
        }
    }
}

impl std::fmt::Debug for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterValue::Texture(t) => f.debug_tuple("Texture").field(&t.handle()).finish(),
            other => std::fmt::Debug::fmt(&other.as_uniform_value(), f),
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident, $array:ident;)*) => {
        $(
            impl From<$ty> for ParameterValue {
                fn from(value: $ty) -> Self {
                    ParameterValue::$variant(value)
                }
            }

            impl From<&[$ty]> for ParameterValue {
                fn from(values: &[$ty]) -> Self {
                    ParameterValue::$array(values.to_vec())
                }
            }

            impl From<Vec<$ty>> for ParameterValue {
                fn from(values: Vec<$ty>) -> Self {
                    ParameterValue::$array(values)
                }
            }
        )*
    };
}

impl_from_value! {
    f32 => Float, FloatArray;
    Vec2 => Vector2, Vector2Array;
    Vec3 => Vector3, Vector3Array;
    Vec4 => Vector4, Vector4Array;
    Mat4 => Matrix, MatrixArray;
}

impl<T: Texture + 'static> From<Rc<T>> for ParameterValue {
    fn from(texture: Rc<T>) -> Self {
        ParameterValue::Texture(texture)
    }
}

#[derive(Debug, Clone)]
enum Binding {
    Unset,
    Value(ParameterValue),
    Auto(AutoBinding),
}

/// One named input of a material, bound to a uniform of the material's program.
///
/// The parameter owns its uniform handle and destroys it when dropped.
pub struct MaterialParameter {
    renderer: SharedRenderer,
    name: String,
    uniform_type: UniformType,
    uniform: UniformHandle,
    binding: Binding,
}

impl MaterialParameter {
    /// Creates a parameter for the uniform `name` of `effect`.
    ///
    /// # Errors
    /// [`ResourceError::UniformNotFound`] if the program has no such uniform.
    pub fn new(effect: &Effect, name: &str, uniform_type: UniformType) -> Result<Self, ResourceError> {
        let uniform = effect.create_uniform(name, uniform_type)?;
        Ok(Self {
            renderer: effect.renderer().clone(),
            name: name.to_string(),
            uniform_type,
            uniform,
            binding: Binding::Unset,
        })
    }

    /// Stores a literal or texture value.
    ///
    /// # Errors
    /// [`ResourceError::UniformTypeMismatch`] if the value's type differs from the
    /// parameter's uniform type; the previous value is kept.
    pub fn set_value(&mut self, value: impl Into<ParameterValue>) -> Result<(), ResourceError> {
        let value = value.into();
        self.check_type(value.uniform_type())?;
        self.binding = Binding::Value(value);
        Ok(())
    }

    /// Binds the parameter to a value computed per draw.
    pub fn set_auto_binding(&mut self, binding: AutoBinding) -> Result<(), ResourceError> {
        self.check_type(binding.uniform_type())?;
        self.binding = Binding::Auto(binding);
        Ok(())
    }

    /// Forgets the stored value or auto-binding; `apply` then writes nothing.
    pub fn clear(&mut self) {
        self.binding = Binding::Unset;
    }

    fn check_type(&self, found: UniformType) -> Result<(), ResourceError> {
        if found == self.uniform_type {
            Ok(())
        } else {
            Err(ResourceError::UniformTypeMismatch {
                name: self.name.clone(),
                expected: self.uniform_type,
                found,
            })
        }
    }

    /// Writes the parameter to its uniform.
    ///
    /// Auto-bound values whose context reference is missing are skipped for this draw.
    pub fn apply(&self, context: &RenderContext<'_>) -> Result<(), ResourceError> {
        match &self.binding {
            Binding::Unset => Ok(()),
            Binding::Value(ParameterValue::Texture(texture)) => {
                texture.bind()?;
                self.renderer
                    .borrow_mut()
                    .set_uniform(self.uniform, UniformValue::Texture(texture.handle()))
            }
            Binding::Value(value) => self
                .renderer
                .borrow_mut()
                .set_uniform(self.uniform, value.as_uniform_value()),
            Binding::Auto(auto) => match auto.evaluate(context) {
                Some(value) => self.renderer.borrow_mut().set_uniform(self.uniform, value),
                None => {
                    log::trace!("Skipping '{}': {auto:?} unavailable in this context", self.name);
                    Ok(())
                }
            },
        }
    }

    /// The uniform name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The uniform type the parameter accepts.
    pub fn uniform_type(&self) -> UniformType {
        self.uniform_type
    }

    /// The uniform handle this parameter writes to.
    pub fn uniform(&self) -> UniformHandle {
        self.uniform
    }

    /// The stored literal or texture value.
    pub fn value(&self) -> Option<&ParameterValue> {
        match &self.binding {
            Binding::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The auto-binding, if the parameter has one.
    pub fn auto_binding(&self) -> Option<AutoBinding> {
        match self.binding {
            Binding::Auto(auto) => Some(auto),
            _ => None,
        }
    }
}

impl Drop for MaterialParameter {
    fn drop(&mut self) {
        self.renderer.borrow_mut().destroy_uniform(self.uniform);
    }
}

impl std::fmt::Debug for MaterialParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialParameter")
            .field("name", &self.name)
            .field("uniform_type", &self.uniform_type)
            .field("uniform", &self.uniform)
            .field("binding", &self.binding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_are_copied() {
        let mut weights = vec![0.25f32, 0.75];
        let value = ParameterValue::from(weights.as_slice());
        weights[0] = 1.0;

        match value {
            ParameterValue::FloatArray(stored) => assert_eq!(stored, vec![0.25, 0.75]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn values_report_their_uniform_type() {
        assert_eq!(ParameterValue::from(1.0f32).uniform_type(), UniformType::Float);
        assert_eq!(
            ParameterValue::from(vec![Mat4::IDENTITY; 2]).uniform_type(),
            UniformType::MatrixArray
        );
        assert_eq!(
            ParameterValue::from(Vec3::ONE).as_uniform_value(),
            UniformValue::Vector3(Vec3::ONE)
        );
    }
}
