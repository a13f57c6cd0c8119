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

//! Name-based shader reflection shared by every backend.
//!
//! Backends introspect a program once, right after linking, and turn the native
//! active-attribute and active-uniform lists into the lookup tables defined here.
//! Vertex bindings and uniforms are then resolved against those tables; no name
//! lookup happens on the per-draw path.

use crate::renderer::api::{UniformType, VertexBufferLayout};
use crate::renderer::error::ResourceError;
use std::collections::HashMap;

/// The sampler type of a texture uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerKind {
    /// `sampler2D`.
    Texture2d,
    /// `samplerCube`.
    Cube,
}

/// A vertex input reported by the native program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAttribute {
    /// Input name as declared in the vertex shader.
    pub name: String,
    /// Input slot (attribute location).
    pub slot: u32,
}

/// A uniform reported by the native program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUniform {
    /// Name as reported by the driver; arrays may carry a `[0]` suffix.
    pub name: String,
    /// Declared array size, 1 for non-arrays.
    pub array_size: u32,
    /// The value type, `None` for types values cannot be written to (integers,
    /// booleans, 3×3 matrices).
    pub value_type: Option<UniformType>,
    /// `Some` for sampler uniforms.
    pub sampler: Option<SamplerKind>,
}

/// Removes a trailing `[...]` array suffix from a uniform name.
///
/// `lights[0]` becomes `lights`; `lights[0].color` is left untouched because the
/// suffix is not trailing.
pub fn strip_array_suffix(name: &str) -> &str {
    if !name.ends_with(']') {
        return name;
    }
    match name.rfind('[') {
        Some(open) => &name[..open],
        None => name,
    }
}

/// The name → slot map of a program's vertex inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSlots {
    slots: HashMap<String, u32>,
}

impl AttributeSlots {
    /// Builds the map from the program's active attributes.
    pub fn from_active(attributes: impl IntoIterator<Item = ActiveAttribute>) -> Self {
        let slots = attributes
            .into_iter()
            .map(|attribute| (attribute.name, attribute.slot))
            .collect();
        Self { slots }
    }

    /// The slot of the input called `name`, if the program declares it.
    pub fn slot(&self, name: &str) -> Option<u32> {
        self.slots.get(name).copied()
    }

    /// Number of active inputs.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the program has no active inputs.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// One vertex attribute wired to a program input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeWiring {
    /// Position of the source buffer in the list the binding was built from.
    pub buffer_index: usize,
    /// Program input slot.
    pub slot: u32,
    /// Number of float components.
    pub components: u32,
    /// Byte distance between consecutive vertices.
    pub stride: u32,
    /// Byte offset of the attribute inside a vertex.
    pub offset: u32,
}

/// Resolves every attribute of every layout against the program's input slots.
///
/// Attributes whose input name the program does not declare are skipped; a shader
/// that ignores an attribute is legal. The cost is linear in the total number of
/// layout attributes and independent of vertex count.
pub fn wire_attributes<'a>(
    layouts: impl IntoIterator<Item = &'a VertexBufferLayout>,
    slots: &AttributeSlots,
) -> Vec<AttributeWiring> {
    let mut wiring = Vec::new();
    for (buffer_index, layout) in layouts.into_iter().enumerate() {
        for attribute in layout.attributes() {
            let name = attribute.semantic.input_name();
            match slots.slot(name) {
                Some(slot) => wiring.push(AttributeWiring {
                    buffer_index,
                    slot,
                    components: attribute.components,
                    stride: layout.size(),
                    offset: attribute.offset,
                }),
                None => log::trace!("Program has no input '{name}', attribute left unwired"),
            }
        }
    }
    wiring
}

/// A uniform entry of a [`UniformTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedUniform {
    /// Name with any array suffix removed.
    pub name: String,
    /// Position in the native active-uniform list.
    pub native_index: usize,
    /// Declared array size, 1 for non-arrays.
    pub array_size: u32,
    /// The value type, when known.
    pub value_type: Option<UniformType>,
    /// `Some` for sampler uniforms.
    pub sampler: Option<SamplerKind>,
    /// Texture unit reserved for a sampler uniform.
    pub texture_unit: Option<u32>,
}

/// The uniforms of a program, keyed by name, with texture units assigned.
///
/// Sampler uniforms receive monotonically increasing texture units in active-list
/// order; a sampler array reserves as many consecutive units as it has elements, so
/// no two samplers of the same program share a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformTable {
    uniforms: HashMap<String, ReflectedUniform>,
    texture_units_used: u32,
}

impl UniformTable {
    /// Builds the table from the program's active uniforms.
    pub fn from_active(uniforms: impl IntoIterator<Item = ActiveUniform>) -> Self {
        let mut table = UniformTable::default();
        for (native_index, active) in uniforms.into_iter().enumerate() {
            let name = strip_array_suffix(&active.name).to_string();
            if table.uniforms.contains_key(&name) {
                continue;
            }
            let array_size = active.array_size.max(1);
            let texture_unit = active.sampler.map(|_| {
                let unit = table.texture_units_used;
                table.texture_units_used += array_size;
                unit
            });
            table.uniforms.insert(
                name.clone(),
                ReflectedUniform {
                    name,
                    native_index,
                    array_size,
                    value_type: active.value_type,
                    sampler: active.sampler,
                    texture_unit,
                },
            );
        }
        table
    }

    /// Looks up an active uniform by name (without array suffix).
    ///
    /// # Errors
    /// [`ResourceError::UniformNotFound`] if the program has no such active uniform.
    pub fn find(&self, name: &str) -> Result<&ReflectedUniform, ResourceError> {
        self.uniforms
            .get(strip_array_suffix(name))
            .ok_or_else(|| ResourceError::UniformNotFound {
                name: name.to_string(),
            })
    }

    /// Looks up an active uniform and checks it can hold values of `requested`.
    ///
    /// # Errors
    /// [`ResourceError::UniformNotFound`] for an unknown name,
    /// [`ResourceError::UniformTypeMismatch`] when the declared type differs.
    pub fn resolve(
        &self,
        name: &str,
        requested: UniformType,
    ) -> Result<&ReflectedUniform, ResourceError> {
        let uniform = self.find(name)?;
        let declared = uniform.value_type.or(uniform.sampler.map(|_| UniformType::Texture));
        match declared {
            Some(declared) if declared != requested => Err(ResourceError::UniformTypeMismatch {
                name: name.to_string(),
                expected: declared,
                found: requested,
            }),
            _ => Ok(uniform),
        }
    }

    /// Number of active uniforms.
    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    /// Returns `true` if the program has no active uniforms.
    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }

    /// Number of texture units reserved by the program's samplers.
    pub fn texture_units_used(&self) -> u32 {
        self.texture_units_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::VertexAttributeSemantic;

    fn uniform(name: &str, array_size: u32, sampler: Option<SamplerKind>) -> ActiveUniform {
        let value_type = match sampler {
            Some(_) => UniformType::Texture,
            None => UniformType::Matrix.with_array_size(array_size),
        };
        ActiveUniform {
            name: name.to_string(),
            array_size,
            value_type: Some(value_type),
            sampler,
        }
    }

    #[test]
    fn strips_only_trailing_array_suffix() {
        assert_eq!(strip_array_suffix("bones[0]"), "bones");
        assert_eq!(strip_array_suffix("matrix"), "matrix");
        assert_eq!(strip_array_suffix("lights[0].color"), "lights[0].color");
    }

    #[test]
    fn sampler_units_are_distinct_and_skip_array_sizes() {
        let table = UniformTable::from_active(vec![
            uniform("worldViewProjMatrix", 1, None),
            uniform("shadowMaps[0]", 3, Some(SamplerKind::Texture2d)),
            uniform("diffuse", 1, Some(SamplerKind::Texture2d)),
            uniform("skybox", 1, Some(SamplerKind::Cube)),
        ]);

        assert_eq!(table.find("worldViewProjMatrix").unwrap().texture_unit, None);
        assert_eq!(table.find("shadowMaps").unwrap().texture_unit, Some(0));
        assert_eq!(table.find("diffuse").unwrap().texture_unit, Some(3));
        assert_eq!(table.find("skybox").unwrap().texture_unit, Some(4));
        assert_eq!(table.texture_units_used(), 5);
    }

    #[test]
    fn unknown_uniform_is_not_found() {
        let table = UniformTable::from_active(vec![uniform("color", 1, None)]);
        assert_eq!(
            table.find("colour"),
            Err(ResourceError::UniformNotFound {
                name: "colour".to_string()
            })
        );
    }

    #[test]
    fn resolve_checks_the_declared_type() {
        let table = UniformTable::from_active(vec![
            uniform("bones[0]", 4, None),
            uniform("diffuse", 1, Some(SamplerKind::Texture2d)),
        ]);

        assert!(table.resolve("bones", UniformType::MatrixArray).is_ok());
        assert!(table.resolve("diffuse", UniformType::Texture).is_ok());
        assert_eq!(
            table.resolve("diffuse", UniformType::Vector4),
            Err(ResourceError::UniformTypeMismatch {
                name: "diffuse".to_string(),
                expected: UniformType::Texture,
                found: UniformType::Vector4,
            })
        );
    }

    #[test]
    fn undeclared_semantics_are_skipped() {
        let slots = AttributeSlots::from_active(vec![
            ActiveAttribute {
                name: "position".to_string(),
                slot: 0,
            },
            ActiveAttribute {
                name: "texCoord0".to_string(),
                slot: 2,
            },
        ]);
        let positions = VertexBufferLayout::new()
            .with(VertexAttributeSemantic::Position, 3)
            .with(VertexAttributeSemantic::Normal, 3);
        let uvs = VertexBufferLayout::new().with(VertexAttributeSemantic::TexCoord0, 2);

        let wiring = wire_attributes([&positions, &uvs], &slots);

        assert_eq!(
            wiring,
            vec![
                AttributeWiring {
                    buffer_index: 0,
                    slot: 0,
                    components: 3,
                    stride: 24,
                    offset: 0,
                },
                AttributeWiring {
                    buffer_index: 1,
                    slot: 2,
                    components: 2,
                    stride: 8,
                    offset: 0,
                },
            ]
        );
    }
}
