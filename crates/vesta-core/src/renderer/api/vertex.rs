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

//! Vertex attribute semantics and vertex buffer layouts.

use std::borrow::Cow;

/// The conventional meaning of a vertex attribute.
///
/// Backends resolve a semantic to a shader input by name (see
/// [`VertexAttributeSemantic::input_name`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VertexAttributeSemantic {
    /// Object-space position.
    Position,
    /// Surface normal.
    Normal,
    /// Per-vertex colour.
    Color,
    /// Tangent, for normal mapping.
    Tangent,
    /// Binormal (bitangent), for normal mapping.
    Binormal,
    /// Texture coordinate set 0.
    TexCoord0,
    /// Texture coordinate set 1.
    TexCoord1,
    /// Texture coordinate set 2.
    TexCoord2,
    /// Texture coordinate set 3.
    TexCoord3,
    /// Texture coordinate set 4.
    TexCoord4,
    /// Texture coordinate set 5.
    TexCoord5,
    /// Texture coordinate set 6.
    TexCoord6,
    /// Texture coordinate set 7.
    TexCoord7,
    /// An attribute bound to a shader input with an explicit name.
    Custom(String),
}

impl VertexAttributeSemantic {
    /// The shader input name this semantic is bound to.
    pub fn input_name(&self) -> &str {
        match self {
            VertexAttributeSemantic::Position => "position",
            VertexAttributeSemantic::Normal => "normal",
            VertexAttributeSemantic::Color => "color",
            VertexAttributeSemantic::Tangent => "tangent",
            VertexAttributeSemantic::Binormal => "binormal",
            VertexAttributeSemantic::TexCoord0 => "texCoord0",
            VertexAttributeSemantic::TexCoord1 => "texCoord1",
            VertexAttributeSemantic::TexCoord2 => "texCoord2",
            VertexAttributeSemantic::TexCoord3 => "texCoord3",
            VertexAttributeSemantic::TexCoord4 => "texCoord4",
            VertexAttributeSemantic::TexCoord5 => "texCoord5",
            VertexAttributeSemantic::TexCoord6 => "texCoord6",
            VertexAttributeSemantic::TexCoord7 => "texCoord7",
            VertexAttributeSemantic::Custom(name) => name,
        }
    }

    /// The texture coordinate semantic for set `index`, if `index < 8`.
    pub fn tex_coord(index: usize) -> Option<Self> {
        Some(match index {
            0 => VertexAttributeSemantic::TexCoord0,
            1 => VertexAttributeSemantic::TexCoord1,
            2 => VertexAttributeSemantic::TexCoord2,
            3 => VertexAttributeSemantic::TexCoord3,
            4 => VertexAttributeSemantic::TexCoord4,
            5 => VertexAttributeSemantic::TexCoord5,
            6 => VertexAttributeSemantic::TexCoord6,
            7 => VertexAttributeSemantic::TexCoord7,
            _ => return None,
        })
    }
}

/// One attribute inside a vertex: a semantic, a float component count and a byte
/// offset from the start of the vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// What the attribute means.
    pub semantic: VertexAttributeSemantic,
    /// Number of `f32` components (1 to 4).
    pub components: u32,
    /// Byte offset inside the vertex.
    pub offset: u32,
}

impl VertexAttribute {
    /// The shader input name of the attribute.
    pub fn input_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.semantic.input_name())
    }
}

/// The interleaved layout of a vertex buffer.
///
/// Attributes keep their insertion order and are packed tightly; every component is
/// a 32-bit float.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VertexBufferLayout {
    attributes: Vec<VertexAttribute>,
    size: u32,
}

impl VertexBufferLayout {
    /// Size in bytes of one float component.
    pub const COMPONENT_SIZE: u32 = std::mem::size_of::<f32>() as u32;

    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute and returns the layout, for chaining.
    pub fn with(mut self, semantic: VertexAttributeSemantic, components: u32) -> Self {
        self.add(semantic, components);
        self
    }

    /// Appends an attribute placed right after the previous one.
    ///
    /// Component counts outside 1 to 4 are rejected with
    /// [`ResourceError::InvalidData`](crate::renderer::ResourceError::InvalidData) when
    /// a buffer is created with the layout.
    pub fn add(&mut self, semantic: VertexAttributeSemantic, components: u32) {
        self.attributes.push(VertexAttribute {
            semantic,
            components,
            offset: self.size,
        });
        self.size += components * Self::COMPONENT_SIZE;
    }

    /// Appends an attribute bound to an explicitly named shader input.
    pub fn add_named(&mut self, name: impl Into<String>, components: u32) {
        self.add(VertexAttributeSemantic::Custom(name.into()), components);
    }

    /// The attributes in insertion order.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Number of attributes.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Size of one vertex in bytes (the stride of the buffer).
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of `f32` values per vertex.
    pub fn floats_per_vertex(&self) -> usize {
        (self.size / Self::COMPONENT_SIZE) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_packs_in_insertion_order() {
        let layout = VertexBufferLayout::new()
            .with(VertexAttributeSemantic::Position, 3)
            .with(VertexAttributeSemantic::Normal, 3)
            .with(VertexAttributeSemantic::TexCoord0, 2);

        let offsets: Vec<u32> = layout.attributes().iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        assert_eq!(layout.size(), 32);
        assert_eq!(layout.floats_per_vertex(), 8);
    }

    #[test]
    fn semantics_resolve_to_conventional_names() {
        assert_eq!(VertexAttributeSemantic::Position.input_name(), "position");
        assert_eq!(VertexAttributeSemantic::Binormal.input_name(), "binormal");
        assert_eq!(
            VertexAttributeSemantic::tex_coord(7).unwrap().input_name(),
            "texCoord7"
        );
        assert!(VertexAttributeSemantic::tex_coord(8).is_none());

        let mut layout = VertexBufferLayout::new();
        layout.add_named("instanceOffset", 4);
        assert_eq!(layout.attributes()[0].input_name(), "instanceOffset");
    }
}
