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

use crate::renderer::api::{PrimitiveType, VertexAttributeSemantic, VertexBufferLayout};
use crate::renderer::error::ResourceError;
use crate::renderer::handles::{
    IndexBufferHandle, ProgramHandle, VertexBindingHandle, VertexBufferHandle,
};
use crate::renderer::traits::SharedRenderer;

/// Built-in geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshPrefab {
    /// A unit quad in the XY plane facing +Z.
    Quad,
    /// A unit cube centred on the origin, with per-face normals.
    Cube,
}

#[derive(Debug)]
struct MeshVertexBuffer {
    handle: VertexBufferHandle,
    layout: VertexBufferLayout,
    vertex_count: u32,
    dynamic: bool,
}

#[derive(Debug)]
struct MeshPart {
    index_buffer: IndexBufferHandle,
    element_count: u32,
}

/// Geometry made of one or more vertex buffers and zero or more indexed parts.
///
/// The vertex binding wiring the buffers to a program is created on the first draw
/// with that program and reused until a draw with another program, or until a vertex
/// buffer is added or removed.
pub struct Mesh {
    renderer: SharedRenderer,
    vertex_buffers: Vec<MeshVertexBuffer>,
    parts: Vec<MeshPart>,
    primitive: PrimitiveType,
    vertex_count: u32,
    binding: Option<(VertexBindingHandle, ProgramHandle)>,
}

impl Mesh {
    /// An empty triangle mesh.
    pub fn new(renderer: &SharedRenderer) -> Self {
        Self {
            renderer: renderer.clone(),
            vertex_buffers: Vec::new(),
            parts: Vec::new(),
            primitive: PrimitiveType::Triangles,
            vertex_count: 0,
            binding: None,
        }
    }

    /// Builds one of the built-in meshes.
    ///
    /// Prefabs carry separate `position`, `normal` and `texCoord0` buffers and a
    /// single indexed part.
    pub fn from_prefab(renderer: &SharedRenderer, prefab: MeshPrefab) -> Result<Self, ResourceError> {
        let (positions, normals, uvs, indices) = match prefab {
            MeshPrefab::Quad => quad_geometry(),
            MeshPrefab::Cube => cube_geometry(),
        };
        let vertex_count = (positions.len() / 3) as u32;

        let mut mesh = Mesh::new(renderer);
        mesh.add_vertex_buffer(
            VertexBufferLayout::new().with(VertexAttributeSemantic::Position, 3),
            &positions,
            vertex_count,
        )?;
        mesh.add_vertex_buffer(
            VertexBufferLayout::new().with(VertexAttributeSemantic::Normal, 3),
            &normals,
            vertex_count,
        )?;
        mesh.add_vertex_buffer(
            VertexBufferLayout::new().with(VertexAttributeSemantic::TexCoord0, 2),
            &uvs,
            vertex_count,
        )?;
        mesh.add_part(&indices)?;
        Ok(mesh)
    }

    /// Adds an immutable vertex buffer and returns its index.
    pub fn add_vertex_buffer(
        &mut self,
        layout: VertexBufferLayout,
        data: &[f32],
        vertex_count: u32,
    ) -> Result<usize, ResourceError> {
        let handle = self
            .renderer
            .borrow_mut()
            .create_vertex_buffer(&layout, data, vertex_count)?;
        Ok(self.push_vertex_buffer(handle, layout, vertex_count, false))
    }

    /// Adds an updatable vertex buffer and returns its index.
    pub fn add_dynamic_vertex_buffer(
        &mut self,
        layout: VertexBufferLayout,
        data: Option<&[f32]>,
        vertex_count: u32,
    ) -> Result<usize, ResourceError> {
        let handle = self
            .renderer
            .borrow_mut()
            .create_dynamic_vertex_buffer(&layout, data, vertex_count)?;
        Ok(self.push_vertex_buffer(handle, layout, vertex_count, true))
    }

    fn push_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        layout: VertexBufferLayout,
        vertex_count: u32,
        dynamic: bool,
    ) -> usize {
        self.vertex_buffers.push(MeshVertexBuffer {
            handle,
            layout,
            vertex_count,
            dynamic,
        });
        self.invalidate_binding();
        self.update_vertex_count();
        self.vertex_buffers.len() - 1
    }

    /// Overwrites part of a dynamic vertex buffer. The cached binding stays valid.
    pub fn update_dynamic_vertex_buffer(
        &mut self,
        index: usize,
        vertex_offset: u32,
        data: &[f32],
        vertex_count: u32,
    ) -> Result<(), ResourceError> {
        let len = self.vertex_buffers.len();
        let buffer = self
            .vertex_buffers
            .get(index)
            .ok_or(ResourceError::OutOfBounds { index, len })?;
        if !buffer.dynamic {
            return Err(ResourceError::InvalidData(format!(
                "vertex buffer {index} is not dynamic"
            )));
        }
        self.renderer.borrow_mut().update_dynamic_vertex_buffer(
            buffer.handle,
            vertex_offset,
            data,
            vertex_count,
        )
    }

    /// Removes and destroys a vertex buffer. Later buffers shift down by one index.
    pub fn remove_vertex_buffer(&mut self, index: usize) -> Result<(), ResourceError> {
        if index >= self.vertex_buffers.len() {
            return Err(ResourceError::OutOfBounds {
                index,
                len: self.vertex_buffers.len(),
            });
        }
        // The binding references the buffer, so it goes first.
        self.invalidate_binding();
        let buffer = self.vertex_buffers.remove(index);
        self.renderer
            .borrow_mut()
            .destroy_vertex_buffer(buffer.handle);
        self.update_vertex_count();
        Ok(())
    }

    /// Adds an indexed part and returns its index.
    pub fn add_part(&mut self, indices: &[u16]) -> Result<usize, ResourceError> {
        let index_buffer = self.renderer.borrow_mut().create_index_buffer(indices)?;
        self.parts.push(MeshPart {
            index_buffer,
            element_count: indices.len() as u32,
        });
        Ok(self.parts.len() - 1)
    }

    /// Removes and destroys a part. Later parts shift down by one index.
    pub fn remove_part(&mut self, index: usize) -> Result<(), ResourceError> {
        if index >= self.parts.len() {
            return Err(ResourceError::OutOfBounds {
                index,
                len: self.parts.len(),
            });
        }
        let part = self.parts.remove(index);
        self.renderer
            .borrow_mut()
            .destroy_index_buffer(part.index_buffer);
        Ok(())
    }

    /// Draws the whole mesh with `program`.
    ///
    /// Without parts this is one non-indexed draw of [`Mesh::vertex_count`] vertices;
    /// otherwise it is one indexed draw per part.
    pub fn draw(&mut self, program: ProgramHandle) -> Result<(), ResourceError> {
        if self.vertex_buffers.is_empty() {
            return Ok(());
        }
        let binding = self.ensure_binding(program)?;
        let mut renderer = self.renderer.borrow_mut();
        if self.parts.is_empty() {
            renderer.draw(self.primitive, binding, self.vertex_count);
        } else {
            for part in &self.parts {
                renderer.draw_indexed(self.primitive, binding, part.index_buffer);
            }
        }
        Ok(())
    }

    /// Draws a single part with `program`.
    pub fn draw_part(&mut self, program: ProgramHandle, part: usize) -> Result<(), ResourceError> {
        let index_buffer = self
            .parts
            .get(part)
            .map(|p| p.index_buffer)
            .ok_or(ResourceError::OutOfBounds {
                index: part,
                len: self.parts.len(),
            })?;
        if self.vertex_buffers.is_empty() {
            return Ok(());
        }
        let binding = self.ensure_binding(program)?;
        self.renderer
            .borrow_mut()
            .draw_indexed(self.primitive, binding, index_buffer);
        Ok(())
    }

    fn ensure_binding(&mut self, program: ProgramHandle) -> Result<VertexBindingHandle, ResourceError> {
        if let Some((binding, bound_program)) = self.binding {
            if bound_program == program {
                return Ok(binding);
            }
        }
        self.invalidate_binding();

        let buffers: Vec<VertexBufferHandle> =
            self.vertex_buffers.iter().map(|b| b.handle).collect();
        let binding = self
            .renderer
            .borrow_mut()
            .create_vertex_binding(&buffers, program)?;
        log::trace!("Mesh: built vertex binding {binding:?} for {program:?}");
        self.binding = Some((binding, program));
        Ok(binding)
    }

    fn invalidate_binding(&mut self) {
        if let Some((binding, _)) = self.binding.take() {
            self.renderer.borrow_mut().destroy_vertex_binding(binding);
        }
    }

    fn update_vertex_count(&mut self) {
        self.vertex_count = self
            .vertex_buffers
            .iter()
            .map(|b| b.vertex_count)
            .min()
            .unwrap_or(0);
    }

    /// The number of vertices drawable from every buffer, the minimum over all buffers.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Number of vertex buffers.
    pub fn vertex_buffer_count(&self) -> usize {
        self.vertex_buffers.len()
    }

    /// The handle of the vertex buffer at `index`.
    pub fn vertex_buffer(&self, index: usize) -> Option<VertexBufferHandle> {
        self.vertex_buffers.get(index).map(|b| b.handle)
    }

    /// The layout of the vertex buffer at `index`.
    pub fn vertex_buffer_layout(&self, index: usize) -> Option<&VertexBufferLayout> {
        self.vertex_buffers.get(index).map(|b| &b.layout)
    }

    /// Number of indexed parts.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Number of indices in the part at `index`.
    pub fn part_element_count(&self, index: usize) -> Option<u32> {
        self.parts.get(index).map(|p| p.element_count)
    }

    /// The currently cached binding and the program it was built for.
    pub fn cached_binding(&self) -> Option<(VertexBindingHandle, ProgramHandle)> {
        self.binding
    }

    /// The primitive type used by every draw.
    pub fn primitive_type(&self) -> PrimitiveType {
        self.primitive
    }

    /// Changes the primitive type used by every draw.
    pub fn set_primitive_type(&mut self, primitive: PrimitiveType) {
        self.primitive = primitive;
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        self.invalidate_binding();
        let mut renderer = self.renderer.borrow_mut();
        for part in self.parts.drain(..) {
            renderer.destroy_index_buffer(part.index_buffer);
        }
        for buffer in self.vertex_buffers.drain(..) {
            renderer.destroy_vertex_buffer(buffer.handle);
        }
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("vertex_buffers", &self.vertex_buffers)
            .field("parts", &self.parts)
            .field("primitive", &self.primitive)
            .field("binding", &self.binding)
            .finish()
    }
}

type Geometry = (Vec<f32>, Vec<f32>, Vec<f32>, Vec<u16>);

const FACE_CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)];
const FACE_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

fn quad_geometry() -> Geometry {
    let mut geometry = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
    push_face(&mut geometry, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]);
    geometry
}

fn cube_geometry() -> Geometry {
    // (normal, u axis, v axis) with u × v = normal, so every face winds counter-clockwise.
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    let mut geometry = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
    for (normal, u, v) in FACES {
        let center = normal.map(|n| n * 0.5);
        push_face(&mut geometry, center, u, v, normal);
    }
    geometry
}

fn push_face(geometry: &mut Geometry, center: [f32; 3], u: [f32; 3], v: [f32; 3], normal: [f32; 3]) {
    let (positions, normals, uvs, indices) = geometry;
    let base = (positions.len() / 3) as u16;
    for (su, sv) in FACE_CORNERS {
        for axis in 0..3 {
            positions.push(center[axis] + 0.5 * (su * u[axis] + sv * v[axis]));
        }
        normals.extend_from_slice(&normal);
        uvs.extend_from_slice(&[(su + 1.0) * 0.5, (sv + 1.0) * 0.5]);
    }
    indices.extend(FACE_INDICES.iter().map(|i| base + i));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_geometry_is_one_face() {
        let (positions, normals, uvs, indices) = quad_geometry();
        assert_eq!(positions.len(), 4 * 3);
        assert_eq!(normals.len(), 4 * 3);
        assert_eq!(uvs.len(), 4 * 2);
        assert_eq!(indices, vec![0, 1, 2, 2, 1, 3]);
        assert_eq!(&positions[..3], &[-0.5, -0.5, 0.0]);
        assert_eq!(&positions[9..], &[0.5, 0.5, 0.0]);
    }

    #[test]
    fn cube_faces_wind_towards_their_normal() {
        let (positions, normals, _, indices) = cube_geometry();
        assert_eq!(positions.len(), 24 * 3);
        assert_eq!(indices.len(), 36);

        let vertex = |i: u16| glam::Vec3::from_slice(&positions[i as usize * 3..]);
        for triangle in indices.chunks(3) {
            let (a, b, c) = (vertex(triangle[0]), vertex(triangle[1]), vertex(triangle[2]));
            let face_normal = (b - a).cross(c - a).normalize();
            let n = triangle[0] as usize * 3;
            let expected = glam::Vec3::from_slice(&normals[n..n + 3]);
            assert!(face_normal.abs_diff_eq(expected, 1e-6));
            assert!(a.abs().max_element() <= 0.5 + f32::EPSILON);
        }
    }
}
