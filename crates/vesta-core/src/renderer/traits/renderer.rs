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

use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use crate::renderer::handles::*;
use std::cell::RefCell;
use std::rc::Rc;

/// The renderer shared by every resource wrapper.
///
/// Rendering is single-threaded and frame-synchronous: the renderer, its native
/// context and its handle pools belong to the thread that owns the graphics context.
pub type SharedRenderer = Rc<RefCell<dyn Renderer>>;

/// The backend-agnostic contract for creating GPU resources, setting pipeline state
/// and issuing draw calls.
///
/// Every `create_*` call allocates one native object and one pool slot; the matching
/// `destroy_*` call is the only way to free them. Destroying an empty or stale handle
/// is a logged no-op. No resource kind tracks references to another: a vertex binding
/// must be destroyed before the buffers and program it was built from.
///
/// Pipeline-state setters are global and take effect immediately, like the native
/// APIs they mirror.
pub trait Renderer {
    /// Which backend this is.
    fn backend_type(&self) -> RendererBackendType;

    /// Live resource counts and the number of draw calls issued so far.
    fn stats(&self) -> RendererStats;

    // --- Textures ---

    /// Creates an empty texture. Give it an image with [`Renderer::update_2d_texture`]
    /// or [`Renderer::update_cube_texture`].
    fn create_texture(&mut self) -> Result<TextureHandle, ResourceError>;

    /// Destroys a texture.
    fn destroy_texture(&mut self, handle: TextureHandle);

    /// Uploads a 2D image, (re)defining the texture as a 2D texture of that size.
    ///
    /// `data` may be `None` to allocate storage without contents (render targets).
    fn update_2d_texture(
        &mut self,
        handle: TextureHandle,
        format: TextureFormat,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    ) -> Result<(), ResourceError>;

    /// Uploads one face of a cube texture.
    fn update_cube_texture(
        &mut self,
        handle: TextureHandle,
        face: CubeFace,
        format: TextureFormat,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    ) -> Result<(), ResourceError>;

    /// Applies filtering, wrapping and mipmap generation to a texture.
    fn set_texture_sampling(
        &mut self,
        handle: TextureHandle,
        sampling: &TextureSampling,
    ) -> Result<(), ResourceError>;

    /// Size of a texture's most recent upload.
    fn texture_size(&self, handle: TextureHandle) -> Option<(u32, u32)>;

    // --- Framebuffers ---

    /// Creates a framebuffer with no attachments.
    fn create_frame_buffer(&mut self) -> Result<FrameBufferHandle, ResourceError>;

    /// Destroys a framebuffer and its depth buffer. Attached textures are not touched.
    fn destroy_frame_buffer(&mut self, handle: FrameBufferHandle);

    /// Replaces the colour attachments and resizes the depth buffer to match.
    ///
    /// # Errors
    /// [`ResourceError::AttachmentSizeMismatch`] if the attachments differ in size.
    fn update_frame_buffer(
        &mut self,
        handle: FrameBufferHandle,
        attachments: &[TextureHandle],
    ) -> Result<(), ResourceError>;

    /// Size shared by the framebuffer's attachments, `(0, 0)` when it has none.
    fn frame_buffer_size(&self, handle: FrameBufferHandle) -> Option<(u32, u32)>;

    /// Makes a framebuffer the render target; [`FrameBufferHandle::EMPTY`] selects the
    /// default target.
    fn set_frame_buffer(&mut self, handle: FrameBufferHandle);

    // --- Vertex and index buffers ---

    /// Creates an immutable vertex buffer holding `vertex_count` vertices.
    fn create_vertex_buffer(
        &mut self,
        layout: &VertexBufferLayout,
        data: &[f32],
        vertex_count: u32,
    ) -> Result<VertexBufferHandle, ResourceError>;

    /// Creates a vertex buffer whose contents can be updated with
    /// [`Renderer::update_dynamic_vertex_buffer`]. `data` may be `None` to only
    /// allocate storage.
    fn create_dynamic_vertex_buffer(
        &mut self,
        layout: &VertexBufferLayout,
        data: Option<&[f32]>,
        vertex_count: u32,
    ) -> Result<VertexBufferHandle, ResourceError>;

    /// Overwrites `vertex_count` vertices starting at `vertex_offset`.
    fn update_dynamic_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        vertex_offset: u32,
        data: &[f32],
        vertex_count: u32,
    ) -> Result<(), ResourceError>;

    /// Destroys a vertex buffer.
    fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle);

    /// Creates an index buffer of 16-bit indices; the element count is `data.len()`.
    fn create_index_buffer(&mut self, data: &[u16]) -> Result<IndexBufferHandle, ResourceError>;

    /// Destroys an index buffer.
    fn destroy_index_buffer(&mut self, handle: IndexBufferHandle);

    // --- Programs, bindings and uniforms ---

    /// Compiles and links a vertex + fragment program, then reflects its inputs and
    /// uniforms.
    ///
    /// On failure every native object created so far is freed. Compiler and linker
    /// diagnostics are reported as [`ResourceError::Shader`].
    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramHandle, ResourceError>;

    /// Destroys a program.
    fn destroy_program(&mut self, handle: ProgramHandle);

    /// Makes a program current for subsequent uniform writes and draws.
    fn set_program(&mut self, handle: ProgramHandle);

    /// Wires the attributes of `buffers` to the inputs `program` declares.
    ///
    /// Attributes the program does not declare are skipped.
    fn create_vertex_binding(
        &mut self,
        buffers: &[VertexBufferHandle],
        program: ProgramHandle,
    ) -> Result<VertexBindingHandle, ResourceError>;

    /// Destroys a vertex binding. The buffers it was built from are not touched.
    fn destroy_vertex_binding(&mut self, handle: VertexBindingHandle);

    /// Creates a handle to the active uniform `name` of `program`.
    ///
    /// # Errors
    /// [`ResourceError::UniformNotFound`] if the program has no such active uniform,
    /// [`ResourceError::UniformTypeMismatch`] if the declared type differs.
    fn create_uniform(
        &mut self,
        name: &str,
        uniform_type: UniformType,
        program: ProgramHandle,
    ) -> Result<UniformHandle, ResourceError>;

    /// Destroys a uniform handle.
    fn destroy_uniform(&mut self, handle: UniformHandle);

    /// Writes a value to a uniform of the current program. Array values write as many
    /// elements as the slice holds.
    ///
    /// # Errors
    /// [`ResourceError::UniformTypeMismatch`] if the value's type differs from the
    /// type the uniform was created with, [`ResourceError::InvalidData`] if the
    /// uniform's program is not current.
    fn set_uniform(
        &mut self,
        handle: UniformHandle,
        value: UniformValue<'_>,
    ) -> Result<(), ResourceError>;

    // --- Pipeline state ---

    /// Selects which faces are culled.
    fn set_face_cull(&mut self, cull: FaceCull);

    /// Selects how polygons are rasterized.
    fn set_polygon_mode(&mut self, mode: PolygonMode);

    /// Enables or disables blending.
    fn set_blend(&mut self, enabled: bool);

    /// Sets the source and destination blend factors.
    fn set_blend_factor(&mut self, src: BlendFactor, dst: BlendFactor);

    /// Enables or disables depth writes.
    fn set_depth_write(&mut self, enabled: bool);

    /// Enables or disables the depth test.
    fn set_depth_test(&mut self, enabled: bool);

    /// Sets the depth comparison.
    fn set_depth_function(&mut self, function: DepthFunction);

    /// Sets the viewport rectangle.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Clears the current render target.
    fn clear(&mut self, request: &ClearRequest);

    // --- Draw calls ---

    /// Draws `vertex_count` vertices through `binding`.
    fn draw(&mut self, primitive: PrimitiveType, binding: VertexBindingHandle, vertex_count: u32);

    /// Draws every index of `index_buffer` through `binding`.
    fn draw_indexed(
        &mut self,
        primitive: PrimitiveType,
        binding: VertexBindingHandle,
        index_buffer: IndexBufferHandle,
    );
}
