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

//! The OpenGL implementation of the renderer contract.

use super::conversions::{sampler_kind, texture_format, uniform_type, IntoGl};
use crate::graphics::validation::{check_image_data, check_vertex_data, check_vertex_layout};
use glow::HasContext;
use vesta_core::memory::HandlePool;
use vesta_core::renderer::reflection::{
    wire_attributes, ActiveAttribute, ActiveUniform, AttributeSlots, AttributeWiring,
    UniformTable,
};
use vesta_core::renderer::*;

type GlTexture = <glow::Context as HasContext>::Texture;
type GlFramebuffer = <glow::Context as HasContext>::Framebuffer;
type GlRenderbuffer = <glow::Context as HasContext>::Renderbuffer;
type GlBuffer = <glow::Context as HasContext>::Buffer;
type GlProgram = <glow::Context as HasContext>::Program;
type GlShader = <glow::Context as HasContext>::Shader;
type GlVertexArray = <glow::Context as HasContext>::VertexArray;
type GlUniformLocation = <glow::Context as HasContext>::UniformLocation;

/// `GL_TEXTURE_MAX_ANISOTROPY_EXT`.
const TEXTURE_MAX_ANISOTROPY: u32 = 0x84FE;

/// What the current context supports, probed once at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlCapabilities {
    /// Vertex array objects are available; otherwise attribute pointers are replayed
    /// on every draw.
    pub vertex_array_objects: bool,
    /// Sized internal texture formats (`GL_RGBA8`) are accepted.
    pub sized_formats: bool,
    /// More than one colour attachment can be drawn to.
    pub draw_buffers: bool,
    /// `glPolygonMode` exists (desktop OpenGL only).
    pub polygon_mode: bool,
    /// `GL_EXT_texture_filter_anisotropic` is exposed.
    pub anisotropy: bool,
    /// Cube textures accept a W wrap mode.
    pub wrap_r: bool,
    /// `GL_MAX_COMBINED_TEXTURE_IMAGE_UNITS`. The last unit is reserved for texture
    /// uploads and parameter changes, samplers get the others.
    pub texture_units: u32,
}

impl GlCapabilities {
    fn probe(gl: &glow::Context) -> Self {
        let version = gl.version();
        let extensions = gl.supported_extensions();
        let modern = version.major >= 3;
        let has_extension = |suffix: &str| extensions.iter().any(|ext| ext.ends_with(suffix));
        Self {
            vertex_array_objects: modern || has_extension("_vertex_array_object"),
            sized_formats: modern,
            draw_buffers: modern,
            polygon_mode: !version.is_embedded,
            anisotropy: has_extension("_texture_filter_anisotropic"),
            wrap_r: modern || !version.is_embedded,
            // OpenGL ES 2.0 guarantees 8 combined units.
            texture_units: unsafe { gl.get_parameter_i32(glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS) }
                .max(2) as u32,
        }
    }

    /// The texture unit textures are bound on while they are updated, so the units
    /// holding sampler bindings keep their textures.
    pub fn update_unit(&self) -> u32 {
        glow::TEXTURE0 + self.texture_units - 1
    }
}

#[derive(Debug)]
struct TextureRecord {
    native: GlTexture,
    kind: TextureKind,
    width: u32,
    height: u32,
}

impl TextureRecord {
    fn target(&self) -> u32 {
        match self.kind {
            TextureKind::Cube => glow::TEXTURE_CUBE_MAP,
            _ => glow::TEXTURE_2D,
        }
    }
}

#[derive(Debug)]
struct FrameBufferRecord {
    native: GlFramebuffer,
    depth: Option<GlRenderbuffer>,
    attachments: Vec<GlTexture>,
    size: (u32, u32),
}

#[derive(Debug)]
struct VertexBufferRecord {
    native: GlBuffer,
    layout: VertexBufferLayout,
    vertex_count: u32,
    dynamic: bool,
}

#[derive(Debug)]
struct IndexBufferRecord {
    native: GlBuffer,
    count: u32,
}

#[derive(Debug)]
struct ProgramRecord {
    native: GlProgram,
    attributes: AttributeSlots,
    uniforms: UniformTable,
}

#[derive(Debug)]
struct VertexBindingRecord {
    vertex_array: Option<GlVertexArray>,
    program: ProgramHandle,
    buffers: Vec<GlBuffer>,
    wiring: Vec<AttributeWiring>,
}

#[derive(Debug)]
struct UniformRecord {
    location: Option<GlUniformLocation>,
    program: ProgramHandle,
    name: String,
    uniform_type: UniformType,
    texture_unit: Option<u32>,
}

/// Renders through an OpenGL 2.1+ or OpenGL ES 2.0+ context.
///
/// The renderer owns the `glow` context. Every native object lives in a handle pool,
/// so a stale handle can never reach the driver.
pub struct GlRenderer {
    gl: glow::Context,
    capabilities: GlCapabilities,

    textures: HandlePool<TextureRecord>,
    frame_buffers: HandlePool<FrameBufferRecord>,
    vertex_buffers: HandlePool<VertexBufferRecord>,
    index_buffers: HandlePool<IndexBufferRecord>,
    programs: HandlePool<ProgramRecord>,
    vertex_bindings: HandlePool<VertexBindingRecord>,
    uniforms: HandlePool<UniformRecord>,

    current_program: ProgramHandle,
    current_frame_buffer: FrameBufferHandle,
    depth_write: bool,
    draw_calls: u64,
}

impl GlRenderer {
    /// Takes ownership of a current OpenGL context and sets the initial state from
    /// `config`.
    pub fn new(gl: glow::Context, config: &RendererConfig) -> Result<Self, RenderError> {
        let version = gl.version();
        if version.major < 2 {
            return Err(RenderError::InitializationFailed(format!(
                "OpenGL {}.{} is too old, 2.0 or newer is required",
                version.major, version.minor
            )));
        }
        log::info!(
            "GlRenderer: Using OpenGL{} {}.{} ({})",
            if version.is_embedded { " ES" } else { "" },
            version.major,
            version.minor,
            version.vendor_info
        );

        let capabilities = GlCapabilities::probe(&gl);
        log::debug!("GlRenderer: Capabilities {capabilities:?}");

        let [r, g, b, a] = config.clear_color;
        unsafe {
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.clear_color(r, g, b, a);
            gl.depth_mask(true);
            if let Some((width, height)) = config.viewport {
                gl.viewport(0, 0, width as i32, height as i32);
            }
        }

        let limits = &config.limits;
        Ok(Self {
            gl,
            capabilities,
            textures: HandlePool::with_capacity("texture", limits.textures),
            frame_buffers: HandlePool::with_capacity("frame buffer", limits.frame_buffers),
            vertex_buffers: HandlePool::with_capacity("vertex buffer", limits.vertex_buffers),
            index_buffers: HandlePool::with_capacity("index buffer", limits.index_buffers),
            programs: HandlePool::with_capacity("program", limits.programs),
            vertex_bindings: HandlePool::with_capacity("vertex binding", limits.vertex_bindings),
            uniforms: HandlePool::with_capacity("uniform", limits.uniforms),
            current_program: ProgramHandle::EMPTY,
            current_frame_buffer: FrameBufferHandle::EMPTY,
            depth_write: true,
            draw_calls: 0,
        })
    }

    /// What the context supports.
    pub fn capabilities(&self) -> GlCapabilities {
        self.capabilities
    }

    /// The underlying `glow` context, for interop with other OpenGL code.
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    /// Attaches `targets` to the bound framebuffer, detaches colour slots below
    /// `attached` that `targets` no longer covers, sizes the depth renderbuffer and
    /// returns the completeness status.
    fn attach_targets(
        gl: &glow::Context,
        capabilities: GlCapabilities,
        depth: Option<GlRenderbuffer>,
        targets: &[GlTexture],
        attached: usize,
        size: Option<(u32, u32)>,
    ) -> u32 {
        unsafe {
            for (index, native) in targets.iter().enumerate() {
                gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    glow::COLOR_ATTACHMENT0 + index as u32,
                    glow::TEXTURE_2D,
                    Some(*native),
                    0,
                );
            }
            for index in targets.len()..attached {
                gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    glow::COLOR_ATTACHMENT0 + index as u32,
                    glow::TEXTURE_2D,
                    None,
                    0,
                );
            }

            let (Some((width, height)), Some(depth)) = (size, depth) else {
                return glow::FRAMEBUFFER_COMPLETE;
            };
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(depth));
            gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                glow::DEPTH_COMPONENT16,
                width as i32,
                height as i32,
            );
            gl.bind_renderbuffer(glow::RENDERBUFFER, None);
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(depth),
            );
            if capabilities.draw_buffers {
                let buffers: Vec<u32> = (0..targets.len() as u32)
                    .map(|index| glow::COLOR_ATTACHMENT0 + index)
                    .collect();
                gl.draw_buffers(&buffers);
            }
            gl.check_framebuffer_status(glow::FRAMEBUFFER)
        }
    }

    fn native_frame_buffer(&self, handle: FrameBufferHandle) -> Option<GlFramebuffer> {
        self.frame_buffers.get(handle.raw()).map(|fb| fb.native)
    }

    #[allow(clippy::too_many_arguments)]
    fn upload_image(
        &mut self,
        handle: TextureHandle,
        kind: TextureKind,
        upload_target: u32,
        format: TextureFormat,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    ) -> Result<(), ResourceError> {
        check_image_data(format, width, height, data)?;
        let texture = self
            .textures
            .get_mut(handle.raw())
            .ok_or(ResourceError::InvalidHandle)?;
        if texture.kind != TextureKind::Uninitialized && texture.kind != kind {
            return Err(ResourceError::InvalidData(format!(
                "texture defined as {:?} cannot be updated as {kind:?}",
                texture.kind
            )));
        }

        let first_definition = texture.kind == TextureKind::Uninitialized;
        texture.kind = kind;
        texture.width = width;
        texture.height = height;

        let gl_format = texture_format(format, self.capabilities.sized_formats);
        let target = texture.target();
        unsafe {
            self.gl.active_texture(self.capabilities.update_unit());
            self.gl.bind_texture(target, Some(texture.native));
            self.gl.tex_image_2d(
                upload_target,
                0,
                gl_format.internal_format,
                width as i32,
                height as i32,
                0,
                gl_format.format,
                gl_format.data_type,
                glow::PixelUnpackData::Slice(data),
            );
            if first_definition {
                // The default minification filter samples mips that do not exist yet.
                self.gl
                    .tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            }
            self.gl.bind_texture(target, None);
        }
        log::debug!("GlRenderer: Uploaded {width}x{height} {format:?} image to {handle:?}");
        Ok(())
    }

    fn create_vertex_buffer_internal(
        &mut self,
        layout: &VertexBufferLayout,
        data: Option<&[f32]>,
        vertex_count: u32,
        dynamic: bool,
    ) -> Result<VertexBufferHandle, ResourceError> {
        check_vertex_layout(layout)?;
        if let Some(data) = data {
            check_vertex_data(layout, data, vertex_count)?;
        }
        let size = layout.size() as usize * vertex_count as usize;
        let usage = if dynamic {
            glow::DYNAMIC_DRAW
        } else {
            glow::STATIC_DRAW
        };

        let native = unsafe {
            let native = self
                .gl
                .create_buffer()
                .map_err(ResourceError::CreationFailure)?;
            if self.capabilities.vertex_array_objects {
                self.gl.bind_vertex_array(None);
            }
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(native));
            match data {
                Some(data) => {
                    let floats = layout.floats_per_vertex() * vertex_count as usize;
                    self.gl.buffer_data_u8_slice(
                        glow::ARRAY_BUFFER,
                        bytemuck::cast_slice(&data[..floats]),
                        usage,
                    );
                }
                None => self
                    .gl
                    .buffer_data_size(glow::ARRAY_BUFFER, size as i32, usage),
            }
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            native
        };

        let record = VertexBufferRecord {
            native,
            layout: layout.clone(),
            vertex_count,
            dynamic,
        };
        match self.vertex_buffers.reserve(record) {
            Ok(raw) => {
                log::debug!(
                    "GlRenderer: Created vertex buffer {raw:?}: {vertex_count} vertices, {size} bytes"
                );
                Ok(VertexBufferHandle(raw))
            }
            Err(error) => {
                unsafe { self.gl.delete_buffer(native) };
                Err(error)
            }
        }
    }

    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<GlShader, ShaderError> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self
                .gl
                .create_shader(kind)
                .map_err(|log| ShaderError::CompileFailure { stage, log })?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(ShaderError::CompileFailure { stage, log });
            }
            Ok(shader)
        }
    }

    fn link_program(&self, vertex_source: &str, fragment_source: &str) -> Result<GlProgram, ShaderError> {
        let vertex = self.compile_stage(ShaderStage::Vertex, vertex_source)?;
        let fragment = match self.compile_stage(ShaderStage::Fragment, fragment_source) {
            Ok(fragment) => fragment,
            Err(error) => {
                unsafe { self.gl.delete_shader(vertex) };
                return Err(error);
            }
        };

        unsafe {
            let program = match self.gl.create_program() {
                Ok(program) => program,
                Err(log) => {
                    self.gl.delete_shader(vertex);
                    self.gl.delete_shader(fragment);
                    return Err(ShaderError::LinkFailure { log });
                }
            };
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);
            let linked = self.gl.get_program_link_status(program);
            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);
            self.gl.delete_shader(vertex);
            self.gl.delete_shader(fragment);
            if !linked {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(ShaderError::LinkFailure { log });
            }
            Ok(program)
        }
    }

    fn reflect(&self, program: GlProgram) -> (AttributeSlots, UniformTable) {
        unsafe {
            let attributes = (0..self.gl.get_active_attributes(program))
                .filter_map(|index| self.gl.get_active_attribute(program, index))
                .filter_map(|active| {
                    // Built-ins such as `gl_VertexID` have no location.
                    let slot = self.gl.get_attrib_location(program, &active.name)?;
                    Some(ActiveAttribute {
                        name: active.name,
                        slot,
                    })
                })
                .collect::<Vec<_>>();

            let uniforms = (0..self.gl.get_active_uniforms(program))
                .filter_map(|index| self.gl.get_active_uniform(program, index))
                .map(|active| {
                    let array_size = active.size.max(1) as u32;
                    ActiveUniform {
                        name: active.name,
                        array_size,
                        value_type: uniform_type(active.utype, array_size),
                        sampler: sampler_kind(active.utype),
                    }
                })
                .collect::<Vec<_>>();

            (
                AttributeSlots::from_active(attributes),
                UniformTable::from_active(uniforms),
            )
        }
    }

    /// Makes a binding's attributes current.
    fn bind_vertex_binding(&self, binding: &VertexBindingRecord) {
        match binding.vertex_array {
            Some(vertex_array) => unsafe { self.gl.bind_vertex_array(Some(vertex_array)) },
            None => self.apply_attribute_pointers(binding),
        }
    }

    fn unbind_vertex_binding(&self, binding: &VertexBindingRecord) {
        unsafe {
            match binding.vertex_array {
                Some(_) => self.gl.bind_vertex_array(None),
                None => {
                    for wiring in &binding.wiring {
                        self.gl.disable_vertex_attrib_array(wiring.slot);
                    }
                }
            }
        }
    }

    /// Points every wired slot at its buffer. Records into the bound vertex array
    /// object, if any.
    fn apply_attribute_pointers(&self, binding: &VertexBindingRecord) {
        unsafe {
            for wiring in &binding.wiring {
                self.gl.bind_buffer(
                    glow::ARRAY_BUFFER,
                    Some(binding.buffers[wiring.buffer_index]),
                );
                self.gl.enable_vertex_attrib_array(wiring.slot);
                self.gl.vertex_attrib_pointer_f32(
                    wiring.slot,
                    wiring.components as i32,
                    glow::FLOAT,
                    false,
                    wiring.stride as i32,
                    wiring.offset as i32,
                );
            }
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn toggle(&self, capability: u32, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(capability);
            } else {
                self.gl.disable(capability);
            }
        }
    }
}

impl Renderer for GlRenderer {
    fn backend_type(&self) -> RendererBackendType {
        RendererBackendType::OpenGl
    }

    fn stats(&self) -> RendererStats {
        RendererStats {
            textures: self.textures.len(),
            frame_buffers: self.frame_buffers.len(),
            vertex_buffers: self.vertex_buffers.len(),
            index_buffers: self.index_buffers.len(),
            programs: self.programs.len(),
            vertex_bindings: self.vertex_bindings.len(),
            uniforms: self.uniforms.len(),
            draw_calls: self.draw_calls,
        }
    }

    // --- Textures ---

    fn create_texture(&mut self) -> Result<TextureHandle, ResourceError> {
        let native = unsafe { self.gl.create_texture() }.map_err(ResourceError::CreationFailure)?;
        let record = TextureRecord {
            native,
            kind: TextureKind::Uninitialized,
            width: 0,
            height: 0,
        };
        match self.textures.reserve(record) {
            Ok(raw) => Ok(TextureHandle(raw)),
            Err(error) => {
                unsafe { self.gl.delete_texture(native) };
                Err(error)
            }
        }
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        match self.textures.release(handle.raw()) {
            Some(texture) => unsafe { self.gl.delete_texture(texture.native) },
            None => log::warn!("GlRenderer: Ignoring destroy of stale texture {handle:?}"),
        }
    }

    fn update_2d_texture(
        &mut self,
        handle: TextureHandle,
        format: TextureFormat,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    ) -> Result<(), ResourceError> {
        self.upload_image(
            handle,
            TextureKind::Texture2d,
            glow::TEXTURE_2D,
            format,
            width,
            height,
            data,
        )
    }

    fn update_cube_texture(
        &mut self,
        handle: TextureHandle,
        face: CubeFace,
        format: TextureFormat,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    ) -> Result<(), ResourceError> {
        if width != height {
            return Err(ResourceError::InvalidData(format!(
                "cube face {face:?} must be square, got {width}x{height}"
            )));
        }
        self.upload_image(
            handle,
            TextureKind::Cube,
            face.into_gl(),
            format,
            width,
            height,
            data,
        )
    }

    fn set_texture_sampling(
        &mut self,
        handle: TextureHandle,
        sampling: &TextureSampling,
    ) -> Result<(), ResourceError> {
        let texture = self
            .textures
            .get(handle.raw())
            .ok_or(ResourceError::InvalidHandle)?;
        if texture.kind == TextureKind::Uninitialized {
            return Err(ResourceError::InvalidData(
                "sampling set on a texture without an image".to_string(),
            ));
        }

        let target = texture.target();
        unsafe {
            self.gl.active_texture(self.capabilities.update_unit());
            self.gl.bind_texture(target, Some(texture.native));
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, sampling.min_filter.into_gl());
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, sampling.mag_filter.into_gl());
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_S, sampling.wrap_u.into_gl());
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_T, sampling.wrap_v.into_gl());
            if texture.kind == TextureKind::Cube && self.capabilities.wrap_r {
                self.gl
                    .tex_parameter_i32(target, glow::TEXTURE_WRAP_R, sampling.wrap_w.into_gl());
            }
            if self.capabilities.anisotropy {
                self.gl.tex_parameter_f32(
                    target,
                    TEXTURE_MAX_ANISOTROPY,
                    sampling.anisotropy.max(1.0),
                );
            }
            if sampling.generate_mipmaps {
                self.gl.generate_mipmap(target);
            }
            self.gl.bind_texture(target, None);
        }
        Ok(())
    }

    fn texture_size(&self, handle: TextureHandle) -> Option<(u32, u32)> {
        self.textures
            .get(handle.raw())
            .map(|texture| (texture.width, texture.height))
    }

    // --- Framebuffers ---

    fn create_frame_buffer(&mut self) -> Result<FrameBufferHandle, ResourceError> {
        let native =
            unsafe { self.gl.create_framebuffer() }.map_err(ResourceError::CreationFailure)?;
        let record = FrameBufferRecord {
            native,
            depth: None,
            attachments: Vec::new(),
            size: (0, 0),
        };
        match self.frame_buffers.reserve(record) {
            Ok(raw) => Ok(FrameBufferHandle(raw)),
            Err(error) => {
                unsafe { self.gl.delete_framebuffer(native) };
                Err(error)
            }
        }
    }

    fn destroy_frame_buffer(&mut self, handle: FrameBufferHandle) {
        let Some(frame_buffer) = self.frame_buffers.release(handle.raw()) else {
            log::warn!("GlRenderer: Ignoring destroy of stale frame buffer {handle:?}");
            return;
        };
        unsafe {
            if self.current_frame_buffer == handle {
                self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                self.current_frame_buffer = FrameBufferHandle::EMPTY;
            }
            if let Some(depth) = frame_buffer.depth {
                self.gl.delete_renderbuffer(depth);
            }
            self.gl.delete_framebuffer(frame_buffer.native);
        }
    }

    fn update_frame_buffer(
        &mut self,
        handle: FrameBufferHandle,
        attachments: &[TextureHandle],
    ) -> Result<(), ResourceError> {
        if !self.frame_buffers.contains(handle.raw()) {
            return Err(ResourceError::InvalidHandle);
        }
        if attachments.len() > 1 && !self.capabilities.draw_buffers {
            return Err(ResourceError::InvalidData(format!(
                "{} colour attachments requested but the context supports one",
                attachments.len()
            )));
        }

        let mut natives = Vec::with_capacity(attachments.len());
        let mut size = None;
        for attachment in attachments {
            let texture = self
                .textures
                .get(attachment.raw())
                .ok_or(ResourceError::InvalidHandle)?;
            if texture.kind != TextureKind::Texture2d {
                return Err(ResourceError::InvalidData(format!(
                    "attachment {attachment:?} is not a 2D texture"
                )));
            }
            let found = (texture.width, texture.height);
            match size {
                None => size = Some(found),
                Some(expected) if expected != found => {
                    return Err(ResourceError::AttachmentSizeMismatch { expected, found });
                }
                Some(_) => {}
            }
            natives.push(texture.native);
        }

        let previous = self.native_frame_buffer(self.current_frame_buffer);
        let capabilities = self.capabilities;
        let gl = &self.gl;
        let frame_buffer = self
            .frame_buffers
            .get_mut(handle.raw())
            .ok_or(ResourceError::InvalidHandle)?;
        if size.is_some() && frame_buffer.depth.is_none() {
            let depth =
                unsafe { gl.create_renderbuffer() }.map_err(ResourceError::CreationFailure)?;
            frame_buffer.depth = Some(depth);
        }

        unsafe { gl.bind_framebuffer(glow::FRAMEBUFFER, Some(frame_buffer.native)) };
        let status = Self::attach_targets(
            gl,
            capabilities,
            frame_buffer.depth,
            &natives,
            frame_buffer.attachments.len(),
            size,
        );
        if status != glow::FRAMEBUFFER_COMPLETE {
            // Put the previous targets back so the record matches the native object.
            let previous_size = (!frame_buffer.attachments.is_empty()).then_some(frame_buffer.size);
            Self::attach_targets(
                gl,
                capabilities,
                frame_buffer.depth,
                &frame_buffer.attachments,
                natives.len(),
                previous_size,
            );
            unsafe { gl.bind_framebuffer(glow::FRAMEBUFFER, previous) };
            log::error!("GlRenderer: Frame buffer {handle:?} is incomplete (status {status:#x})");
            return Err(ResourceError::CreationFailure(format!(
                "frame buffer incomplete, status {status:#x}"
            )));
        }
        unsafe { gl.bind_framebuffer(glow::FRAMEBUFFER, previous) };

        frame_buffer.attachments = natives;
        frame_buffer.size = size.unwrap_or((0, 0));
        log::debug!(
            "GlRenderer: Frame buffer {handle:?} now has {} attachment(s) of {:?}",
            frame_buffer.attachments.len(),
            frame_buffer.size
        );
        Ok(())
    }

    fn frame_buffer_size(&self, handle: FrameBufferHandle) -> Option<(u32, u32)> {
        self.frame_buffers.get(handle.raw()).map(|fb| fb.size)
    }

    fn set_frame_buffer(&mut self, handle: FrameBufferHandle) {
        let native = if handle.is_empty() {
            None
        } else {
            match self.native_frame_buffer(handle) {
                Some(native) => Some(native),
                None => {
                    log::warn!("GlRenderer: Cannot bind stale frame buffer {handle:?}");
                    return;
                }
            }
        };
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, native) };
        self.current_frame_buffer = handle;
    }

    // --- Vertex and index buffers ---

    fn create_vertex_buffer(
        &mut self,
        layout: &VertexBufferLayout,
        data: &[f32],
        vertex_count: u32,
    ) -> Result<VertexBufferHandle, ResourceError> {
        self.create_vertex_buffer_internal(layout, Some(data), vertex_count, false)
    }

    fn create_dynamic_vertex_buffer(
        &mut self,
        layout: &VertexBufferLayout,
        data: Option<&[f32]>,
        vertex_count: u32,
    ) -> Result<VertexBufferHandle, ResourceError> {
        self.create_vertex_buffer_internal(layout, data, vertex_count, true)
    }

    fn update_dynamic_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        vertex_offset: u32,
        data: &[f32],
        vertex_count: u32,
    ) -> Result<(), ResourceError> {
        let buffer = self
            .vertex_buffers
            .get(handle.raw())
            .ok_or(ResourceError::InvalidHandle)?;
        if !buffer.dynamic {
            return Err(ResourceError::InvalidData(format!(
                "vertex buffer {handle:?} was not created dynamic"
            )));
        }
        let end = vertex_offset as usize + vertex_count as usize;
        if end > buffer.vertex_count as usize {
            return Err(ResourceError::OutOfBounds {
                index: end,
                len: buffer.vertex_count as usize,
            });
        }
        check_vertex_data(&buffer.layout, data, vertex_count)?;

        let floats = buffer.layout.floats_per_vertex() * vertex_count as usize;
        let offset = buffer.layout.size() as usize * vertex_offset as usize;
        unsafe {
            if self.capabilities.vertex_array_objects {
                self.gl.bind_vertex_array(None);
            }
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer.native));
            self.gl.buffer_sub_data_u8_slice(
                glow::ARRAY_BUFFER,
                offset as i32,
                bytemuck::cast_slice(&data[..floats]),
            );
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
        Ok(())
    }

    fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle) {
        match self.vertex_buffers.release(handle.raw()) {
            Some(buffer) => unsafe { self.gl.delete_buffer(buffer.native) },
            None => log::warn!("GlRenderer: Ignoring destroy of stale vertex buffer {handle:?}"),
        }
    }

    fn create_index_buffer(&mut self, data: &[u16]) -> Result<IndexBufferHandle, ResourceError> {
        let native = unsafe {
            let native = self
                .gl
                .create_buffer()
                .map_err(ResourceError::CreationFailure)?;
            if self.capabilities.vertex_array_objects {
                self.gl.bind_vertex_array(None);
            }
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(native));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW,
            );
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
            native
        };
        let record = IndexBufferRecord {
            native,
            count: data.len() as u32,
        };
        match self.index_buffers.reserve(record) {
            Ok(raw) => Ok(IndexBufferHandle(raw)),
            Err(error) => {
                unsafe { self.gl.delete_buffer(native) };
                Err(error)
            }
        }
    }

    fn destroy_index_buffer(&mut self, handle: IndexBufferHandle) {
        match self.index_buffers.release(handle.raw()) {
            Some(buffer) => unsafe { self.gl.delete_buffer(buffer.native) },
            None => log::warn!("GlRenderer: Ignoring destroy of stale index buffer {handle:?}"),
        }
    }

    // --- Programs, bindings and uniforms ---

    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramHandle, ResourceError> {
        let native = self
            .link_program(vertex_source, fragment_source)
            .map_err(|error| {
                log::error!("GlRenderer: {error}");
                ResourceError::from(error)
            })?;
        let (attributes, uniforms) = self.reflect(native);
        log::debug!(
            "GlRenderer: Linked program with {} inputs and {} uniforms",
            attributes.len(),
            uniforms.len()
        );

        let record = ProgramRecord {
            native,
            attributes,
            uniforms,
        };
        match self.programs.reserve(record) {
            Ok(raw) => Ok(ProgramHandle(raw)),
            Err(error) => {
                unsafe { self.gl.delete_program(native) };
                Err(error)
            }
        }
    }

    fn destroy_program(&mut self, handle: ProgramHandle) {
        let Some(program) = self.programs.release(handle.raw()) else {
            log::warn!("GlRenderer: Ignoring destroy of stale program {handle:?}");
            return;
        };
        unsafe {
            if self.current_program == handle {
                self.gl.use_program(None);
                self.current_program = ProgramHandle::EMPTY;
            }
            self.gl.delete_program(program.native);
        }
    }

    fn set_program(&mut self, handle: ProgramHandle) {
        let native = if handle.is_empty() {
            None
        } else {
            match self.programs.get(handle.raw()) {
                Some(program) => Some(program.native),
                None => {
                    log::warn!("GlRenderer: Cannot use stale program {handle:?}");
                    return;
                }
            }
        };
        unsafe { self.gl.use_program(native) };
        self.current_program = handle;
    }

    fn create_vertex_binding(
        &mut self,
        buffers: &[VertexBufferHandle],
        program: ProgramHandle,
    ) -> Result<VertexBindingHandle, ResourceError> {
        let program_record = self
            .programs
            .get(program.raw())
            .ok_or(ResourceError::InvalidHandle)?;
        let records = buffers
            .iter()
            .map(|buffer| {
                self.vertex_buffers
                    .get(buffer.raw())
                    .ok_or(ResourceError::InvalidHandle)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let wiring = wire_attributes(
            records.iter().map(|record| &record.layout),
            &program_record.attributes,
        );

        let mut binding = VertexBindingRecord {
            vertex_array: None,
            program,
            buffers: records.iter().map(|record| record.native).collect(),
            wiring,
        };
        if self.capabilities.vertex_array_objects {
            unsafe {
                let vertex_array = self
                    .gl
                    .create_vertex_array()
                    .map_err(ResourceError::CreationFailure)?;
                self.gl.bind_vertex_array(Some(vertex_array));
                self.apply_attribute_pointers(&binding);
                self.gl.bind_vertex_array(None);
                binding.vertex_array = Some(vertex_array);
            }
        }

        let vertex_array = binding.vertex_array;
        match self.vertex_bindings.reserve(binding) {
            Ok(raw) => {
                log::debug!(
                    "GlRenderer: Created vertex binding {raw:?} over {} buffer(s) for {program:?}",
                    buffers.len()
                );
                Ok(VertexBindingHandle(raw))
            }
            Err(error) => {
                if let Some(vertex_array) = vertex_array {
                    unsafe { self.gl.delete_vertex_array(vertex_array) };
                }
                Err(error)
            }
        }
    }

    fn destroy_vertex_binding(&mut self, handle: VertexBindingHandle) {
        match self.vertex_bindings.release(handle.raw()) {
            Some(binding) => {
                if let Some(vertex_array) = binding.vertex_array {
                    unsafe { self.gl.delete_vertex_array(vertex_array) };
                }
            }
            None => log::warn!("GlRenderer: Ignoring destroy of stale vertex binding {handle:?}"),
        }
    }

    fn create_uniform(
        &mut self,
        name: &str,
        uniform_type: UniformType,
        program: ProgramHandle,
    ) -> Result<UniformHandle, ResourceError> {
        let program_record = self
            .programs
            .get(program.raw())
            .ok_or(ResourceError::InvalidHandle)?;
        let reflected = program_record.uniforms.resolve(name, uniform_type)?;
        let location = unsafe {
            self.gl
                .get_uniform_location(program_record.native, &reflected.name)
        };

        let record = UniformRecord {
            location,
            program,
            name: reflected.name.clone(),
            uniform_type,
            texture_unit: reflected.texture_unit,
        };
        let raw = self.uniforms.reserve(record)?;
        Ok(UniformHandle(raw))
    }

    fn destroy_uniform(&mut self, handle: UniformHandle) {
        if self.uniforms.release(handle.raw()).is_none() {
            log::warn!("GlRenderer: Ignoring destroy of stale uniform {handle:?}");
        }
    }

    fn set_uniform(
        &mut self,
        handle: UniformHandle,
        value: UniformValue<'_>,
    ) -> Result<(), ResourceError> {
        let uniform = self
            .uniforms
            .get(handle.raw())
            .ok_or(ResourceError::InvalidHandle)?;
        if value.uniform_type() != uniform.uniform_type {
            return Err(ResourceError::UniformTypeMismatch {
                name: uniform.name.clone(),
                expected: uniform.uniform_type,
                found: value.uniform_type(),
            });
        }
        if uniform.program != self.current_program {
            return Err(ResourceError::InvalidData(format!(
                "uniform '{}' belongs to {:?}, not the current program",
                uniform.name, uniform.program
            )));
        }

        let location = uniform.location.as_ref();
        let gl = &self.gl;
        unsafe {
            match value {
                UniformValue::Float(v) => gl.uniform_1_f32(location, v),
                UniformValue::FloatArray(v) => gl.uniform_1_f32_slice(location, v),
                UniformValue::Vector2(v) => gl.uniform_2_f32(location, v.x, v.y),
                UniformValue::Vector2Array(v) => {
                    gl.uniform_2_f32_slice(location, bytemuck::cast_slice(v))
                }
                UniformValue::Vector3(v) => gl.uniform_3_f32(location, v.x, v.y, v.z),
                UniformValue::Vector3Array(v) => {
                    gl.uniform_3_f32_slice(location, bytemuck::cast_slice(v))
                }
                UniformValue::Vector4(v) => gl.uniform_4_f32(location, v.x, v.y, v.z, v.w),
                UniformValue::Vector4Array(v) => {
                    gl.uniform_4_f32_slice(location, bytemuck::cast_slice(v))
                }
                UniformValue::Matrix(m) => {
                    gl.uniform_matrix_4_f32_slice(location, false, &m.to_cols_array())
                }
                UniformValue::MatrixArray(v) => {
                    gl.uniform_matrix_4_f32_slice(location, false, bytemuck::cast_slice(v))
                }
                UniformValue::Texture(texture) => {
                    let texture = self
                        .textures
                        .get(texture.raw())
                        .ok_or(ResourceError::InvalidHandle)?;
                    let unit = uniform.texture_unit.unwrap_or(0);
                    if glow::TEXTURE0 + unit >= self.capabilities.update_unit() {
                        return Err(ResourceError::InvalidData(format!(
                            "sampler '{}' needs texture unit {unit} but only {} are usable",
                            uniform.name,
                            self.capabilities.texture_units - 1
                        )));
                    }
                    gl.active_texture(glow::TEXTURE0 + unit);
                    gl.bind_texture(texture.target(), Some(texture.native));
                    gl.uniform_1_i32(location, unit as i32);
                }
            }
        }
        Ok(())
    }

    // --- Pipeline state ---

    fn set_face_cull(&mut self, cull: FaceCull) {
        match cull.into_gl() {
            Some(face) => unsafe {
                self.gl.enable(glow::CULL_FACE);
                self.gl.cull_face(face);
            },
            None => self.toggle(glow::CULL_FACE, false),
        }
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        if self.capabilities.polygon_mode {
            unsafe { self.gl.polygon_mode(glow::FRONT_AND_BACK, mode.into_gl()) };
        } else if mode != PolygonMode::Fill {
            log::debug!("GlRenderer: Polygon mode {mode:?} unsupported on OpenGL ES");
        }
    }

    fn set_blend(&mut self, enabled: bool) {
        self.toggle(glow::BLEND, enabled);
    }

    fn set_blend_factor(&mut self, src: BlendFactor, dst: BlendFactor) {
        unsafe { self.gl.blend_func(src.into_gl(), dst.into_gl()) };
    }

    fn set_depth_write(&mut self, enabled: bool) {
        unsafe { self.gl.depth_mask(enabled) };
        self.depth_write = enabled;
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.toggle(glow::DEPTH_TEST, enabled);
    }

    fn set_depth_function(&mut self, function: DepthFunction) {
        unsafe { self.gl.depth_func(function.into_gl()) };
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        unsafe {
            self.gl.viewport(
                viewport.x,
                viewport.y,
                viewport.width as i32,
                viewport.height as i32,
            )
        };
    }

    fn clear(&mut self, request: &ClearRequest) {
        let mut mask = 0;
        unsafe {
            if let Some([r, g, b, a]) = request.color {
                self.gl.clear_color(r, g, b, a);
                mask |= glow::COLOR_BUFFER_BIT;
            }
            if request.depth {
                mask |= glow::DEPTH_BUFFER_BIT;
                // The depth mask also gates clears.
                if !self.depth_write {
                    self.gl.depth_mask(true);
                }
            }
            if mask != 0 {
                self.gl.clear(mask);
            }
            if request.depth && !self.depth_write {
                self.gl.depth_mask(false);
            }
        }
    }

    // --- Draw calls ---

    fn draw(&mut self, primitive: PrimitiveType, binding: VertexBindingHandle, vertex_count: u32) {
        let Some(record) = self.vertex_bindings.get(binding.raw()) else {
            log::warn!("GlRenderer: Draw with stale vertex binding {binding:?} skipped");
            return;
        };
        self.bind_vertex_binding(record);
        unsafe {
            self.gl
                .draw_arrays(primitive.into_gl(), 0, vertex_count as i32)
        };
        self.unbind_vertex_binding(record);
        self.draw_calls += 1;
    }

    fn draw_indexed(
        &mut self,
        primitive: PrimitiveType,
        binding: VertexBindingHandle,
        index_buffer: IndexBufferHandle,
    ) {
        let Some(record) = self.vertex_bindings.get(binding.raw()) else {
            log::warn!("GlRenderer: Draw with stale vertex binding {binding:?} skipped");
            return;
        };
        let Some(indices) = self.index_buffers.get(index_buffer.raw()) else {
            log::warn!("GlRenderer: Draw with stale index buffer {index_buffer:?} skipped");
            return;
        };
        self.bind_vertex_binding(record);
        unsafe {
            self.gl
                .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(indices.native));
            self.gl.draw_elements(
                primitive.into_gl(),
                indices.count as i32,
                glow::UNSIGNED_SHORT,
                0,
            );
        }
        self.unbind_vertex_binding(record);
        self.draw_calls += 1;
    }
}

impl Drop for GlRenderer {
    fn drop(&mut self) {
        let gl = &self.gl;
        let leaked = unsafe {
            [
                (
                    "vertex binding",
                    self.vertex_bindings.cleanup(|binding| {
                        if let Some(vertex_array) = binding.vertex_array {
                            gl.delete_vertex_array(vertex_array);
                        }
                    }),
                ),
                ("uniform", self.uniforms.cleanup(drop)),
                (
                    "program",
                    self.programs
                        .cleanup(|program| gl.delete_program(program.native)),
                ),
                (
                    "frame buffer",
                    self.frame_buffers.cleanup(|frame_buffer| {
                        if let Some(depth) = frame_buffer.depth {
                            gl.delete_renderbuffer(depth);
                        }
                        gl.delete_framebuffer(frame_buffer.native);
                    }),
                ),
                (
                    "vertex buffer",
                    self.vertex_buffers
                        .cleanup(|buffer| gl.delete_buffer(buffer.native)),
                ),
                (
                    "index buffer",
                    self.index_buffers
                        .cleanup(|buffer| gl.delete_buffer(buffer.native)),
                ),
                (
                    "texture",
                    self.textures
                        .cleanup(|texture| gl.delete_texture(texture.native)),
                ),
            ]
        };
        for (kind, count) in leaked {
            if count > 0 {
                log::warn!("GlRenderer: {count} {kind}(s) still alive at shutdown");
            }
        }
    }
}

impl std::fmt::Debug for GlRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlRenderer")
            .field("capabilities", &self.capabilities)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
