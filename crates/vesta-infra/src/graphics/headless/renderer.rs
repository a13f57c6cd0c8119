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

//! A renderer that performs no GPU work.
//!
//! `HeadlessRenderer` keeps the same pools, validation and reflection as the OpenGL
//! backend but backs every native object with a synthetic id. It reflects programs by
//! scanning their GLSL declarations, records the pipeline state and every draw call,
//! and exposes inspection helpers for tests and tools.

use super::glsl::{self, Declaration};
use crate::graphics::validation::{check_image_data, check_vertex_data, check_vertex_layout};
use std::collections::HashSet;
use vesta_core::memory::HandlePool;
use vesta_core::renderer::reflection::{
    wire_attributes, ActiveAttribute, ActiveUniform, AttributeSlots, AttributeWiring,
    UniformTable,
};
use vesta_core::renderer::*;

/// Texture units modelled per renderer. The last one is where textures are bound
/// while they are updated, the same split the OpenGL backend uses.
pub const TEXTURE_UNITS: u32 = 16;

const UPDATE_UNIT: usize = TEXTURE_UNITS as usize - 1;

/// The last value written to a uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedUniform {
    /// Flattened float payload, column-major for matrices.
    Floats(Vec<f32>),
    /// A texture bound to the uniform's unit.
    Texture {
        /// The sampler's texture unit.
        unit: u32,
        /// The texture bound to it.
        texture: TextureHandle,
    },
}

/// One recorded draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub primitive: PrimitiveType,
    pub binding: VertexBindingHandle,
    /// The program current at the time of the draw.
    pub program: ProgramHandle,
    pub frame_buffer: FrameBufferHandle,
    /// `None` for non-indexed draws.
    pub index_buffer: Option<IndexBufferHandle>,
    /// Vertices drawn, or indices for indexed draws.
    pub count: u32,
}

/// The global state set through the pipeline-state setters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineState {
    pub face_cull: FaceCull,
    pub polygon_mode: PolygonMode,
    pub blend: bool,
    pub blend_factors: (BlendFactor, BlendFactor),
    pub depth_write: bool,
    pub depth_test: bool,
    pub depth_function: DepthFunction,
    pub viewport: Viewport,
    pub program: ProgramHandle,
    pub frame_buffer: FrameBufferHandle,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            face_cull: FaceCull::None,
            polygon_mode: PolygonMode::Fill,
            blend: false,
            blend_factors: (BlendFactor::One, BlendFactor::Zero),
            depth_write: true,
            depth_test: false,
            depth_function: DepthFunction::Less,
            viewport: Viewport::default(),
            program: ProgramHandle::EMPTY,
            frame_buffer: FrameBufferHandle::EMPTY,
        }
    }
}

#[derive(Debug)]
struct TextureRecord {
    native: u32,
    kind: TextureKind,
    format: Option<TextureFormat>,
    width: u32,
    height: u32,
    sampling: Option<TextureSampling>,
}

#[derive(Debug)]
struct FrameBufferRecord {
    native: u32,
    depth_native: Option<u32>,
    attachments: Vec<TextureHandle>,
    size: (u32, u32),
}

#[derive(Debug)]
struct VertexBufferRecord {
    native: u32,
    layout: VertexBufferLayout,
    vertex_count: u32,
    dynamic: bool,
    data: Vec<f32>,
}

#[derive(Debug)]
struct IndexBufferRecord {
    native: u32,
    indices: Vec<u16>,
}

#[derive(Debug)]
struct ProgramRecord {
    native: u32,
    attributes: AttributeSlots,
    uniforms: UniformTable,
}

#[derive(Debug)]
struct VertexBindingRecord {
    native: u32,
    program: ProgramHandle,
    wiring: Vec<AttributeWiring>,
}

#[derive(Debug)]
struct UniformRecord {
    program: ProgramHandle,
    name: String,
    uniform_type: UniformType,
    texture_unit: Option<u32>,
    value: Option<RecordedUniform>,
}

/// The stub backend. See the module documentation.
#[derive(Debug)]
pub struct HeadlessRenderer {
    textures: HandlePool<TextureRecord>,
    frame_buffers: HandlePool<FrameBufferRecord>,
    vertex_buffers: HandlePool<VertexBufferRecord>,
    index_buffers: HandlePool<IndexBufferRecord>,
    programs: HandlePool<ProgramRecord>,
    vertex_bindings: HandlePool<VertexBindingRecord>,
    uniforms: HandlePool<UniformRecord>,

    next_native_id: u32,
    state: PipelineState,
    texture_units: [Option<TextureHandle>; TEXTURE_UNITS as usize],
    draw_calls: Vec<DrawCall>,
    draw_call_count: u64,
    clears: Vec<(FrameBufferHandle, ClearRequest)>,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new(&RendererConfig::headless())
    }
}

impl HeadlessRenderer {
    /// Creates a renderer with the pool capacities and viewport of `config`.
    pub fn new(config: &RendererConfig) -> Self {
        let limits = &config.limits;
        let mut state = PipelineState::default();
        if let Some((width, height)) = config.viewport {
            state.viewport = Viewport::from_size(width, height);
        }
        log::info!("HeadlessRenderer: Initialized with limits {limits:?}");
        Self {
            textures: HandlePool::with_capacity("texture", limits.textures),
            frame_buffers: HandlePool::with_capacity("frame buffer", limits.frame_buffers),
            vertex_buffers: HandlePool::with_capacity("vertex buffer", limits.vertex_buffers),
            index_buffers: HandlePool::with_capacity("index buffer", limits.index_buffers),
            programs: HandlePool::with_capacity("program", limits.programs),
            vertex_bindings: HandlePool::with_capacity("vertex binding", limits.vertex_bindings),
            uniforms: HandlePool::with_capacity("uniform", limits.uniforms),
            next_native_id: 1,
            state,
            texture_units: [None; TEXTURE_UNITS as usize],
            draw_calls: Vec::new(),
            draw_call_count: 0,
            clears: Vec::new(),
        }
    }

    fn generate_native_id(&mut self) -> u32 {
        let id = self.next_native_id;
        self.next_native_id += 1;
        id
    }

    // --- Inspection ---

    /// Every draw call since creation or the last [`HeadlessRenderer::clear_draw_calls`].
    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    /// Forgets the recorded draw calls. The [`RendererStats::draw_calls`] total is kept.
    pub fn clear_draw_calls(&mut self) {
        self.draw_calls.clear();
    }

    /// Every clear, with the render target it applied to.
    pub fn clears(&self) -> &[(FrameBufferHandle, ClearRequest)] {
        &self.clears
    }

    /// The current pipeline state.
    pub fn pipeline_state(&self) -> &PipelineState {
        &self.state
    }

    /// The attribute wiring of a vertex binding.
    pub fn binding_wiring(&self, handle: VertexBindingHandle) -> Option<&[AttributeWiring]> {
        self.vertex_bindings
            .get(handle.raw())
            .map(|binding| binding.wiring.as_slice())
    }

    /// The input slot a program assigned to `name`.
    pub fn attribute_slot(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.programs.get(program.raw())?.attributes.slot(name)
    }

    /// The texture unit of a sampler uniform.
    pub fn uniform_texture_unit(&self, handle: UniformHandle) -> Option<u32> {
        self.uniforms.get(handle.raw())?.texture_unit
    }

    /// The texture currently bound on `unit`.
    pub fn bound_texture(&self, unit: u32) -> Option<TextureHandle> {
        self.texture_units.get(unit as usize).copied().flatten()
    }

    /// The last value written to a uniform.
    pub fn uniform_value(&self, handle: UniformHandle) -> Option<&RecordedUniform> {
        self.uniforms.get(handle.raw())?.value.as_ref()
    }

    /// The contents of a vertex buffer.
    pub fn vertex_buffer_data(&self, handle: VertexBufferHandle) -> Option<&[f32]> {
        self.vertex_buffers
            .get(handle.raw())
            .map(|buffer| buffer.data.as_slice())
    }

    /// The contents of an index buffer.
    pub fn index_buffer_data(&self, handle: IndexBufferHandle) -> Option<&[u16]> {
        self.index_buffers
            .get(handle.raw())
            .map(|buffer| buffer.indices.as_slice())
    }

    /// The sampling state last applied to a texture.
    pub fn texture_sampling(&self, handle: TextureHandle) -> Option<TextureSampling> {
        self.textures.get(handle.raw())?.sampling
    }

    /// The kind a texture was defined as by its uploads.
    pub fn texture_kind(&self, handle: TextureHandle) -> Option<TextureKind> {
        self.textures.get(handle.raw()).map(|texture| texture.kind)
    }

    /// The attachments of a framebuffer.
    pub fn frame_buffer_attachments(&self, handle: FrameBufferHandle) -> Option<&[TextureHandle]> {
        self.frame_buffers
            .get(handle.raw())
            .map(|fb| fb.attachments.as_slice())
    }

    // --- Helpers ---

    fn upload_image(
        &mut self,
        handle: TextureHandle,
        kind: TextureKind,
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
        texture.kind = kind;
        texture.format = Some(format);
        texture.width = width;
        texture.height = height;
        log::debug!(
            "HeadlessRenderer: Uploaded {width}x{height} {format:?} image to texture {}",
            texture.native
        );
        self.texture_units[UPDATE_UNIT] = Some(handle);
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
        let floats = layout.floats_per_vertex() * vertex_count as usize;
        let contents = match data {
            Some(data) => {
                check_vertex_data(layout, data, vertex_count)?;
                data[..floats].to_vec()
            }
            None => vec![0.0; floats],
        };
        let native = self.generate_native_id();
        let raw = self.vertex_buffers.reserve(VertexBufferRecord {
            native,
            layout: layout.clone(),
            vertex_count,
            dynamic,
            data: contents,
        })?;
        log::debug!(
            "HeadlessRenderer: Created vertex buffer {raw:?}: {vertex_count} vertices, stride {} bytes",
            layout.size()
        );
        Ok(VertexBufferHandle(raw))
    }

    fn record_draw(
        &mut self,
        primitive: PrimitiveType,
        binding: VertexBindingHandle,
        index_buffer: Option<IndexBufferHandle>,
        count: u32,
    ) {
        let Some(record) = self.vertex_bindings.get(binding.raw()) else {
            log::warn!("HeadlessRenderer: Draw with stale vertex binding {binding:?} skipped");
            return;
        };
        if record.program != self.state.program {
            log::warn!(
                "HeadlessRenderer: Binding {binding:?} was built for {:?} but {:?} is current",
                record.program,
                self.state.program
            );
        }
        self.draw_calls.push(DrawCall {
            primitive,
            binding,
            program: self.state.program,
            frame_buffer: self.state.frame_buffer,
            index_buffer,
            count,
        });
        self.draw_call_count += 1;
    }
}

/// Turns scanned attribute declarations into slots: explicit locations first, then the
/// lowest free slot in declaration order.
fn assign_attribute_slots(inputs: &[Declaration]) -> Vec<ActiveAttribute> {
    let mut used: HashSet<u32> = inputs.iter().filter_map(|d| d.location).collect();
    let mut next_free = 0;
    inputs
        .iter()
        .map(|input| {
            let slot = input.location.unwrap_or_else(|| {
                while used.contains(&next_free) {
                    next_free += 1;
                }
                used.insert(next_free);
                next_free
            });
            ActiveAttribute {
                name: input.name.clone(),
                slot,
            }
        })
        .collect()
}

/// Merges the uniforms of both stages, reporting arrays the way drivers do.
fn active_uniforms(
    vertex: &[Declaration],
    fragment: &[Declaration],
) -> Result<Vec<ActiveUniform>, ShaderError> {
    let mut merged: Vec<&Declaration> = Vec::new();
    for declaration in vertex.iter().chain(fragment) {
        match merged.iter().find(|d| d.name == declaration.name) {
            Some(existing) if existing.glsl_type != declaration.glsl_type => {
                return Err(ShaderError::LinkFailure {
                    log: format!(
                        "uniform '{}' declared as both {} and {}",
                        declaration.name, existing.glsl_type, declaration.glsl_type
                    ),
                });
            }
            Some(_) => {}
            None => merged.push(declaration),
        }
    }
    Ok(merged
        .into_iter()
        .map(|d| ActiveUniform {
            name: if d.array_size > 1 {
                format!("{}[0]", d.name)
            } else {
                d.name.clone()
            },
            array_size: d.array_size,
            value_type: d.value_type(),
            sampler: d.sampler(),
        })
        .collect())
}

impl Renderer for HeadlessRenderer {
    fn backend_type(&self) -> RendererBackendType {
        RendererBackendType::Headless
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
            draw_calls: self.draw_call_count,
        }
    }

    // --- Textures ---

    fn create_texture(&mut self) -> Result<TextureHandle, ResourceError> {
        let native = self.generate_native_id();
        let raw = self.textures.reserve(TextureRecord {
            native,
            kind: TextureKind::Uninitialized,
            format: None,
            width: 0,
            height: 0,
            sampling: None,
        })?;
        log::debug!("HeadlessRenderer: Created texture {raw:?}");
        Ok(TextureHandle(raw))
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        match self.textures.release(handle.raw()) {
            Some(_) => {
                for unit in self.texture_units.iter_mut() {
                    if *unit == Some(handle) {
                        *unit = None;
                    }
                }
                log::debug!("HeadlessRenderer: Destroyed texture {handle:?}");
            }
            None => log::warn!("HeadlessRenderer: Ignoring destroy of stale texture {handle:?}"),
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
        self.upload_image(handle, TextureKind::Texture2d, format, width, height, data)
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
        self.upload_image(handle, TextureKind::Cube, format, width, height, data)
    }

    fn set_texture_sampling(
        &mut self,
        handle: TextureHandle,
        sampling: &TextureSampling,
    ) -> Result<(), ResourceError> {
        let texture = self
            .textures
            .get_mut(handle.raw())
            .ok_or(ResourceError::InvalidHandle)?;
        if texture.kind == TextureKind::Uninitialized {
            return Err(ResourceError::InvalidData(
                "sampling set on a texture without an image".to_string(),
            ));
        }
        texture.sampling = Some(*sampling);
        self.texture_units[UPDATE_UNIT] = Some(handle);
        Ok(())
    }

    fn texture_size(&self, handle: TextureHandle) -> Option<(u32, u32)> {
        self.textures
            .get(handle.raw())
            .map(|texture| (texture.width, texture.height))
    }

    // --- Framebuffers ---

    fn create_frame_buffer(&mut self) -> Result<FrameBufferHandle, ResourceError> {
        let native = self.generate_native_id();
        let raw = self.frame_buffers.reserve(FrameBufferRecord {
            native,
            depth_native: None,
            attachments: Vec::new(),
            size: (0, 0),
        })?;
        log::debug!("HeadlessRenderer: Created frame buffer {raw:?}");
        Ok(FrameBufferHandle(raw))
    }

    fn destroy_frame_buffer(&mut self, handle: FrameBufferHandle) {
        match self.frame_buffers.release(handle.raw()) {
            Some(_) => {
                if self.state.frame_buffer == handle {
                    self.state.frame_buffer = FrameBufferHandle::EMPTY;
                }
                log::debug!("HeadlessRenderer: Destroyed frame buffer {handle:?}");
            }
            None => {
                log::warn!("HeadlessRenderer: Ignoring destroy of stale frame buffer {handle:?}")
            }
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
        }

        let depth_native = match size {
            Some(_) => Some(self.generate_native_id()),
            None => None,
        };
        let frame_buffer = self
            .frame_buffers
            .get_mut(handle.raw())
            .ok_or(ResourceError::InvalidHandle)?;
        frame_buffer.attachments = attachments.to_vec();
        frame_buffer.size = size.unwrap_or((0, 0));
        frame_buffer.depth_native = frame_buffer.depth_native.or(depth_native);
        log::debug!(
            "HeadlessRenderer: Frame buffer {} now has {} attachment(s) of {:?}",
            frame_buffer.native,
            attachments.len(),
            frame_buffer.size
        );
        Ok(())
    }

    fn frame_buffer_size(&self, handle: FrameBufferHandle) -> Option<(u32, u32)> {
        self.frame_buffers.get(handle.raw()).map(|fb| fb.size)
    }

    fn set_frame_buffer(&mut self, handle: FrameBufferHandle) {
        if !handle.is_empty() && !self.frame_buffers.contains(handle.raw()) {
            log::warn!("HeadlessRenderer: Cannot bind stale frame buffer {handle:?}");
            return;
        }
        self.state.frame_buffer = handle;
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
            .get_mut(handle.raw())
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

        let floats = buffer.layout.floats_per_vertex();
        let start = vertex_offset as usize * floats;
        let len = vertex_count as usize * floats;
        buffer.data[start..start + len].copy_from_slice(&data[..len]);
        log::trace!(
            "HeadlessRenderer: Updated {vertex_count} vertices of buffer {} at {vertex_offset}",
            buffer.native
        );
        Ok(())
    }

    fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle) {
        match self.vertex_buffers.release(handle.raw()) {
            Some(_) => log::debug!("HeadlessRenderer: Destroyed vertex buffer {handle:?}"),
            None => {
                log::warn!("HeadlessRenderer: Ignoring destroy of stale vertex buffer {handle:?}")
            }
        }
    }

    fn create_index_buffer(&mut self, data: &[u16]) -> Result<IndexBufferHandle, ResourceError> {
        let native = self.generate_native_id();
        let raw = self.index_buffers.reserve(IndexBufferRecord {
            native,
            indices: data.to_vec(),
        })?;
        log::debug!(
            "HeadlessRenderer: Created index buffer {raw:?} with {} indices",
            data.len()
        );
        Ok(IndexBufferHandle(raw))
    }

    fn destroy_index_buffer(&mut self, handle: IndexBufferHandle) {
        match self.index_buffers.release(handle.raw()) {
            Some(_) => log::debug!("HeadlessRenderer: Destroyed index buffer {handle:?}"),
            None => {
                log::warn!("HeadlessRenderer: Ignoring destroy of stale index buffer {handle:?}")
            }
        }
    }

    // --- Programs, bindings and uniforms ---

    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramHandle, ResourceError> {
        let vertex = glsl::scan(vertex_source, ShaderStage::Vertex);
        let fragment = glsl::scan(fragment_source, ShaderStage::Fragment);

        for (stage, interface) in [
            (ShaderStage::Vertex, &vertex),
            (ShaderStage::Fragment, &fragment),
        ] {
            if !interface.has_entry_point {
                let error = ShaderError::CompileFailure {
                    stage,
                    log: "ERROR: 0:1: 'main' : function not defined".to_string(),
                };
                log::error!("HeadlessRenderer: {error}");
                return Err(error.into());
            }
        }

        if let Some(missing) = fragment
            .inputs
            .iter()
            .find(|input| !vertex.outputs.iter().any(|output| output.name == input.name))
        {
            let error = ShaderError::LinkFailure {
                log: format!(
                    "fragment input '{}' is not written by the vertex stage",
                    missing.name
                ),
            };
            log::error!("HeadlessRenderer: {error}");
            return Err(error.into());
        }

        let uniforms = active_uniforms(&vertex.uniforms, &fragment.uniforms).map_err(|error| {
            log::error!("HeadlessRenderer: {error}");
            ResourceError::from(error)
        })?;
        let attributes = assign_attribute_slots(&vertex.inputs);

        let native = self.generate_native_id();
        let raw = self.programs.reserve(ProgramRecord {
            native,
            attributes: AttributeSlots::from_active(attributes),
            uniforms: UniformTable::from_active(uniforms),
        })?;
        log::debug!(
            "HeadlessRenderer: Created program {raw:?} ({} inputs, {} uniforms)",
            vertex.inputs.len(),
            vertex.uniforms.len() + fragment.uniforms.len()
        );
        Ok(ProgramHandle(raw))
    }

    fn destroy_program(&mut self, handle: ProgramHandle) {
        match self.programs.release(handle.raw()) {
            Some(_) => {
                if self.state.program == handle {
                    self.state.program = ProgramHandle::EMPTY;
                }
                log::debug!("HeadlessRenderer: Destroyed program {handle:?}");
            }
            None => log::warn!("HeadlessRenderer: Ignoring destroy of stale program {handle:?}"),
        }
    }

    fn set_program(&mut self, handle: ProgramHandle) {
        if !handle.is_empty() && !self.programs.contains(handle.raw()) {
            log::warn!("HeadlessRenderer: Cannot use stale program {handle:?}");
            return;
        }
        self.state.program = handle;
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
        let layouts = buffers
            .iter()
            .map(|buffer| {
                self.vertex_buffers
                    .get(buffer.raw())
                    .map(|record| &record.layout)
                    .ok_or(ResourceError::InvalidHandle)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let wiring = wire_attributes(layouts, &program_record.attributes);

        let native = self.generate_native_id();
        let raw = self.vertex_bindings.reserve(VertexBindingRecord {
            native,
            program,
            wiring,
        })?;
        log::debug!(
            "HeadlessRenderer: Created vertex binding {raw:?} over {} buffer(s) for {program:?}",
            buffers.len()
        );
        Ok(VertexBindingHandle(raw))
    }

    fn destroy_vertex_binding(&mut self, handle: VertexBindingHandle) {
        match self.vertex_bindings.release(handle.raw()) {
            Some(_) => log::debug!("HeadlessRenderer: Destroyed vertex binding {handle:?}"),
            None => {
                log::warn!("HeadlessRenderer: Ignoring destroy of stale vertex binding {handle:?}")
            }
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
        let texture_unit = reflected.texture_unit;

        let raw = self.uniforms.reserve(UniformRecord {
            program,
            name: name.to_string(),
            uniform_type,
            texture_unit,
            value: None,
        })?;
        log::debug!("HeadlessRenderer: Created uniform {raw:?} '{name}' ({uniform_type:?})");
        Ok(UniformHandle(raw))
    }

    fn destroy_uniform(&mut self, handle: UniformHandle) {
        match self.uniforms.release(handle.raw()) {
            Some(_) => log::debug!("HeadlessRenderer: Destroyed uniform {handle:?}"),
            None => log::warn!("HeadlessRenderer: Ignoring destroy of stale uniform {handle:?}"),
        }
    }

    fn set_uniform(
        &mut self,
        handle: UniformHandle,
        value: UniformValue<'_>,
    ) -> Result<(), ResourceError> {
        let current_program = self.state.program;
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
        if uniform.program != current_program {
            return Err(ResourceError::InvalidData(format!(
                "uniform '{}' belongs to {:?}, not the current program",
                uniform.name, uniform.program
            )));
        }

        let recorded = match value {
            UniformValue::Texture(texture) => {
                if !self.textures.contains(texture.raw()) {
                    return Err(ResourceError::InvalidHandle);
                }
                let unit = uniform.texture_unit.unwrap_or(0);
                if unit as usize >= UPDATE_UNIT {
                    return Err(ResourceError::InvalidData(format!(
                        "sampler '{}' needs texture unit {unit} but only {UPDATE_UNIT} are usable",
                        uniform.name
                    )));
                }
                self.texture_units[unit as usize] = Some(texture);
                RecordedUniform::Texture { unit, texture }
            }
            other => RecordedUniform::Floats(other.to_floats().unwrap_or_default()),
        };
        if let Some(uniform) = self.uniforms.get_mut(handle.raw()) {
            uniform.value = Some(recorded);
        }
        Ok(())
    }

    // --- Pipeline state ---

    fn set_face_cull(&mut self, cull: FaceCull) {
        self.state.face_cull = cull;
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.state.polygon_mode = mode;
    }

    fn set_blend(&mut self, enabled: bool) {
        self.state.blend = enabled;
    }

    fn set_blend_factor(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.state.blend_factors = (src, dst);
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.state.depth_write = enabled;
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
    }

    fn set_depth_function(&mut self, function: DepthFunction) {
        self.state.depth_function = function;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.state.viewport = viewport;
    }

    fn clear(&mut self, request: &ClearRequest) {
        self.clears.push((self.state.frame_buffer, *request));
    }

    // --- Draw calls ---

    fn draw(&mut self, primitive: PrimitiveType, binding: VertexBindingHandle, vertex_count: u32) {
        self.record_draw(primitive, binding, None, vertex_count);
    }

    fn draw_indexed(
        &mut self,
        primitive: PrimitiveType,
        binding: VertexBindingHandle,
        index_buffer: IndexBufferHandle,
    ) {
        let Some(count) = self
            .index_buffers
            .get(index_buffer.raw())
            .map(|buffer| buffer.indices.len() as u32)
        else {
            log::warn!("HeadlessRenderer: Draw with stale index buffer {index_buffer:?} skipped");
            return;
        };
        self.record_draw(primitive, binding, Some(index_buffer), count);
    }
}

impl Drop for HeadlessRenderer {
    fn drop(&mut self) {
        let leaked = [
            ("vertex binding", self.vertex_bindings.cleanup(drop)),
            ("uniform", self.uniforms.cleanup(drop)),
            ("program", self.programs.cleanup(drop)),
            ("frame buffer", self.frame_buffers.cleanup(drop)),
            ("vertex buffer", self.vertex_buffers.cleanup(drop)),
            ("index buffer", self.index_buffers.cleanup(drop)),
            ("texture", self.textures.cleanup(drop)),
        ];
        for (kind, count) in leaked {
            if count > 0 {
                log::warn!("HeadlessRenderer: {count} {kind}(s) still alive at shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
        #version 330 core
        layout(location = 1) in vec3 normal;
        in vec3 position;
        in vec2 texCoord0;
        uniform mat4 worldViewProjectionMatrix;
        out vec2 uv;
        void main() { uv = texCoord0; gl_Position = worldViewProjectionMatrix * vec4(position, 1.0); }
    "#;

    const FRAGMENT: &str = r#"
        #version 330 core
        in vec2 uv;
        uniform sampler2D diffuse;
        uniform sampler2D shadows[2];
        uniform samplerCube environment;
        out vec4 color;
        void main() { color = texture(diffuse, uv); }
    "#;

    fn position_layout() -> VertexBufferLayout {
        VertexBufferLayout::new().with(VertexAttributeSemantic::Position, 3)
    }

    #[test]
    fn attribute_slots_fill_around_explicit_locations() {
        let mut renderer = HeadlessRenderer::default();
        let program = renderer.create_program(VERTEX, FRAGMENT).unwrap();
        assert_eq!(renderer.attribute_slot(program, "normal"), Some(1));
        assert_eq!(renderer.attribute_slot(program, "position"), Some(0));
        assert_eq!(renderer.attribute_slot(program, "texCoord0"), Some(2));
    }

    #[test]
    fn sampler_arrays_reserve_consecutive_units() {
        let mut renderer = HeadlessRenderer::default();
        let program = renderer.create_program(VERTEX, FRAGMENT).unwrap();
        let units: Vec<_> = ["diffuse", "shadows", "environment"]
            .into_iter()
            .map(|name| {
                let uniform = renderer
                    .create_uniform(name, UniformType::Texture, program)
                    .unwrap();
                renderer.uniform_texture_unit(uniform)
            })
            .collect();
        assert_eq!(units, vec![Some(0), Some(1), Some(3)]);
    }

    #[test]
    fn unmatched_fragment_input_fails_to_link() {
        let mut renderer = HeadlessRenderer::default();
        let fragment = "in vec3 missing; out vec4 color; void main() {}";
        let error = renderer.create_program(VERTEX, fragment).unwrap_err();
        assert!(matches!(
            error,
            ResourceError::Shader(ShaderError::LinkFailure { .. })
        ));
        assert_eq!(renderer.stats().programs, 0);
    }

    #[test]
    fn dynamic_update_rejects_ranges_past_the_end() {
        let mut renderer = HeadlessRenderer::default();
        let layout = position_layout();
        let buffer = renderer
            .create_dynamic_vertex_buffer(&layout, None, 4)
            .unwrap();

        renderer
            .update_dynamic_vertex_buffer(buffer, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2)
            .unwrap();
        let data = renderer.vertex_buffer_data(buffer).unwrap();
        assert_eq!(&data[6..], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let error = renderer
            .update_dynamic_vertex_buffer(buffer, 3, &[0.0; 6], 2)
            .unwrap_err();
        assert_eq!(error, ResourceError::OutOfBounds { index: 5, len: 4 });
    }

    #[test]
    fn static_buffers_cannot_be_updated() {
        let mut renderer = HeadlessRenderer::default();
        let buffer = renderer
            .create_vertex_buffer(&position_layout(), &[0.0; 3], 1)
            .unwrap();
        assert!(matches!(
            renderer.update_dynamic_vertex_buffer(buffer, 0, &[1.0; 3], 1),
            Err(ResourceError::InvalidData(_))
        ));
    }

    #[test]
    fn short_pixel_data_is_rejected() {
        let mut renderer = HeadlessRenderer::default();
        let texture = renderer.create_texture().unwrap();
        let error = renderer
            .update_2d_texture(texture, TextureFormat::Rgba, 2, 2, Some(&[0; 15]))
            .unwrap_err();
        assert!(matches!(error, ResourceError::InvalidData(_)));
        assert_eq!(renderer.texture_kind(texture), Some(TextureKind::Uninitialized));
    }

    #[test]
    fn texture_updates_leave_sampler_units_alone() {
        let mut renderer = HeadlessRenderer::default();
        let program = renderer.create_program(VERTEX, FRAGMENT).unwrap();
        renderer.set_program(program);
        let diffuse = renderer
            .create_uniform("diffuse", UniformType::Texture, program)
            .unwrap();
        let first = renderer.create_texture().unwrap();
        let second = renderer.create_texture().unwrap();
        renderer
            .update_2d_texture(first, TextureFormat::Rgba, 1, 1, None)
            .unwrap();
        renderer
            .update_2d_texture(second, TextureFormat::Rgba, 1, 1, None)
            .unwrap();

        renderer
            .set_uniform(diffuse, UniformValue::Texture(first))
            .unwrap();
        renderer
            .set_texture_sampling(second, &TextureSampling::default())
            .unwrap();
        assert_eq!(renderer.bound_texture(0), Some(first));
        assert_eq!(renderer.bound_texture(TEXTURE_UNITS - 1), Some(second));

        renderer.destroy_texture(first);
        assert_eq!(renderer.bound_texture(0), None);
    }

    #[test]
    fn texture_kind_is_fixed_by_first_upload() {
        let mut renderer = HeadlessRenderer::default();
        let texture = renderer.create_texture().unwrap();
        renderer
            .update_cube_texture(texture, CubeFace::Top, TextureFormat::Rgb, 8, 8, None)
            .unwrap();
        assert!(renderer
            .update_2d_texture(texture, TextureFormat::Rgb, 8, 8, None)
            .is_err());
        assert!(renderer
            .update_cube_texture(texture, CubeFace::Back, TextureFormat::Rgb, 8, 4, None)
            .is_err());
    }

    #[test]
    fn draws_with_stale_bindings_are_skipped() {
        let mut renderer = HeadlessRenderer::default();
        let program = renderer.create_program(VERTEX, FRAGMENT).unwrap();
        let buffer = renderer
            .create_vertex_buffer(&position_layout(), &[0.0; 9], 3)
            .unwrap();
        let binding = renderer.create_vertex_binding(&[buffer], program).unwrap();
        renderer.set_program(program);
        renderer.draw(PrimitiveType::Triangles, binding, 3);
        renderer.destroy_vertex_binding(binding);
        renderer.draw(PrimitiveType::Triangles, binding, 3);

        assert_eq!(renderer.draw_calls().len(), 1);
        assert_eq!(renderer.draw_calls()[0].program, program);
        assert_eq!(renderer.stats().draw_calls, 1);
    }

    #[test]
    fn pool_capacity_comes_from_config() {
        let mut config = RendererConfig::headless();
        config.limits.index_buffers = 1;
        let mut renderer = HeadlessRenderer::new(&config);
        renderer.create_index_buffer(&[0, 1, 2]).unwrap();
        assert!(matches!(
            renderer.create_index_buffer(&[0, 1, 2]),
            Err(ResourceError::CapacityExceeded { capacity: 1, .. })
        ));
    }
}
