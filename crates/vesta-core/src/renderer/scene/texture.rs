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

use crate::renderer::api::{CubeFace, TextureFormat, TextureSampling};
use crate::renderer::error::ResourceError;
use crate::renderer::handles::TextureHandle;
use crate::renderer::traits::SharedRenderer;
use std::cell::Cell;

/// A texture that can be sampled by a material.
pub trait Texture {
    /// The renderer handle of the texture.
    fn handle(&self) -> TextureHandle;

    /// Prepares the texture for sampling, flushing any pending sampling state.
    fn bind(&self) -> Result<(), ResourceError>;
}

/// Sampling state shared by both texture kinds, applied lazily on bind.
#[derive(Debug)]
struct SamplingState {
    sampling: TextureSampling,
    dirty: Cell<bool>,
}

impl SamplingState {
    fn new(sampling: TextureSampling) -> Self {
        Self {
            sampling,
            dirty: Cell::new(true),
        }
    }

    fn set(&mut self, sampling: TextureSampling) {
        if self.sampling != sampling {
            self.sampling = sampling;
            self.dirty.set(true);
        }
    }

    fn flush(&self, renderer: &SharedRenderer, handle: TextureHandle) -> Result<(), ResourceError> {
        if self.dirty.get() {
            renderer
                .borrow_mut()
                .set_texture_sampling(handle, &self.sampling)?;
            self.dirty.set(false);
        }
        Ok(())
    }
}

/// An owned 2D texture.
pub struct Texture2d {
    renderer: SharedRenderer,
    handle: TextureHandle,
    format: TextureFormat,
    width: u32,
    height: u32,
    sampling: SamplingState,
}

impl Texture2d {
    /// Creates a texture and uploads `data`, or only allocates storage when `data` is
    /// `None`.
    pub fn new(
        renderer: &SharedRenderer,
        format: TextureFormat,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    ) -> Result<Self, ResourceError> {
        let handle = renderer.borrow_mut().create_texture()?;
        // Constructed before the upload so a failed upload still frees the handle.
        let texture = Self {
            renderer: renderer.clone(),
            handle,
            format,
            width,
            height,
            sampling: SamplingState::new(TextureSampling::default()),
        };
        let uploaded = renderer
            .borrow_mut()
            .update_2d_texture(handle, format, width, height, data);
        uploaded.map(|_| texture)
    }

    /// Creates a texture without contents, suitable as a framebuffer attachment.
    pub fn render_target(
        renderer: &SharedRenderer,
        format: TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, ResourceError> {
        Self::new(renderer, format, width, height, None)
    }

    /// Replaces the image, possibly changing its format and size.
    pub fn update(
        &mut self,
        format: TextureFormat,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    ) -> Result<(), ResourceError> {
        self.renderer
            .borrow_mut()
            .update_2d_texture(self.handle, format, width, height, data)?;
        self.format = format;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Changes the sampling state; it is applied on the next [`Texture::bind`].
    pub fn set_sampling(&mut self, sampling: TextureSampling) {
        self.sampling.set(sampling);
    }

    /// The current sampling state.
    pub fn sampling(&self) -> &TextureSampling {
        &self.sampling.sampling
    }

    /// Pixel format of the last upload.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// `(width, height)` of the last upload.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Texture for Texture2d {
    fn handle(&self) -> TextureHandle {
        self.handle
    }

    fn bind(&self) -> Result<(), ResourceError> {
        self.sampling.flush(&self.renderer, self.handle)
    }
}

impl Drop for Texture2d {
    fn drop(&mut self) {
        self.renderer.borrow_mut().destroy_texture(self.handle);
    }
}

impl std::fmt::Debug for Texture2d {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture2d")
            .field("handle", &self.handle)
            .field("format", &self.format)
            .field("size", &(self.width, self.height))
            .finish()
    }
}

/// An owned cube texture with square faces.
pub struct CubeTexture {
    renderer: SharedRenderer,
    handle: TextureHandle,
    format: TextureFormat,
    size: u32,
    sampling: SamplingState,
}

impl CubeTexture {
    /// Creates a cube texture and allocates storage for all six faces.
    pub fn new(
        renderer: &SharedRenderer,
        format: TextureFormat,
        size: u32,
    ) -> Result<Self, ResourceError> {
        let handle = renderer.borrow_mut().create_texture()?;
        let texture = Self {
            renderer: renderer.clone(),
            handle,
            format,
            size,
            sampling: SamplingState::new(TextureSampling::default()),
        };
        for face in CubeFace::ALL {
            let allocated = renderer
                .borrow_mut()
                .update_cube_texture(handle, face, format, size, size, None);
            allocated?;
        }
        Ok(texture)
    }

    /// Uploads the image of one face.
    pub fn update_face(&mut self, face: CubeFace, data: &[u8]) -> Result<(), ResourceError> {
        self.renderer.borrow_mut().update_cube_texture(
            self.handle,
            face,
            self.format,
            self.size,
            self.size,
            Some(data),
        )
    }

    /// Changes the sampling state; it is applied on the next [`Texture::bind`].
    pub fn set_sampling(&mut self, sampling: TextureSampling) {
        self.sampling.set(sampling);
    }

    /// The current sampling state.
    pub fn sampling(&self) -> &TextureSampling {
        &self.sampling.sampling
    }

    /// Pixel format of every face.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Edge length of every face.
    pub fn size(&self) -> u32 {
        self.size
    }
}

impl Texture for CubeTexture {
    fn handle(&self) -> TextureHandle {
        self.handle
    }

    fn bind(&self) -> Result<(), ResourceError> {
        self.sampling.flush(&self.renderer, self.handle)
    }
}

impl Drop for CubeTexture {
    fn drop(&mut self) {
        self.renderer.borrow_mut().destroy_texture(self.handle);
    }
}

impl std::fmt::Debug for CubeTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CubeTexture")
            .field("handle", &self.handle)
            .field("format", &self.format)
            .field("size", &self.size)
            .finish()
    }
}
