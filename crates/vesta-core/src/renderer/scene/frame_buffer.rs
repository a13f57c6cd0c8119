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

use crate::renderer::error::ResourceError;
use crate::renderer::handles::{FrameBufferHandle, TextureHandle};
use crate::renderer::scene::texture::{Texture, Texture2d};
use crate::renderer::traits::SharedRenderer;
use std::rc::Rc;

/// An owned off-screen render target.
///
/// Holds its colour attachments alive for as long as they are attached.
pub struct FrameBuffer {
    renderer: SharedRenderer,
    handle: FrameBufferHandle,
    attachments: Vec<Rc<Texture2d>>,
    size: (u32, u32),
}

impl FrameBuffer {
    /// Creates a framebuffer with no attachments.
    pub fn new(renderer: &SharedRenderer) -> Result<Self, ResourceError> {
        let handle = renderer.borrow_mut().create_frame_buffer()?;
        Ok(Self {
            renderer: renderer.clone(),
            handle,
            attachments: Vec::new(),
            size: (0, 0),
        })
    }

    /// Creates a framebuffer rendering into `attachments`.
    pub fn with_attachments(
        renderer: &SharedRenderer,
        attachments: Vec<Rc<Texture2d>>,
    ) -> Result<Self, ResourceError> {
        let mut frame_buffer = Self::new(renderer)?;
        frame_buffer.set_attachments(attachments)?;
        Ok(frame_buffer)
    }

    /// Replaces the colour attachments. All attachments must share one size.
    ///
    /// On failure the previous attachments stay in place.
    pub fn set_attachments(&mut self, attachments: Vec<Rc<Texture2d>>) -> Result<(), ResourceError> {
        if let Some(first) = attachments.first() {
            let expected = first.size();
            if let Some(other) = attachments.iter().find(|t| t.size() != expected) {
                return Err(ResourceError::AttachmentSizeMismatch {
                    expected,
                    found: other.size(),
                });
            }
        }

        let handles: Vec<TextureHandle> = attachments.iter().map(|t| t.handle()).collect();
        let mut renderer = self.renderer.borrow_mut();
        renderer.update_frame_buffer(self.handle, &handles)?;
        self.size = renderer.frame_buffer_size(self.handle).unwrap_or((0, 0));
        drop(renderer);

        self.attachments = attachments;
        Ok(())
    }

    /// The attached textures, in attachment order.
    pub fn attachments(&self) -> &[Rc<Texture2d>] {
        &self.attachments
    }

    /// Size shared by the attachments, `(0, 0)` without attachments.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// The renderer handle of the framebuffer.
    pub fn handle(&self) -> FrameBufferHandle {
        self.handle
    }

    /// Makes this framebuffer the render target.
    pub fn bind(&self) {
        self.renderer.borrow_mut().set_frame_buffer(self.handle);
    }

    /// Restores the default render target.
    pub fn unbind(&self) {
        self.renderer
            .borrow_mut()
            .set_frame_buffer(FrameBufferHandle::EMPTY);
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        self.renderer.borrow_mut().destroy_frame_buffer(self.handle);
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("handle", &self.handle)
            .field("attachments", &self.attachments.len())
            .field("size", &self.size)
            .finish()
    }
}
