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

use crate::renderer::api::UniformType;
use crate::renderer::error::ResourceError;
use crate::renderer::handles::{ProgramHandle, UniformHandle};
use crate::renderer::traits::SharedRenderer;

/// A compiled vertex + fragment program.
///
/// An effect whose sources fail to build is still a value: it reports
/// `is_valid() == false`, keeps the diagnostic log, and makes every draw with it a
/// caller decision rather than an abort.
pub struct Effect {
    renderer: SharedRenderer,
    program: ProgramHandle,
    error: Option<ResourceError>,
}

impl Effect {
    /// Builds a program, recording any failure instead of returning it.
    pub fn from_sources(renderer: &SharedRenderer, vertex_source: &str, fragment_source: &str) -> Self {
        let result = renderer
            .borrow_mut()
            .create_program(vertex_source, fragment_source);
        match result {
            Ok(program) => Self {
                renderer: renderer.clone(),
                program,
                error: None,
            },
            Err(error) => {
                log::error!("Effect: {error}");
                Self {
                    renderer: renderer.clone(),
                    program: ProgramHandle::EMPTY,
                    error: Some(error),
                }
            }
        }
    }

    /// Builds a program, returning the failure.
    ///
    /// Compile and link failures come back as [`ResourceError::Shader`].
    pub fn try_from_sources(
        renderer: &SharedRenderer,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ResourceError> {
        let program = renderer
            .borrow_mut()
            .create_program(vertex_source, fragment_source)?;
        Ok(Self {
            renderer: renderer.clone(),
            program,
            error: None,
        })
    }

    /// Returns `true` if the program compiled and linked.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// The compiler or linker log of a failed build, empty for a valid effect or a
    /// failure that is not a shader diagnostic.
    pub fn log(&self) -> &str {
        match &self.error {
            Some(ResourceError::Shader(error)) => error.log(),
            _ => "",
        }
    }

    /// The failure of an invalid effect.
    pub fn error(&self) -> Option<&ResourceError> {
        self.error.as_ref()
    }

    /// The program handle, [`ProgramHandle::EMPTY`] for an invalid effect.
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// Makes this effect's program current.
    pub fn bind(&self) {
        self.renderer.borrow_mut().set_program(self.program);
    }

    /// Creates a handle to one of the program's uniforms. The caller owns it.
    pub fn create_uniform(
        &self,
        name: &str,
        uniform_type: UniformType,
    ) -> Result<UniformHandle, ResourceError> {
        if !self.is_valid() {
            return Err(ResourceError::InvalidHandle);
        }
        self.renderer
            .borrow_mut()
            .create_uniform(name, uniform_type, self.program)
    }

    /// The renderer this effect was built with.
    pub fn renderer(&self) -> &SharedRenderer {
        &self.renderer
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        if !self.program.is_empty() {
            self.renderer.borrow_mut().destroy_program(self.program);
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("program", &self.program)
            .field("error", &self.error)
            .finish()
    }
}
