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

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::renderer::api::{RendererBackendType, ShaderStage, UniformType};
use std::fmt;

/// An error raised while turning shader source text into a native program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// One shader stage failed to compile.
    CompileFailure {
        /// The stage that failed.
        stage: ShaderStage,
        /// The raw diagnostic log produced by the backend compiler.
        log: String,
    },
    /// Both stages compiled but the program failed to link.
    LinkFailure {
        /// The raw diagnostic log produced by the backend linker.
        log: String,
    },
}

impl ShaderError {
    /// The raw diagnostic text carried by the error.
    pub fn log(&self) -> &str {
        match self {
            ShaderError::CompileFailure { log, .. } | ShaderError::LinkFailure { log } => log,
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompileFailure { stage, log } => {
                write!(f, "Failed to compile {stage:?} shader: {log}")
            }
            ShaderError::LinkFailure { log } => write!(f, "Failed to link program: {log}"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to the creation or use of a GPU resource (buffers, textures, etc.).
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The native API refused to allocate the object.
    CreationFailure(String),
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// The requested uniform is not an active uniform of the program.
    UniformNotFound {
        /// The name that was looked up.
        name: String,
    },
    /// A value of the wrong kind was written to a uniform or material parameter.
    UniformTypeMismatch {
        /// The uniform or parameter name, when known.
        name: String,
        /// The type the slot was created with.
        expected: UniformType,
        /// The type of the value that was supplied.
        found: UniformType,
    },
    /// Framebuffer attachments do not share the same dimensions.
    AttachmentSizeMismatch {
        /// Size of the first attachment.
        expected: (u32, u32),
        /// Size of the first attachment that differed.
        found: (u32, u32),
    },
    /// A handle pool has no free slot left.
    CapacityExceeded {
        /// The resource kind stored by the pool.
        kind: &'static str,
        /// The fixed capacity of the pool.
        capacity: usize,
    },
    /// The handle is empty, stale, or refers to a different resource kind.
    InvalidHandle,
    /// An index-addressed operation was given an index outside of the valid range.
    OutOfBounds {
        /// The requested index.
        index: usize,
        /// The number of valid entries.
        len: usize,
    },
    /// The supplied payload does not match what the operation expects.
    InvalidData(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::CreationFailure(msg) => {
                write!(f, "Native resource creation failed: {msg}")
            }
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::UniformNotFound { name } => {
                write!(f, "Uniform '{name}' is not an active uniform of the program")
            }
            ResourceError::UniformTypeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "Uniform '{name}' expects a {expected:?} value but got {found:?}"
            ),
            ResourceError::AttachmentSizeMismatch { expected, found } => write!(
                f,
                "Framebuffer attachments differ in size: expected {}x{}, found {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
            ResourceError::CapacityExceeded { kind, capacity } => {
                write!(f, "The {kind} pool is full (capacity {capacity})")
            }
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle."),
            ResourceError::OutOfBounds { index, len } => {
                write!(f, "Index {index} is out of bounds (length {len})")
            }
            ResourceError::InvalidData(msg) => write!(f, "Invalid resource data: {msg}"),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

/// A high-level error raised while bringing up or running a renderer.
#[derive(Debug)]
pub enum RenderError {
    /// A failure occurred during the initialization of the graphics backend.
    InitializationFailed(String),
    /// The requested backend cannot run in this process.
    UnsupportedBackend(RendererBackendType),
    /// An error occurred while managing a GPU resource.
    Resource(ResourceError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize graphics backend: {msg}")
            }
            RenderError::UnsupportedBackend(backend) => {
                write!(f, "The {backend:?} backend is not available")
            }
            RenderError::Resource(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn shader_error_display_carries_log() {
        let err = ShaderError::CompileFailure {
            stage: ShaderStage::Fragment,
            log: "0:3: syntax error".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Failed to compile Fragment shader: 0:3: syntax error"
        );
        assert_eq!(err.log(), "0:3: syntax error");
    }

    #[test]
    fn resource_error_wraps_shader_error() {
        let res_err: ResourceError = ShaderError::LinkFailure {
            log: "varying mismatch".to_string(),
        }
        .into();
        assert_eq!(
            format!("{res_err}"),
            "Shader resource error: Failed to link program: varying mismatch"
        );
        assert!(res_err.source().is_some());
    }

    #[test]
    fn render_error_chains_to_shader_error() {
        let res_err: ResourceError = ShaderError::LinkFailure {
            log: "boom".to_string(),
        }
        .into();
        let render_err: RenderError = res_err.into();
        assert!(render_err.source().is_some());
        assert!(render_err.source().unwrap().source().is_some());
    }

    #[test]
    fn attachment_mismatch_display() {
        let err = ResourceError::AttachmentSizeMismatch {
            expected: (64, 64),
            found: (32, 64),
        };
        assert_eq!(
            format!("{err}"),
            "Framebuffer attachments differ in size: expected 64x64, found 32x64"
        );
    }
}
