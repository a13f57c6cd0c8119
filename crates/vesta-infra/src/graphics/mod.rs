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

//! Concrete renderer backends and backend selection.

pub mod gl;
pub mod headless;
mod validation;

use anyhow::{bail, Context};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use vesta_core::renderer::{RendererBackendType, RendererConfig, SharedRenderer};

pub use self::gl::GlRenderer;
pub use self::headless::HeadlessRenderer;

/// Creates the first backend of `config.preferred_backends` that can run.
///
/// The OpenGL backend needs a current context passed as `gl`; without one it is
/// skipped. The headless backend always succeeds.
pub fn create_renderer(
    config: &RendererConfig,
    mut gl: Option<glow::Context>,
) -> anyhow::Result<SharedRenderer> {
    for backend in &config.preferred_backends {
        match backend {
            RendererBackendType::OpenGl => {
                let Some(context) = gl.take() else {
                    log::warn!("No OpenGL context available, skipping the OpenGL backend");
                    continue;
                };
                match GlRenderer::new(context, config) {
                    Ok(renderer) => {
                        log::info!("Selected renderer backend: {backend:?}");
                        return Ok(Rc::new(RefCell::new(renderer)));
                    }
                    Err(e) => log::warn!("OpenGL backend failed to initialize: {e}"),
                }
            }
            RendererBackendType::Headless => {
                log::info!("Selected renderer backend: {backend:?}");
                return Ok(Rc::new(RefCell::new(HeadlessRenderer::new(config))));
            }
        }
    }
    bail!(
        "none of the preferred backends {:?} could be created",
        config.preferred_backends
    )
}

/// Reads a RON renderer configuration from disk.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<RendererConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read renderer config {}", path.display()))?;
    RendererConfig::from_ron_str(&text)
        .with_context(|| format!("Failed to parse renderer config {}", path.display()))
}
