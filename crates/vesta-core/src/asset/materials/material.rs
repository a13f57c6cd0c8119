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

//! An effect together with its parameter values and pipeline state.

use super::parameter::MaterialParameter;
use crate::renderer::api::{BlendFactor, DepthFunction, FaceCull, PolygonMode, UniformType};
use crate::renderer::error::ResourceError;
use crate::renderer::scene::{Effect, RenderContext};
use std::rc::Rc;

/// The fixed-function state a material sets before its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialState {
    /// Which faces are culled.
    pub face_cull: FaceCull,
    /// How polygons are rasterized.
    pub polygon_mode: PolygonMode,
    /// Whether blending is enabled.
    pub blend: bool,
    /// Source blend factor.
    pub blend_src: BlendFactor,
    /// Destination blend factor.
    pub blend_dst: BlendFactor,
    /// Whether depth values are written.
    pub depth_write: bool,
    /// Whether the depth test runs.
    pub depth_test: bool,
    /// The depth comparison.
    pub depth_function: DepthFunction,
}

impl Default for MaterialState {
    fn default() -> Self {
        Self {
            face_cull: FaceCull::Back,
            polygon_mode: PolygonMode::Fill,
            blend: false,
            blend_src: BlendFactor::One,
            blend_dst: BlendFactor::Zero,
            depth_write: true,
            depth_test: true,
            depth_function: DepthFunction::Less,
        }
    }
}

impl MaterialState {
    /// Standard alpha blending without depth writes.
    pub fn alpha_blended() -> Self {
        Self {
            blend: true,
            blend_src: BlendFactor::SrcAlpha,
            blend_dst: BlendFactor::OneMinusSrcAlpha,
            depth_write: false,
            ..Self::default()
        }
    }
}

/// An [`Effect`] plus the named parameters and pipeline state it is drawn with.
pub struct Material {
    // Declared before `effect`: the uniforms go before the program.
    parameters: Vec<MaterialParameter>,
    effect: Rc<Effect>,
    state: MaterialState,
}

impl Material {
    /// A material with default state and no parameters.
    pub fn new(effect: Rc<Effect>) -> Self {
        Self {
            parameters: Vec::new(),
            effect,
            state: MaterialState::default(),
        }
    }

    /// The parameter for uniform `name`, created on first use.
    ///
    /// # Errors
    /// [`ResourceError::UniformNotFound`] when the program has no such uniform, and
    /// [`ResourceError::UniformTypeMismatch`] when the parameter already exists with
    /// another type.
    pub fn parameter(
        &mut self,
        name: &str,
        uniform_type: UniformType,
    ) -> Result<&mut MaterialParameter, ResourceError> {
        let position = match self.parameters.iter().position(|p| p.name() == name) {
            Some(position) => {
                let existing = self.parameters[position].uniform_type();
                if existing != uniform_type {
                    return Err(ResourceError::UniformTypeMismatch {
                        name: name.to_string(),
                        expected: existing,
                        found: uniform_type,
                    });
                }
                position
            }
            None => {
                let parameter = MaterialParameter::new(&self.effect, name, uniform_type)?;
                self.parameters.push(parameter);
                self.parameters.len() - 1
            }
        };
        Ok(&mut self.parameters[position])
    }

    /// Looks up an existing parameter.
    pub fn get_parameter(&self, name: &str) -> Option<&MaterialParameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    /// Drops a parameter and its uniform. Returns `false` if there was none.
    pub fn remove_parameter(&mut self, name: &str) -> bool {
        let before = self.parameters.len();
        self.parameters.retain(|p| p.name() != name);
        before != self.parameters.len()
    }

    /// The parameters in creation order.
    pub fn parameters(&self) -> &[MaterialParameter] {
        &self.parameters
    }

    /// The effect this material draws with.
    pub fn effect(&self) -> &Rc<Effect> {
        &self.effect
    }

    /// The pipeline state.
    pub fn state(&self) -> &MaterialState {
        &self.state
    }

    /// Mutable access to the pipeline state.
    pub fn state_mut(&mut self) -> &mut MaterialState {
        &mut self.state
    }

    /// Binds the program, sets the pipeline state, then writes every parameter.
    ///
    /// # Errors
    /// [`ResourceError::InvalidHandle`] if the effect failed to build.
    pub fn apply(&self, context: &RenderContext<'_>) -> Result<(), ResourceError> {
        if !self.effect.is_valid() {
            return Err(ResourceError::InvalidHandle);
        }
        self.effect.bind();
        {
            let state = &self.state;
            let mut renderer = self.effect.renderer().borrow_mut();
            renderer.set_face_cull(state.face_cull);
            renderer.set_polygon_mode(state.polygon_mode);
            renderer.set_blend(state.blend);
            if state.blend {
                renderer.set_blend_factor(state.blend_src, state.blend_dst);
            }
            renderer.set_depth_write(state.depth_write);
            renderer.set_depth_test(state.depth_test);
            renderer.set_depth_function(state.depth_function);
        }
        for parameter in &self.parameters {
            parameter.apply(context)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("effect", &self.effect)
            .field("parameters", &self.parameters)
            .field("state", &self.state)
            .finish()
    }
}
