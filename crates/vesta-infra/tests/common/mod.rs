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

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use vesta_core::renderer::SharedRenderer;
use vesta_infra::HeadlessRenderer;

pub const VERTEX_SHADER: &str = r#"
    #version 330 core
    in vec3 position;
    in vec3 normal;
    in vec2 texCoord0;

    uniform mat4 worldViewProjectionMatrix;
    uniform mat4 worldMatrix;

    out vec3 worldNormal;
    out vec2 uv;

    void main() {
        worldNormal = mat3(worldMatrix) * normal;
        uv = texCoord0;
        gl_Position = worldViewProjectionMatrix * vec4(position, 1.0);
    }
"#;

pub const FRAGMENT_SHADER: &str = r#"
    #version 330 core
    in vec3 worldNormal;
    in vec2 uv;

    uniform sampler2D diffuse;
    uniform sampler2D detail;
    uniform samplerCube environment;
    uniform vec4 tint;
    uniform vec3 cameraPosition;
    uniform float weights[4];

    out vec4 color;

    void main() {
        vec4 base = texture(diffuse, uv) * texture(detail, uv * 8.0);
        color = base * tint + texture(environment, worldNormal) * weights[0];
    }
"#;

/// A headless renderer, once as its concrete type for inspection and once as the
/// shared trait object the wrappers take.
pub fn headless() -> (Rc<RefCell<HeadlessRenderer>>, SharedRenderer) {
    vesta_infra::logging::init_for_tests();
    let headless = Rc::new(RefCell::new(HeadlessRenderer::default()));
    let shared: SharedRenderer = headless.clone();
    (headless, shared)
}
