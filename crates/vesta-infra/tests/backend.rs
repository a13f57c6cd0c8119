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

mod common;

use common::{headless, FRAGMENT_SHADER, VERTEX_SHADER};
use std::rc::Rc;
use vesta_core::asset::Material;
use vesta_core::renderer::scene::{Effect, Mesh, MeshPrefab, RenderContext};
use vesta_core::renderer::{
    Renderer, RendererBackendType, RendererConfig, ResourceError, ShaderError, ShaderStage,
    UniformType,
};
use vesta_infra::{create_renderer, load_config};

#[test]
fn headless_is_chosen_when_no_context_exists() {
    let renderer = create_renderer(&RendererConfig::default(), None).unwrap();
    assert_eq!(
        renderer.borrow().backend_type(),
        RendererBackendType::Headless
    );
}

#[test]
fn selection_fails_when_nothing_can_run() {
    let config = RendererConfig {
        preferred_backends: vec![RendererBackendType::OpenGl],
        ..RendererConfig::default()
    };
    assert!(create_renderer(&config, None).is_err());
}

#[test]
fn config_is_read_from_ron() {
    let path = std::env::temp_dir().join(format!("vesta-renderer-{}.ron", std::process::id()));
    std::fs::write(
        &path,
        "(preferred_backends: [Headless], limits: (programs: 1), viewport: Some((320, 240)))",
    )
    .unwrap();
    let config = load_config(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.limits.programs, 1);
    let renderer = create_renderer(&config, None).unwrap();
    let _first = Effect::try_from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER).unwrap();
    assert!(matches!(
        Effect::try_from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER),
        Err(ResourceError::CapacityExceeded { kind: "program", .. })
    ));

    let missing = load_config(std::env::temp_dir().join("vesta-no-such-config.ron"));
    assert!(format!("{:#}", missing.unwrap_err()).contains("Failed to read renderer config"));
}

#[test]
fn compile_failure_keeps_the_log() {
    let (_, renderer) = headless();
    let effect = Effect::from_sources(&renderer, VERTEX_SHADER, "out vec4 color;");
    assert!(!effect.is_valid());
    assert!(effect.program().is_empty());
    assert!(effect.log().contains("main"));
    assert!(matches!(
        effect.error(),
        Some(ResourceError::Shader(ShaderError::CompileFailure {
            stage: ShaderStage::Fragment,
            ..
        }))
    ));
}

#[test]
fn link_failure_is_reported() {
    let (_, renderer) = headless();
    let fragment = "in vec3 viewDirection; out vec4 color; void main() { color = vec4(viewDirection, 1.0); }";
    let error = Effect::try_from_sources(&renderer, VERTEX_SHADER, fragment).unwrap_err();
    match error {
        ResourceError::Shader(ShaderError::LinkFailure { log }) => {
            assert!(log.contains("viewDirection"))
        }
        other => panic!("expected a link failure, got {other:?}"),
    }
}

#[test]
fn valid_effect_has_an_empty_log() {
    let (_, renderer) = headless();
    let effect = Effect::from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER);
    assert!(effect.is_valid());
    assert_eq!(effect.log(), "");
    assert!(effect.error().is_none());
}

#[test]
fn every_wrapper_releases_what_it_created() {
    let (inspect, renderer) = headless();
    {
        let effect = Rc::new(Effect::from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER));
        let mut material = Material::new(effect.clone());
        material
            .parameter("tint", UniformType::Vector4)
            .unwrap()
            .set_value(glam::Vec4::ONE)
            .unwrap();
        let mut mesh = Mesh::from_prefab(&renderer, MeshPrefab::Cube).unwrap();

        material.apply(&RenderContext::new()).unwrap();
        mesh.draw(effect.program()).unwrap();

        let stats = inspect.borrow().stats();
        assert_eq!(stats.programs, 1);
        assert_eq!(stats.uniforms, 1);
        assert_eq!(stats.vertex_bindings, 1);
        assert_eq!(stats.live_resources(), 7);
    }
    let stats = inspect.borrow().stats();
    assert_eq!(stats.live_resources(), 0);
    assert_eq!(stats.draw_calls, 1);
}
