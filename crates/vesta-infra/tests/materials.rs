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

use approx::assert_relative_eq;
use common::{headless, FRAGMENT_SHADER, VERTEX_SHADER};
use glam::{Mat4, Quat, Vec3, Vec4};
use std::rc::Rc;
use vesta_core::asset::{AutoBinding, Material, MaterialState};
use vesta_core::renderer::scene::{
    Camera, CubeTexture, Effect, RenderContext, Texture, Texture2d,
};
use vesta_core::renderer::{
    BlendFactor, CameraView, FaceCull, ResourceError, TextureFilter, TextureFormat,
    TextureSampling, UniformType,
};
use vesta_infra::graphics::headless::RecordedUniform;

fn recorded_matrix(recorded: Option<&RecordedUniform>) -> Mat4 {
    match recorded {
        Some(RecordedUniform::Floats(floats)) => Mat4::from_cols_slice(floats),
        other => panic!("expected a matrix, got {other:?}"),
    }
}

#[test]
fn unknown_uniform_is_reported() {
    let (_, renderer) = headless();
    let effect = Rc::new(Effect::from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER));
    let mut material = Material::new(effect);

    let error = material.parameter("specularPower", UniformType::Float).unwrap_err();
    assert_eq!(
        error,
        ResourceError::UniformNotFound {
            name: "specularPower".to_string()
        }
    );
    assert!(material.parameters().is_empty());
}

#[test]
fn parameter_type_must_match_the_declaration() {
    let (_, renderer) = headless();
    let effect = Rc::new(Effect::from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER));
    let mut material = Material::new(effect);

    assert!(matches!(
        material.parameter("tint", UniformType::Vector3),
        Err(ResourceError::UniformTypeMismatch { .. })
    ));

    let tint = material.parameter("tint", UniformType::Vector4).unwrap();
    assert!(tint.set_value(1.0f32).is_err());
    tint.set_value(Vec4::new(1.0, 0.5, 0.25, 1.0)).unwrap();
    assert!(matches!(
        material.parameter("tint", UniformType::Float),
        Err(ResourceError::UniformTypeMismatch { .. })
    ));
}

#[test]
fn samplers_get_distinct_texture_units() {
    let (inspect, renderer) = headless();
    let effect = Rc::new(Effect::from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER));
    let mut material = Material::new(effect);

    let diffuse = Rc::new(Texture2d::new(&renderer, TextureFormat::Rgba, 2, 2, Some(&[255; 16])).unwrap());
    let detail = Rc::new(Texture2d::new(&renderer, TextureFormat::Red, 4, 4, Some(&[128; 16])).unwrap());
    let environment = Rc::new(CubeTexture::new(&renderer, TextureFormat::Rgb, 8).unwrap());

    material
        .parameter("diffuse", UniformType::Texture)
        .unwrap()
        .set_value(diffuse.clone())
        .unwrap();
    material
        .parameter("detail", UniformType::Texture)
        .unwrap()
        .set_value(detail.clone())
        .unwrap();
    material
        .parameter("environment", UniformType::Texture)
        .unwrap()
        .set_value(environment.clone())
        .unwrap();
    material.apply(&RenderContext::new()).unwrap();

    let inspect = inspect.borrow();
    let mut units: Vec<u32> = material
        .parameters()
        .iter()
        .map(|p| match inspect.uniform_value(p.uniform()) {
            Some(RecordedUniform::Texture { unit, .. }) => *unit,
            other => panic!("expected a texture, got {other:?}"),
        })
        .collect();
    units.sort_unstable();
    units.dedup();
    assert_eq!(units.len(), 3);
}

#[test]
fn flushing_sampling_keeps_earlier_sampler_bindings() {
    let (inspect, renderer) = headless();
    let effect = Rc::new(Effect::from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER));
    let mut material = Material::new(effect);

    let diffuse = Rc::new(Texture2d::new(&renderer, TextureFormat::Rgba, 2, 2, Some(&[255; 16])).unwrap());
    let detail = Rc::new(Texture2d::new(&renderer, TextureFormat::Red, 4, 4, Some(&[128; 16])).unwrap());
    let diffuse_uniform = {
        let parameter = material.parameter("diffuse", UniformType::Texture).unwrap();
        parameter.set_value(diffuse.clone()).unwrap();
        parameter.uniform()
    };
    let detail_uniform = {
        let parameter = material.parameter("detail", UniformType::Texture).unwrap();
        parameter.set_value(detail.clone()).unwrap();
        parameter.uniform()
    };

    // Both textures still carry their initial sampling, so each flushes it on bind.
    material.apply(&RenderContext::new()).unwrap();

    let inspect = inspect.borrow();
    let diffuse_unit = inspect.uniform_texture_unit(diffuse_uniform).unwrap();
    let detail_unit = inspect.uniform_texture_unit(detail_uniform).unwrap();
    assert_ne!(diffuse_unit, detail_unit);
    assert_eq!(inspect.bound_texture(diffuse_unit), Some(diffuse.handle()));
    assert_eq!(inspect.bound_texture(detail_unit), Some(detail.handle()));
    assert!(inspect.texture_sampling(diffuse.handle()).is_some());
    assert!(inspect.texture_sampling(detail.handle()).is_some());
}

#[test]
fn texture_sampling_is_applied_on_bind() {
    let (inspect, renderer) = headless();
    let effect = Rc::new(Effect::from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER));
    let mut material = Material::new(effect);

    let mut texture = Texture2d::new(&renderer, TextureFormat::Rgba, 1, 1, Some(&[0; 4])).unwrap();
    let sampling = TextureSampling {
        min_filter: TextureFilter::Nearest,
        ..TextureSampling::default()
    };
    texture.set_sampling(sampling);
    let handle = texture.handle();
    let texture = Rc::new(texture);

    material
        .parameter("diffuse", UniformType::Texture)
        .unwrap()
        .set_value(texture)
        .unwrap();
    assert_eq!(inspect.borrow().texture_sampling(handle), None);

    material.apply(&RenderContext::new()).unwrap();
    assert_eq!(inspect.borrow().texture_sampling(handle), Some(sampling));
}

#[test]
fn world_view_projection_follows_camera_and_node() {
    let (inspect, renderer) = headless();
    let effect = Rc::new(Effect::from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER));
    let mut material = Material::new(effect);
    material
        .parameter("worldViewProjectionMatrix", UniformType::Matrix)
        .unwrap()
        .set_auto_binding(AutoBinding::WorldViewProjectionMatrix)
        .unwrap();
    let uniform = material.parameters()[0].uniform();

    let mut camera = Camera::perspective(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
    let camera_world = Mat4::from_translation(Vec3::new(0.0, 2.0, 10.0));
    camera.set_world_transform(camera_world);
    let projection = camera.projection_matrix();
    let view = camera_world.inverse();

    let parent = Mat4::from_rotation_translation(
        Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        Vec3::new(5.0, 0.0, 0.0),
    );
    let child = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
    let nodes = [
        Mat4::IDENTITY,
        Mat4::from_translation(Vec3::new(1.0, -2.0, 3.0)),
        Mat4::from_quat(Quat::from_rotation_x(0.7)),
        parent * child,
    ];

    for world in &nodes {
        let context = RenderContext::new()
            .with_camera(&camera, &camera_world)
            .with_node(world);
        material.apply(&context).unwrap();

        let written = recorded_matrix(inspect.borrow().uniform_value(uniform));
        assert_relative_eq!(written, projection * view * *world, epsilon = 1e-4);
    }
}

#[test]
fn auto_binding_without_context_is_skipped() {
    let (inspect, renderer) = headless();
    let effect = Rc::new(Effect::from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER));
    let mut material = Material::new(effect);
    let parameter = material
        .parameter("cameraPosition", UniformType::Vector3)
        .unwrap();
    assert!(parameter.set_auto_binding(AutoBinding::WorldMatrix).is_err());
    parameter
        .set_auto_binding(AutoBinding::CameraWorldPosition)
        .unwrap();
    let uniform = parameter.uniform();

    material.apply(&RenderContext::new()).unwrap();
    assert!(inspect.borrow().uniform_value(uniform).is_none());

    let camera = Camera::orthographic(4.0, 3.0, 0.1, 10.0);
    let camera_world = Mat4::from_translation(Vec3::new(3.0, 4.0, 5.0));
    material
        .apply(&RenderContext::new().with_camera(&camera, &camera_world))
        .unwrap();
    assert_eq!(
        inspect.borrow().uniform_value(uniform),
        Some(&RecordedUniform::Floats(vec![3.0, 4.0, 5.0]))
    );
}

#[test]
fn array_parameters_write_every_element() {
    let (inspect, renderer) = headless();
    let effect = Rc::new(Effect::from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER));
    let mut material = Material::new(effect);
    let weights = material
        .parameter("weights", UniformType::FloatArray)
        .unwrap();
    weights
        .set_value(vec![0.5f32, 0.25, 0.125, 0.0625])
        .unwrap();
    let uniform = weights.uniform();

    material.apply(&RenderContext::new()).unwrap();
    assert_eq!(
        inspect.borrow().uniform_value(uniform),
        Some(&RecordedUniform::Floats(vec![0.5, 0.25, 0.125, 0.0625]))
    );
}

#[test]
fn apply_sets_program_and_pipeline_state() {
    let (inspect, renderer) = headless();
    let effect = Rc::new(Effect::from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER));
    let mut material = Material::new(effect.clone());
    *material.state_mut() = MaterialState {
        face_cull: FaceCull::None,
        ..MaterialState::alpha_blended()
    };
    material.apply(&RenderContext::new()).unwrap();

    let inspect = inspect.borrow();
    let state = inspect.pipeline_state();
    assert_eq!(state.program, effect.program());
    assert_eq!(state.face_cull, FaceCull::None);
    assert!(state.blend);
    assert_eq!(
        state.blend_factors,
        (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)
    );
    assert!(!state.depth_write);
}

#[test]
fn setting_a_uniform_of_another_program_fails() {
    let (_, renderer) = headless();
    let first = Rc::new(Effect::from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER));
    let second = Effect::from_sources(&renderer, VERTEX_SHADER, FRAGMENT_SHADER);
    let mut material = Material::new(first);
    material
        .parameter("tint", UniformType::Vector4)
        .unwrap()
        .set_value(Vec4::ONE)
        .unwrap();

    second.bind();
    let error = material.parameters()[0]
        .apply(&RenderContext::new())
        .unwrap_err();
    assert!(matches!(error, ResourceError::InvalidData(_)));

    material.apply(&RenderContext::new()).unwrap();
}

#[test]
fn invalid_effect_cannot_be_applied() {
    let (_, renderer) = headless();
    let effect = Rc::new(Effect::from_sources(&renderer, "void broken() {}", FRAGMENT_SHADER));
    assert!(!effect.is_valid());
    let mut material = Material::new(effect);
    assert_eq!(
        material.parameter("tint", UniformType::Vector4).unwrap_err(),
        ResourceError::InvalidHandle
    );
    assert_eq!(
        material.apply(&RenderContext::new()),
        Err(ResourceError::InvalidHandle)
    );
}
