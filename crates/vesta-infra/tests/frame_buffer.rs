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

use std::rc::Rc;
use vesta_core::renderer::scene::{FrameBuffer, Texture, Texture2d};
use vesta_core::renderer::{
    ClearRequest, FrameBufferHandle, Renderer, ResourceError, TextureFormat,
};

#[test]
fn attachments_must_share_a_size() {
    let (inspect, renderer) = common::headless();
    let color = Rc::new(Texture2d::render_target(&renderer, TextureFormat::Rgba, 64, 64).unwrap());
    let normals = Rc::new(Texture2d::render_target(&renderer, TextureFormat::Rgba, 32, 64).unwrap());

    let error = FrameBuffer::with_attachments(&renderer, vec![color, normals]).unwrap_err();
    assert_eq!(
        error,
        ResourceError::AttachmentSizeMismatch {
            expected: (64, 64),
            found: (32, 64),
        }
    );
    assert_eq!(
        inspect.borrow().stats().frame_buffers,
        0,
        "the failed framebuffer is released"
    );
}

#[test]
fn renderer_rejects_mismatched_attachments_and_keeps_the_old_ones() {
    let (inspect, renderer) = common::headless();
    let first = Texture2d::render_target(&renderer, TextureFormat::Rgba, 64, 64).unwrap();
    let second = Texture2d::render_target(&renderer, TextureFormat::Rgba, 32, 32).unwrap();
    let frame_buffer = renderer.borrow_mut().create_frame_buffer().unwrap();
    renderer
        .borrow_mut()
        .update_frame_buffer(frame_buffer, &[first.handle()])
        .unwrap();

    let error = renderer
        .borrow_mut()
        .update_frame_buffer(frame_buffer, &[first.handle(), second.handle()])
        .unwrap_err();
    assert_eq!(
        error,
        ResourceError::AttachmentSizeMismatch {
            expected: (64, 64),
            found: (32, 32),
        }
    );
    assert_eq!(renderer.borrow().frame_buffer_size(frame_buffer), Some((64, 64)));
    assert_eq!(
        inspect.borrow().frame_buffer_attachments(frame_buffer).unwrap(),
        &[first.handle()]
    );

    renderer.borrow_mut().destroy_frame_buffer(frame_buffer);
}

#[test]
fn framebuffer_takes_the_size_of_its_attachments() {
    let (inspect, renderer) = common::headless();
    let color = Rc::new(Texture2d::render_target(&renderer, TextureFormat::Rgba, 64, 64).unwrap());
    let emissive =
        Rc::new(Texture2d::render_target(&renderer, TextureFormat::Rgba32Float, 64, 64).unwrap());

    let frame_buffer =
        FrameBuffer::with_attachments(&renderer, vec![color.clone(), emissive.clone()]).unwrap();
    assert_eq!(frame_buffer.size(), (64, 64));
    assert_eq!(
        inspect
            .borrow()
            .frame_buffer_attachments(frame_buffer.handle())
            .unwrap(),
        &[color.handle(), emissive.handle()]
    );
}

#[test]
fn failed_update_keeps_previous_attachments() {
    let (_, renderer) = common::headless();
    let small = Rc::new(Texture2d::render_target(&renderer, TextureFormat::Rgb, 16, 16).unwrap());
    let large = Rc::new(Texture2d::render_target(&renderer, TextureFormat::Rgb, 32, 32).unwrap());

    let mut frame_buffer = FrameBuffer::with_attachments(&renderer, vec![small.clone()]).unwrap();
    assert!(frame_buffer
        .set_attachments(vec![small.clone(), large])
        .is_err());
    assert_eq!(frame_buffer.size(), (16, 16));
    assert_eq!(frame_buffer.attachments().len(), 1);
    assert_eq!(Rc::strong_count(&small), 2);
}

#[test]
fn attachments_outlive_their_owners_while_attached() {
    let (inspect, renderer) = common::headless();
    let frame_buffer = {
        let target = Rc::new(Texture2d::render_target(&renderer, TextureFormat::Rgba, 8, 8).unwrap());
        FrameBuffer::with_attachments(&renderer, vec![target]).unwrap()
    };
    assert_eq!(inspect.borrow().stats().textures, 1);
    drop(frame_buffer);
    assert_eq!(inspect.borrow().stats().live_resources(), 0);
}

#[test]
fn clears_go_to_the_bound_target() {
    let (inspect, renderer) = common::headless();
    let target = Rc::new(Texture2d::render_target(&renderer, TextureFormat::Rgba, 4, 4).unwrap());
    let frame_buffer = FrameBuffer::with_attachments(&renderer, vec![target]).unwrap();

    frame_buffer.bind();
    renderer.borrow_mut().clear(&ClearRequest::default());
    frame_buffer.unbind();
    renderer.borrow_mut().clear(&ClearRequest {
        color: None,
        depth: true,
    });

    let inspect = inspect.borrow();
    let targets: Vec<FrameBufferHandle> = inspect.clears().iter().map(|(fb, _)| *fb).collect();
    assert_eq!(targets, vec![frame_buffer.handle(), FrameBufferHandle::EMPTY]);
}
