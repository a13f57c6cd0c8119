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

//! Payload checks shared by every backend.

use vesta_core::renderer::{ResourceError, TextureFormat, VertexBufferLayout};

/// Checks that pixel data covers the whole image.
pub(crate) fn check_image_data(
    format: TextureFormat,
    width: u32,
    height: u32,
    data: Option<&[u8]>,
) -> Result<(), ResourceError> {
    if width == 0 || height == 0 {
        return Err(ResourceError::InvalidData(format!(
            "texture size {width}x{height} is empty"
        )));
    }
    match data {
        Some(data) if data.len() < format.image_size(width, height) => {
            Err(ResourceError::InvalidData(format!(
                "{} bytes given for a {width}x{height} {format:?} image of {} bytes",
                data.len(),
                format.image_size(width, height)
            )))
        }
        _ => Ok(()),
    }
}

/// Checks that every attribute of `layout` has 1 to 4 components.
pub(crate) fn check_vertex_layout(layout: &VertexBufferLayout) -> Result<(), ResourceError> {
    match layout
        .attributes()
        .iter()
        .find(|attribute| !(1..=4).contains(&attribute.components))
    {
        Some(attribute) => Err(ResourceError::InvalidData(format!(
            "attribute '{}' has {} components, expected 1 to 4",
            attribute.input_name(),
            attribute.components
        ))),
        None => Ok(()),
    }
}

/// Checks that vertex data holds `vertex_count` vertices of `layout`.
pub(crate) fn check_vertex_data(
    layout: &VertexBufferLayout,
    data: &[f32],
    vertex_count: u32,
) -> Result<(), ResourceError> {
    let needed = layout.floats_per_vertex() * vertex_count as usize;
    if data.len() < needed {
        return Err(ResourceError::InvalidData(format!(
            "{} floats given for {vertex_count} vertices of {} floats",
            data.len(),
            layout.floats_per_vertex()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesta_core::renderer::VertexAttributeSemantic;

    #[test]
    fn image_data_may_be_absent_but_not_short() {
        assert!(check_image_data(TextureFormat::Rgb, 4, 4, None).is_ok());
        assert!(check_image_data(TextureFormat::Rgb, 4, 4, Some(&[0; 48])).is_ok());
        assert!(check_image_data(TextureFormat::Rgb, 4, 4, Some(&[0; 47])).is_err());
        assert!(check_image_data(TextureFormat::Rgb, 0, 4, None).is_err());
    }

    #[test]
    fn vertex_data_must_cover_every_vertex() {
        let layout = VertexBufferLayout::new()
            .with(VertexAttributeSemantic::Position, 3)
            .with(VertexAttributeSemantic::TexCoord0, 2);
        assert!(check_vertex_data(&layout, &[0.0; 15], 3).is_ok());
        assert!(check_vertex_data(&layout, &[0.0; 14], 3).is_err());
    }

    #[test]
    fn attributes_need_one_to_four_components() {
        let layout = VertexBufferLayout::new()
            .with(VertexAttributeSemantic::Position, 3)
            .with(VertexAttributeSemantic::Color, 4);
        assert!(check_vertex_layout(&layout).is_ok());

        let empty = VertexBufferLayout::new().with(VertexAttributeSemantic::Normal, 0);
        assert!(matches!(
            check_vertex_layout(&empty),
            Err(ResourceError::InvalidData(_))
        ));
        let wide = VertexBufferLayout::new().with(VertexAttributeSemantic::Position, 5);
        assert!(check_vertex_layout(&wide).is_err());
    }
}
