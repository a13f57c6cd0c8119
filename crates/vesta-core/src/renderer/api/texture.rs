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

//! Texture formats, cube faces and sampling state.

use serde::{Deserialize, Serialize};

/// Defines the memory format of pixels uploaded to a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// One 8-bit channel.
    Red,
    /// Three 8-bit channels.
    Rgb,
    /// Four 8-bit channels.
    Rgba,
    /// Four 32-bit float channels, for render targets that need range.
    Rgba32Float,
}

impl TextureFormat {
    /// Returns the size in bytes of a single pixel for this format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::Red => 1,
            TextureFormat::Rgb => 3,
            TextureFormat::Rgba => 4,
            TextureFormat::Rgba32Float => 16,
        }
    }

    /// Number of bytes a `width` x `height` image of this format occupies.
    pub fn image_size(&self, width: u32, height: u32) -> usize {
        self.bytes_per_pixel() as usize * width as usize * height as usize
    }
}

/// What a texture handle has been initialised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureKind {
    /// Created but not yet given any image.
    #[default]
    Uninitialized,
    /// A single 2D image.
    Texture2d,
    /// Six square images forming a cube map.
    Cube,
}

/// The six faces of a cube texture, in native upload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    /// +X.
    Right,
    /// -X.
    Left,
    /// +Y.
    Top,
    /// -Y.
    Bottom,
    /// +Z.
    Front,
    /// -Z.
    Back,
}

impl CubeFace {
    /// All faces in upload order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Right,
        CubeFace::Left,
        CubeFace::Top,
        CubeFace::Bottom,
        CubeFace::Front,
        CubeFace::Back,
    ];

    /// Position of the face in [`CubeFace::ALL`].
    pub fn index(&self) -> u32 {
        match self {
            CubeFace::Right => 0,
            CubeFace::Left => 1,
            CubeFace::Top => 2,
            CubeFace::Bottom => 3,
            CubeFace::Front => 4,
            CubeFace::Back => 5,
        }
    }
}

/// Texel filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFilter {
    /// Nearest texel.
    Nearest,
    /// Bilinear.
    Linear,
    /// Bilinear within the nearest mip level.
    LinearMipmapNearest,
    /// Trilinear.
    LinearMipmapLinear,
}

/// Behaviour of texture coordinates outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureWrap {
    /// Clamp to the edge texel.
    ClampToEdge,
    /// Tile.
    Repeat,
    /// Tile, mirroring every other repetition.
    MirroredRepeat,
}

/// Sampling state applied when a texture is bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureSampling {
    /// Minification filter.
    pub min_filter: TextureFilter,
    /// Magnification filter.
    pub mag_filter: TextureFilter,
    /// Wrapping along U.
    pub wrap_u: TextureWrap,
    /// Wrapping along V.
    pub wrap_v: TextureWrap,
    /// Wrapping along W (cube textures only).
    pub wrap_w: TextureWrap,
    /// Maximum anisotropy; `1.0` disables anisotropic filtering.
    pub anisotropy: f32,
    /// Regenerate the mip chain when the sampling state is applied.
    pub generate_mipmaps: bool,
}

impl Default for TextureSampling {
    fn default() -> Self {
        Self {
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            wrap_u: TextureWrap::ClampToEdge,
            wrap_v: TextureWrap::ClampToEdge,
            wrap_w: TextureWrap::ClampToEdge,
            anisotropy: 1.0,
            generate_mipmaps: false,
        }
    }
}

impl TextureSampling {
    /// Returns `true` if the minification filter reads from the mip chain.
    pub fn uses_mipmaps(&self) -> bool {
        matches!(
            self.min_filter,
            TextureFilter::LinearMipmapNearest | TextureFilter::LinearMipmapLinear
        )
    }
}
