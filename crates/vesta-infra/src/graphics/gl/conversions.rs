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

//! Mappings from the renderer contract's value types to OpenGL enums.

use vesta_core::renderer::reflection::SamplerKind;
use vesta_core::renderer::{
    BlendFactor, CubeFace, DepthFunction, FaceCull, PolygonMode, PrimitiveType, TextureFilter,
    TextureFormat, TextureWrap, UniformType,
};

/// `GL_LUMINANCE`, the single-channel format of OpenGL ES 2.0.
const LUMINANCE: u32 = 0x1909;

/// A local extension trait converting contract types into OpenGL enums, so call sites
/// read `.into_gl()` without tripping the orphan rules.
pub trait IntoGl<T> {
    /// Consumes self and converts it into its OpenGL counterpart.
    fn into_gl(self) -> T;
}

impl IntoGl<u32> for PrimitiveType {
    fn into_gl(self) -> u32 {
        match self {
            PrimitiveType::Triangles => glow::TRIANGLES,
            PrimitiveType::TriangleStrip => glow::TRIANGLE_STRIP,
            PrimitiveType::Lines => glow::LINES,
            PrimitiveType::LineStrip => glow::LINE_STRIP,
            PrimitiveType::Points => glow::POINTS,
        }
    }
}

/// `None` disables face culling.
impl IntoGl<Option<u32>> for FaceCull {
    fn into_gl(self) -> Option<u32> {
        match self {
            FaceCull::None => None,
            FaceCull::Front => Some(glow::FRONT),
            FaceCull::Back => Some(glow::BACK),
        }
    }
}

impl IntoGl<u32> for PolygonMode {
    fn into_gl(self) -> u32 {
        match self {
            PolygonMode::Fill => glow::FILL,
            PolygonMode::Wireframe => glow::LINE,
            PolygonMode::Points => glow::POINT,
        }
    }
}

impl IntoGl<u32> for BlendFactor {
    fn into_gl(self) -> u32 {
        match self {
            BlendFactor::Zero => glow::ZERO,
            BlendFactor::One => glow::ONE,
            BlendFactor::SrcColor => glow::SRC_COLOR,
            BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
            BlendFactor::SrcAlpha => glow::SRC_ALPHA,
            BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
            BlendFactor::DstAlpha => glow::DST_ALPHA,
            BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
            BlendFactor::DstColor => glow::DST_COLOR,
            BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
            BlendFactor::SrcAlphaSaturate => glow::SRC_ALPHA_SATURATE,
        }
    }
}

impl IntoGl<u32> for DepthFunction {
    fn into_gl(self) -> u32 {
        match self {
            DepthFunction::Never => glow::NEVER,
            DepthFunction::Less => glow::LESS,
            DepthFunction::Equal => glow::EQUAL,
            DepthFunction::LessEqual => glow::LEQUAL,
            DepthFunction::Greater => glow::GREATER,
            DepthFunction::NotEqual => glow::NOTEQUAL,
            DepthFunction::GreaterEqual => glow::GEQUAL,
            DepthFunction::Always => glow::ALWAYS,
        }
    }
}

impl IntoGl<i32> for TextureFilter {
    fn into_gl(self) -> i32 {
        (match self {
            TextureFilter::Nearest => glow::NEAREST,
            TextureFilter::Linear => glow::LINEAR,
            TextureFilter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
            TextureFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
        }) as i32
    }
}

impl IntoGl<i32> for TextureWrap {
    fn into_gl(self) -> i32 {
        (match self {
            TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
            TextureWrap::Repeat => glow::REPEAT,
            TextureWrap::MirroredRepeat => glow::MIRRORED_REPEAT,
        }) as i32
    }
}

/// The upload target of a cube face.
impl IntoGl<u32> for CubeFace {
    fn into_gl(self) -> u32 {
        glow::TEXTURE_CUBE_MAP_POSITIVE_X + self.index()
    }
}

/// The three enums a `glTexImage2D` call needs for one pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlTextureFormat {
    pub internal_format: i32,
    pub format: u32,
    pub data_type: u32,
}

/// Maps a pixel format for upload. `sized` selects sized internal formats, which
/// OpenGL ES 2.0 does not accept.
pub fn texture_format(format: TextureFormat, sized: bool) -> GlTextureFormat {
    let (sized_internal, unsized_format, data_type) = match format {
        TextureFormat::Red => (glow::R8, glow::RED, glow::UNSIGNED_BYTE),
        TextureFormat::Rgb => (glow::RGB8, glow::RGB, glow::UNSIGNED_BYTE),
        TextureFormat::Rgba => (glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
        TextureFormat::Rgba32Float => (glow::RGBA32F, glow::RGBA, glow::FLOAT),
    };
    if sized {
        GlTextureFormat {
            internal_format: sized_internal as i32,
            format: unsized_format,
            data_type,
        }
    } else {
        let format = match format {
            TextureFormat::Red => LUMINANCE,
            _ => unsized_format,
        };
        GlTextureFormat {
            internal_format: format as i32,
            format,
            data_type,
        }
    }
}

/// Maps the type reported by `glGetActiveUniform`. Types values cannot be written to
/// map to `None`.
pub fn uniform_type(gl_type: u32, array_size: u32) -> Option<UniformType> {
    let base = match gl_type {
        glow::FLOAT => UniformType::Float,
        glow::FLOAT_VEC2 => UniformType::Vector2,
        glow::FLOAT_VEC3 => UniformType::Vector3,
        glow::FLOAT_VEC4 => UniformType::Vector4,
        glow::FLOAT_MAT4 => UniformType::Matrix,
        glow::SAMPLER_2D | glow::SAMPLER_CUBE => UniformType::Texture,
        _ => return None,
    };
    Some(base.with_array_size(array_size))
}

pub fn sampler_kind(gl_type: u32) -> Option<SamplerKind> {
    match gl_type {
        glow::SAMPLER_2D => Some(SamplerKind::Texture2d),
        glow::SAMPLER_CUBE => Some(SamplerKind::Cube),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_faces_follow_native_order() {
        assert_eq!(CubeFace::Right.into_gl(), glow::TEXTURE_CUBE_MAP_POSITIVE_X);
        assert_eq!(CubeFace::Left.into_gl(), glow::TEXTURE_CUBE_MAP_NEGATIVE_X);
        assert_eq!(CubeFace::Bottom.into_gl(), glow::TEXTURE_CUBE_MAP_NEGATIVE_Y);
        assert_eq!(CubeFace::Back.into_gl(), glow::TEXTURE_CUBE_MAP_NEGATIVE_Z);
    }

    #[test]
    fn legacy_contexts_use_unsized_formats() {
        let red = texture_format(TextureFormat::Red, false);
        assert_eq!(red.internal_format, LUMINANCE as i32);
        assert_eq!(red.format, LUMINANCE);

        let float = texture_format(TextureFormat::Rgba32Float, true);
        assert_eq!(float.internal_format, glow::RGBA32F as i32);
        assert_eq!(float.data_type, glow::FLOAT);
    }

    #[test]
    fn reflected_arrays_promote_their_type() {
        assert_eq!(
            uniform_type(glow::FLOAT_VEC3, 4),
            Some(UniformType::Vector3Array)
        );
        assert_eq!(uniform_type(glow::FLOAT_MAT3, 1), None);
        assert_eq!(sampler_kind(glow::SAMPLER_CUBE), Some(SamplerKind::Cube));
        assert_eq!(FaceCull::None.into_gl(), None);
    }
}
