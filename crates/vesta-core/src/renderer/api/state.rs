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

//! Immediate pipeline state.
//!
//! The renderer contract exposes this state as global setters mirroring the native
//! APIs; there are no per-object state blocks. Callers set the state they need before
//! every draw.

/// Defines how vertices are connected to form a geometric primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    /// Every three vertices form a triangle.
    #[default]
    Triangles,
    /// Each vertex after the first two forms a triangle with the previous two.
    TriangleStrip,
    /// Every two vertices form a line.
    Lines,
    /// A connected line strip.
    LineStrip,
    /// Isolated points.
    Points,
}

/// Defines which faces of a triangle are culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FaceCull {
    /// Both faces are rendered.
    None,
    /// Front faces (counter-clockwise) are culled.
    Front,
    /// Back faces are culled.
    #[default]
    Back,
}

/// Defines how polygons are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    /// Filled polygons.
    #[default]
    Fill,
    /// Outlines only.
    Wireframe,
    /// Vertices only.
    Points,
}

/// A factor in the blend equation `src * src_factor + dst * dst_factor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// `0`.
    Zero,
    /// `1`.
    One,
    /// The source colour.
    SrcColor,
    /// `1 - src`.
    OneMinusSrcColor,
    /// The source alpha.
    SrcAlpha,
    /// `1 - src.a`.
    OneMinusSrcAlpha,
    /// The destination alpha.
    DstAlpha,
    /// `1 - dst.a`.
    OneMinusDstAlpha,
    /// The destination colour.
    DstColor,
    /// `1 - dst`.
    OneMinusDstColor,
    /// `min(src.a, 1 - dst.a)`.
    SrcAlphaSaturate,
}

/// The comparison used by the depth test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthFunction {
    /// Never passes.
    Never,
    /// Passes if the fragment is closer.
    #[default]
    Less,
    /// Passes on equal depth.
    Equal,
    /// Passes if closer or equal.
    LessEqual,
    /// Passes if farther.
    Greater,
    /// Passes unless equal.
    NotEqual,
    /// Passes if farther or equal.
    GreaterEqual,
    /// Always passes.
    Always,
}

/// A viewport rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    /// Left edge.
    pub x: i32,
    /// Bottom edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// A viewport anchored at the origin.
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Which buffers a [`clear`] call resets, and to what.
///
/// [`clear`]: crate::renderer::Renderer::clear
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearRequest {
    /// The colour to clear the colour attachments to, or `None` to keep them.
    pub color: Option<[f32; 4]>,
    /// Whether to reset the depth buffer to the far plane.
    pub depth: bool,
}

impl Default for ClearRequest {
    fn default() -> Self {
        Self {
            color: Some([0.0, 0.0, 0.0, 1.0]),
            depth: true,
        }
    }
}
