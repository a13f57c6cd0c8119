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

//! A declaration-level GLSL scanner.
//!
//! The headless backend has no compiler, so it reflects programs by reading the
//! top-level `in`/`attribute`, `out`/`varying` and `uniform` declarations of each
//! stage. Both the GLSL 1.x (`attribute`/`varying`) and 3.x (`in`/`out`, optional
//! `layout(location = N)`) spellings are understood. Uniform blocks and struct
//! uniforms are not reported.

use vesta_core::renderer::reflection::SamplerKind;
use vesta_core::renderer::{ShaderStage, UniformType};

/// Qualifiers that may surround the storage qualifier and carry no reflection data.
const IGNORED_QUALIFIERS: &[&str] = &[
    "highp",
    "mediump",
    "lowp",
    "flat",
    "smooth",
    "noperspective",
    "centroid",
    "invariant",
];

/// One declared variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub glsl_type: String,
    /// 1 for non-arrays.
    pub array_size: u32,
    pub location: Option<u32>,
}

impl Declaration {
    /// The uniform type values of this declaration have, if it is writable.
    pub fn value_type(&self) -> Option<UniformType> {
        let base = match self.glsl_type.as_str() {
            "float" => UniformType::Float,
            "vec2" => UniformType::Vector2,
            "vec3" => UniformType::Vector3,
            "vec4" => UniformType::Vector4,
            "mat4" => UniformType::Matrix,
            "sampler2D" | "samplerCube" => UniformType::Texture,
            _ => return None,
        };
        Some(base.with_array_size(self.array_size))
    }

    pub fn sampler(&self) -> Option<SamplerKind> {
        match self.glsl_type.as_str() {
            "sampler2D" => Some(SamplerKind::Texture2d),
            "samplerCube" => Some(SamplerKind::Cube),
            _ => None,
        }
    }
}

/// What one shader stage declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageInterface {
    pub inputs: Vec<Declaration>,
    pub outputs: Vec<Declaration>,
    pub uniforms: Vec<Declaration>,
    pub has_entry_point: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Input,
    Output,
    Uniform,
}

/// Scans the top-level declarations of one stage.
pub fn scan(source: &str, stage: ShaderStage) -> StageInterface {
    let code: String = strip_comments(source)
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    let mut interface = StageInterface {
        has_entry_point: has_entry_point(&code),
        ..StageInterface::default()
    };

    for statement in code.split(';') {
        // Only the text after the last brace can be a top-level declaration.
        let statement = statement
            .rsplit(['{', '}'])
            .next()
            .unwrap_or_default()
            .trim();
        let Some((storage, declarations)) = parse_statement(statement, stage) else {
            continue;
        };
        let target = match storage {
            Storage::Input => &mut interface.inputs,
            Storage::Output => &mut interface.outputs,
            Storage::Uniform => &mut interface.uniforms,
        };
        target.extend(declarations);
    }
    interface
}

fn parse_statement(statement: &str, stage: ShaderStage) -> Option<(Storage, Vec<Declaration>)> {
    let mut rest = statement;
    let mut location = None;
    if let Some(after) = rest.strip_prefix("layout") {
        let inner = after.trim_start().strip_prefix('(')?;
        let close = inner.find(')')?;
        location = parse_location(&inner[..close]);
        rest = &inner[close + 1..];
    }

    let mut tokens = rest
        .split_whitespace()
        .filter(|token| !IGNORED_QUALIFIERS.contains(token));
    let storage = match (tokens.next()?, stage) {
        ("uniform", _) => Storage::Uniform,
        ("in", _) => Storage::Input,
        ("attribute", ShaderStage::Vertex) => Storage::Input,
        ("varying", ShaderStage::Vertex) => Storage::Output,
        ("varying", ShaderStage::Fragment) => Storage::Input,
        ("out", _) => Storage::Output,
        _ => return None,
    };
    let glsl_type = tokens.next()?.to_string();
    if !is_builtin_type(&glsl_type) {
        return None;
    }
    let declarators = tokens.collect::<Vec<_>>().join(" ");

    let declarations = declarators
        .split(',')
        .filter_map(|declarator| parse_declarator(declarator, &glsl_type, location))
        .collect::<Vec<_>>();
    (!declarations.is_empty()).then_some((storage, declarations))
}

/// Built-in GLSL types. Anything else names a user-declared struct.
fn is_builtin_type(glsl_type: &str) -> bool {
    const SCALARS: &[&str] = &["float", "double", "int", "uint", "bool"];
    const SHAPED: &[&str] = &["vec", "ivec", "uvec", "bvec", "dvec", "mat", "dmat"];
    const SAMPLERS: &[&str] = &["sampler", "isampler", "usampler"];

    if SCALARS.contains(&glsl_type) {
        return true;
    }
    if let Some(shape) = SHAPED.iter().find_map(|prefix| glsl_type.strip_prefix(prefix)) {
        return !shape.is_empty() && shape.chars().all(|c| matches!(c, '2'..='4' | 'x'));
    }
    SAMPLERS.iter().any(|prefix| glsl_type.starts_with(prefix))
}

fn parse_declarator(declarator: &str, glsl_type: &str, location: Option<u32>) -> Option<Declaration> {
    // Drop initialisers (`uniform float gain = 1.0`).
    let declarator = declarator.split('=').next().unwrap_or_default().trim();
    let (name, array_size) = match declarator.split_once('[') {
        Some((name, size)) => {
            let size = size.trim_end_matches(|c: char| c == ']' || c.is_whitespace());
            // Sizes given by constant expressions count as one element.
            (name.trim(), size.trim().parse().unwrap_or(1))
        }
        None => (declarator, 1),
    };
    let is_identifier = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    is_identifier.then(|| Declaration {
        name: name.to_string(),
        glsl_type: glsl_type.to_string(),
        array_size,
        location,
    })
}

fn parse_location(layout: &str) -> Option<u32> {
    layout.split(',').find_map(|qualifier| {
        let (key, value) = qualifier.split_once('=')?;
        (key.trim() == "location")
            .then(|| value.trim().parse().ok())
            .flatten()
    })
}

fn has_entry_point(code: &str) -> bool {
    code.match_indices("main").any(|(at, _)| {
        let head = &code[..at];
        let after = code[at + "main".len()..].trim_start();
        let before = head.trim_end();
        head.ends_with(char::is_whitespace)
            && before.ends_with("void")
            && !before[..before.len() - "void".len()]
                .ends_with(|c: char| c.is_ascii_alphanumeric() || c == '_')
            && after.starts_with('(')
    })
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = '\0';
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if previous == '*' && c == '/' {
                        break;
                    }
                    previous = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX_330: &str = r#"
        #version 330 core
        layout(location = 0) in vec3 position;
        layout(location = 2) in vec2 texCoord0;
        in vec3 normal; // no explicit location
        uniform mat4 worldViewProjectionMatrix;
        uniform mat4 bones[4];
        out vec2 uv;
        /* out vec3 disabled; */
        void main() {
            uv = texCoord0;
            gl_Position = worldViewProjectionMatrix * vec4(position, 1.0);
        }
    "#;

    const FRAGMENT_100: &str = r#"
        precision mediump float;
        varying vec2 uv;
        uniform sampler2D diffuse;
        uniform lowp vec4 tint, fog;
        void main ()
        {
            gl_FragColor = texture2D(diffuse, uv) * tint;
        }
    "#;

    #[test]
    fn scans_modern_vertex_stage() {
        let stage = scan(VERTEX_330, ShaderStage::Vertex);
        assert!(stage.has_entry_point);

        let inputs: Vec<_> = stage
            .inputs
            .iter()
            .map(|d| (d.name.as_str(), d.location))
            .collect();
        assert_eq!(
            inputs,
            vec![("position", Some(0)), ("texCoord0", Some(2)), ("normal", None)]
        );
        assert_eq!(stage.outputs.len(), 1);
        assert_eq!(stage.outputs[0].name, "uv");

        let bones = &stage.uniforms[1];
        assert_eq!(bones.name, "bones");
        assert_eq!(bones.array_size, 4);
        assert_eq!(bones.value_type(), Some(UniformType::MatrixArray));
    }

    #[test]
    fn scans_legacy_fragment_stage() {
        let stage = scan(FRAGMENT_100, ShaderStage::Fragment);
        assert!(stage.has_entry_point);
        assert_eq!(stage.inputs[0].name, "uv");

        let names: Vec<_> = stage.uniforms.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["diffuse", "tint", "fog"]);
        assert_eq!(stage.uniforms[0].sampler(), Some(SamplerKind::Texture2d));
        assert_eq!(stage.uniforms[2].value_type(), Some(UniformType::Vector4));
    }

    #[test]
    fn struct_uniforms_are_not_reported() {
        let source = r#"
            struct Light { vec3 color; float range; };
            uniform Light light;
            uniform Light lights[2];
            uniform vec3 ambient;
            uniform mat4x3 skin;
            uniform vector3 typo;
            void main() {}
        "#;
        let stage = scan(source, ShaderStage::Fragment);
        let names: Vec<_> = stage.uniforms.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["ambient", "skin"]);
    }

    #[test]
    fn entry_point_must_be_void_main() {
        assert!(!scan("void mainly() {}", ShaderStage::Vertex).has_entry_point);
        assert!(!scan("// void main() {}", ShaderStage::Vertex).has_entry_point);
        assert!(!scan("int main() { return 0; }", ShaderStage::Vertex).has_entry_point);
        assert!(scan("void\nmain(void) {}", ShaderStage::Vertex).has_entry_point);
    }
}
