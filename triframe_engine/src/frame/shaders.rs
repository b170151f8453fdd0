/// Embedded GLSL sources of the triangle pipeline
///
/// The three vertices are baked into the vertex shader; no vertex buffer is
/// bound.

use crate::graphics_device::{ShaderStageDesc, ShaderStagesDesc};

pub const TRIANGLE_VERTEX_SHADER: &str = r#"#version 460

layout(location = 0) out vec3 frag_color;

void main() {
    vec2 positions[3] = vec2[](
        vec2(-0.6, -0.4),
        vec2(0.6, -0.4),
        vec2(0.0, 0.6)
    );
    vec3 colors[3] = vec3[](
        vec3(1.0, 0.0, 0.0),
        vec3(0.0, 1.0, 0.0),
        vec3(0.0, 0.0, 1.0)
    );

    gl_Position = vec4(positions[gl_VertexIndex], 0.0, 1.0);
    frag_color = colors[gl_VertexIndex];
}
"#;

pub const TRIANGLE_FRAGMENT_SHADER: &str = r#"#version 460

layout(location = 0) in vec3 frag_color;
layout(location = 0) out vec4 out_color;

void main() {
    out_color = vec4(frag_color, 1.0);
}
"#;

/// Both stages with `main` entry points
pub fn triangle_shader_stages() -> ShaderStagesDesc {
    ShaderStagesDesc {
        vertex: ShaderStageDesc { source: TRIANGLE_VERTEX_SHADER, entry_point: "main" },
        fragment: ShaderStageDesc { source: TRIANGLE_FRAGMENT_SHADER, entry_point: "main" },
    }
}
