//! GPU shaders for the liquid glass effect
//!
//! The effect is a single full-screen pass over the composited content of
//! the sampled surfaces:
//! - Rounded-box SDF lens with refraction and curvature
//! - Chromatic dispersion toward the edges
//! - Saturation, tint and edge highlight

/// Entry point of the vertex stage in [`LIQUID_SHADER`]
pub const LIQUID_VERTEX_ENTRY: &str = "vs_main";

/// Entry point of the fragment stage in [`LIQUID_SHADER`]
pub const LIQUID_FRAGMENT_ENTRY: &str = "fs_main";

/// Name of the content input sampled by [`LIQUID_SHADER`]
pub const LIQUID_CONTENT_INPUT: &str = "content_texture";

/// Liquid glass shader
///
/// Bindings (group 0):
/// - 0: `LiquidUniforms` uniform block
/// - 1: content texture (optionally pre-blurred)
/// - 2: content sampler
pub const LIQUID_SHADER: &str = r#"
// ============================================================================
// Liquid Glass Shader
// ============================================================================

struct LiquidUniforms {
    size: vec2<f32>,
    refraction: f32,
    curve: f32,
    // bottom-end, top-end, bottom-start, top-start; normalized by min dimension
    corner_radii: vec4<f32>,
    tint: vec4<f32>,
    edge: f32,
    saturation: f32,
    dispersion: f32,
    _padding: f32,
}

@group(0) @binding(0) var<uniform> uniforms: LiquidUniforms;
@group(0) @binding(1) var content_texture: texture_2d<f32>;
@group(0) @binding(2) var content_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) frag_coord: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var out: VertexOutput;
    // Full-screen triangle
    let uv = vec2<f32>(f32((vertex_index << 1u) & 2u), f32(vertex_index & 2u));
    out.position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.frag_coord = uv * uniforms.size;
    return out;
}

fn sample_content(coord: vec2<f32>) -> vec4<f32> {
    return textureSampleLevel(content_texture, content_sampler, coord / uniforms.size, 0.0);
}

fn rounded_box_sdf(p: vec2<f32>, half_size: vec2<f32>, radii: vec4<f32>) -> f32 {
    let side = select(radii.zw, radii.xy, p.x > 0.0);
    let radius = select(side.y, side.x, p.y > 0.0);
    let q = abs(p) - half_size + vec2<f32>(radius);
    return min(max(q.x, q.y), 0.0) + length(max(q, vec2<f32>(0.0))) - radius;
}

fn sdf_normal(p: vec2<f32>, half_size: vec2<f32>, radii: vec4<f32>) -> vec2<f32> {
    let e = 0.001;
    let dx = rounded_box_sdf(p + vec2<f32>(e, 0.0), half_size, radii)
        - rounded_box_sdf(p - vec2<f32>(e, 0.0), half_size, radii);
    let dy = rounded_box_sdf(p + vec2<f32>(0.0, e), half_size, radii)
        - rounded_box_sdf(p - vec2<f32>(0.0, e), half_size, radii);
    let gradient = vec2<f32>(dx, dy);
    let len = length(gradient);
    if (len < 0.000001) {
        return vec2<f32>(0.0);
    }
    return gradient / len;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let size = uniforms.size;
    let min_dimension = min(size.x, size.y);
    let center = size * 0.5;
    let half_shape = size / min_dimension * 0.5;

    let shape_coord = (in.frag_coord - center) / min_dimension;
    let shape_sdf = rounded_box_sdf(shape_coord, half_shape, uniforms.corner_radii);
    if (shape_sdf > 0.0) {
        return vec4<f32>(0.0);
    }

    let lens_radii = min(uniforms.corner_radii * 1.5, vec4<f32>(min(half_shape.x, half_shape.y)));
    let normal = sdf_normal(shape_coord, half_shape, lens_radii);

    // Refraction: push samples toward the center near the rim
    var base_coord = in.frag_coord;
    if (uniforms.refraction > 0.0 && uniforms.curve > 0.0) {
        let depth = 1.0 - clamp(-shape_sdf / uniforms.refraction, 0.0, 1.0);
        let distortion = 1.0 - sqrt(1.0 - depth * depth);
        base_coord = in.frag_coord - distortion * uniforms.curve * min_dimension * normal;
    }

    var color: vec4<f32>;
    if (uniforms.dispersion > 0.0) {
        let offset = (in.frag_coord - center) / size;
        let aberration = uniforms.dispersion * offset * offset * offset * min_dimension;
        let green = sample_content(base_coord);
        let red = sample_content(base_coord - aberration);
        let blue = sample_content(base_coord + aberration);
        color = vec4<f32>(red.r, green.g, blue.b, green.a);
    } else {
        color = sample_content(base_coord);
    }

    let luminance = dot(color.rgb, vec3<f32>(0.2126, 0.7152, 0.0722));
    var rgb = clamp(mix(vec3<f32>(luminance), color.rgb, uniforms.saturation), vec3<f32>(0.0), vec3<f32>(1.0));
    rgb = mix(rgb, uniforms.tint.rgb, uniforms.tint.a);

    // Edge highlight lit from the top-left
    let rim = smoothstep(-uniforms.edge, 0.0, shape_sdf);
    let lit = abs(dot(normal, vec2<f32>(-0.7071, -0.7071)));
    rgb = rgb + vec3<f32>(rim * lit * uniforms.edge * 4.0);

    // Anti-aliased one pixel transition to the unrefracted content
    let coverage = clamp(-shape_sdf * min_dimension, 0.0, 1.0);
    return mix(sample_content(in.frag_coord), vec4<f32>(rgb, color.a), coverage);
}
"#;
