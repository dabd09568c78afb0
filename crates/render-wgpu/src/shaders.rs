//! WGSL sources. Scene shaders write linear HDR colour; the bloom composite
//! tone maps and encodes for the surface.

/// Per-frame uniforms shared by every scene pipeline at group 0.
macro_rules! globals_wgsl {
    () => {
        r#"
struct Globals {
    view_proj: mat4x4<f32>,
    sky_inv: mat4x4<f32>,
    camera_pos: vec4<f32>,
    // drawing buffer width, height, pixel ratio
    viewport: vec4<f32>,
    // w = cutoff distance
    point_pos: vec4<f32>,
    // rgb premultiplied by intensity, w = decay
    point_color: vec4<f32>,
    // direction towards the light
    dir_direction: vec4<f32>,
    dir_color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
"#
    };
}

macro_rules! fullscreen_vertex_wgsl {
    () => {
        r#"
struct FullscreenOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) idx: u32) -> FullscreenOutput {
    let corner = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: FullscreenOutput;
    out.position = vec4<f32>(corner * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(corner.x, 1.0 - corner.y);
    return out;
}
"#
    };
}

/// ACES filmic tone mapping with exposure.
macro_rules! aces_wgsl {
    () => {
        r#"
fn rrt_and_odt_fit(v: vec3<f32>) -> vec3<f32> {
    let a = v * (v + 0.0245786) - 0.000090537;
    let b = v * (0.983729 * v + 0.4329510) + 0.238081;
    return a / b;
}

fn aces_filmic(hdr: vec3<f32>, exposure: f32) -> vec3<f32> {
    let aces_input = mat3x3<f32>(
        vec3<f32>(0.59719, 0.07600, 0.02840),
        vec3<f32>(0.35458, 0.90834, 0.13383),
        vec3<f32>(0.04823, 0.01566, 0.83777),
    );
    let aces_output = mat3x3<f32>(
        vec3<f32>(1.60475, -0.10208, -0.00327),
        vec3<f32>(-0.53108, 1.10813, -0.07276),
        vec3<f32>(-0.07367, -0.00605, 1.07602),
    );
    var color = hdr * exposure / 0.6;
    color = aces_input * color;
    color = rrt_and_odt_fit(color);
    color = aces_output * color;
    return saturate(color);
}
"#
    };
}

/// Metallic-roughness surface lit by one directional and one point light.
pub const STANDARD_SHADER: &str = concat!(
    globals_wgsl!(),
    r#"
struct MeshUniforms {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
    // metalness, roughness, normal scale, environment intensity
    params: vec4<f32>,
    // has colour map, has normal map
    maps: vec4<f32>,
};

@group(1) @binding(0) var<uniform> mesh: MeshUniforms;
@group(1) @binding(1) var color_map: texture_2d<f32>;
@group(1) @binding(2) var normal_map: texture_2d<f32>;
@group(1) @binding(3) var env_map: texture_cube<f32>;
@group(1) @binding(4) var map_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

const RECIPROCAL_PI: f32 = 0.3183098861837907;

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = mesh.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip = globals.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = (mesh.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

// Tangent frame from screen-space derivatives, so meshes need no tangents.
fn perturb_normal(pos: vec3<f32>, n: vec3<f32>, map_n: vec3<f32>, uv: vec2<f32>) -> vec3<f32> {
    let q0 = dpdx(pos);
    let q1 = dpdy(pos);
    let st0 = dpdx(uv);
    let st1 = dpdy(uv);
    let q1perp = cross(q1, n);
    let q0perp = cross(n, q0);
    let t = q1perp * st0.x + q0perp * st1.x;
    let b = q1perp * st0.y + q0perp * st1.y;
    let det = max(dot(t, t), dot(b, b));
    let scale = select(inverseSqrt(det), 0.0, det == 0.0);
    return normalize(t * (map_n.x * scale) + b * (map_n.y * scale) + n * map_n.z);
}

fn d_ggx(alpha: f32, n_dot_h: f32) -> f32 {
    let a2 = alpha * alpha;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    return RECIPROCAL_PI * a2 / (denom * denom);
}

fn v_smith_correlated(alpha: f32, n_dot_l: f32, n_dot_v: f32) -> f32 {
    let a2 = alpha * alpha;
    let gv = n_dot_l * sqrt(a2 + (1.0 - a2) * n_dot_v * n_dot_v);
    let gl = n_dot_v * sqrt(a2 + (1.0 - a2) * n_dot_l * n_dot_l);
    return 0.5 / max(gv + gl, 1e-6);
}

fn f_schlick(f0: vec3<f32>, v_dot_h: f32) -> vec3<f32> {
    let fresnel = exp2((-5.55473 * v_dot_h - 6.98316) * v_dot_h);
    return f0 * (1.0 - fresnel) + fresnel;
}

fn env_brdf(f0: vec3<f32>, roughness: f32, n_dot_v: f32) -> vec3<f32> {
    let c0 = vec4<f32>(-1.0, -0.0275, -0.572, 0.022);
    let c1 = vec4<f32>(1.0, 0.0425, 1.04, -0.04);
    let r = roughness * c0 + c1;
    let a004 = min(r.x * r.x, exp2(-9.28 * n_dot_v)) * r.x + r.y;
    let fab = vec2<f32>(-1.04, 1.04) * a004 + r.zw;
    return f0 * fab.x + fab.y;
}

fn direct_light(
    radiance: vec3<f32>,
    l: vec3<f32>,
    n: vec3<f32>,
    v: vec3<f32>,
    diffuse: vec3<f32>,
    f0: vec3<f32>,
    alpha: f32,
) -> vec3<f32> {
    let h = normalize(l + v);
    let n_dot_l = saturate(dot(n, l));
    let n_dot_v = saturate(dot(n, v));
    let n_dot_h = saturate(dot(n, h));
    let v_dot_h = saturate(dot(v, h));
    let specular = f_schlick(f0, v_dot_h) * v_smith_correlated(alpha, n_dot_l, n_dot_v) * d_ggx(alpha, n_dot_h);
    return radiance * n_dot_l * (diffuse * RECIPROCAL_PI + specular);
}

fn point_falloff(d: f32, cutoff: f32, decay: f32) -> f32 {
    var falloff = 1.0 / max(pow(d, decay), 0.01);
    if cutoff > 0.0 {
        let ratio = d / cutoff;
        let window = saturate(1.0 - ratio * ratio * ratio * ratio);
        falloff = falloff * window * window;
    }
    return falloff;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(color_map, map_sampler, in.uv);
    let map_n = textureSample(normal_map, map_sampler, in.uv).xyz * 2.0 - 1.0;

    let base = mesh.color.rgb * mix(vec3<f32>(1.0), texel.rgb, mesh.maps.x);
    let geometric_n = normalize(in.normal);
    let scaled_n = vec3<f32>(map_n.xy * mesh.params.z, map_n.z);
    let mapped_n = perturb_normal(in.world_pos, geometric_n, scaled_n, in.uv);
    let n = normalize(mix(geometric_n, mapped_n, mesh.maps.y));
    let v = normalize(globals.camera_pos.xyz - in.world_pos);

    let metalness = mesh.params.x;
    let roughness = clamp(mesh.params.y, 0.0525, 1.0);
    let alpha = roughness * roughness;
    let diffuse = base * (1.0 - metalness);
    let f0 = mix(vec3<f32>(0.04), base, metalness);

    var color = direct_light(
        globals.dir_color.rgb,
        normalize(globals.dir_direction.xyz),
        n, v, diffuse, f0, alpha,
    );

    let to_light = globals.point_pos.xyz - in.world_pos;
    let d = length(to_light);
    let falloff = point_falloff(d, globals.point_pos.w, globals.point_color.w);
    color += direct_light(
        globals.point_color.rgb * falloff,
        to_light / max(d, 1e-6),
        n, v, diffuse, f0, alpha,
    );

    // Cube maps are sampled with x mirrored.
    let r = reflect(-v, n);
    let specular_env = textureSample(env_map, map_sampler, vec3<f32>(-r.x, r.yz)).rgb;
    let diffuse_env = textureSample(env_map, map_sampler, vec3<f32>(-n.x, n.yz)).rgb;
    let env = specular_env * env_brdf(f0, roughness, saturate(dot(n, v))) + diffuse_env * diffuse;
    color += env * mesh.params.w;

    return vec4<f32>(color, 1.0);
}
"#
);

/// Camera-facing quads, one instance per star.
pub const POINTS_SHADER: &str = concat!(
    globals_wgsl!(),
    r#"
struct PointsUniforms {
    model: mat4x4<f32>,
    // rgb, opacity
    color: vec4<f32>,
    // size, size attenuation, has alpha map
    params: vec4<f32>,
};

@group(1) @binding(0) var<uniform> points: PointsUniforms;
@group(1) @binding(1) var alpha_map: texture_2d<f32>;
@group(1) @binding(2) var alpha_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vi: u32, @location(0) center: vec3<f32>) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[vi];
    let clip = globals.view_proj * (points.model * vec4<f32>(center, 1.0));

    // Size in drawing-buffer pixels; clip.w is the view depth.
    var size_px = points.params.x * globals.viewport.z;
    if points.params.y > 0.5 {
        size_px = size_px * (globals.viewport.y * 0.5) / max(clip.w, 1e-6);
    }
    let offset = corner * size_px / globals.viewport.xy;

    var out: VertexOutput;
    out.clip = clip + vec4<f32>(offset * clip.w, 0.0, 0.0);
    out.uv = vec2<f32>(corner.x * 0.5 + 0.5, 0.5 - corner.y * 0.5);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let mask = textureSample(alpha_map, alpha_sampler, in.uv).g;
    let alpha = points.color.a * mix(1.0, mask, points.params.z);
    return vec4<f32>(points.color.rgb, alpha);
}
"#
);

/// Unlit matcap shading without a matcap texture: the view-space normal
/// picks a grey ramp from 0.2 to 0.8 that tints the base colour.
pub const MATCAP_SHADER: &str = concat!(
    globals_wgsl!(),
    r#"
struct MatcapUniforms {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
};

@group(1) @binding(0) var<uniform> matcap: MatcapUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = matcap.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip = globals.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = (matcap.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let view_dir = normalize(globals.camera_pos.xyz - in.world_pos);
    let x = normalize(vec3<f32>(view_dir.z, 0.0, -view_dir.x));
    let y = cross(view_dir, x);
    let uv = vec2<f32>(dot(x, n), dot(y, n)) * 0.495 + 0.5;
    let shade = mix(0.2, 0.8, uv.y);
    return vec4<f32>(matcap.color.rgb * shade, 1.0);
}
"#
);

/// Background cube map drawn behind everything.
pub const SKYBOX_SHADER: &str = concat!(
    globals_wgsl!(),
    r#"
@group(1) @binding(0) var sky: texture_cube<f32>;
@group(1) @binding(1) var sky_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let corner = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    let ndc = corner * 2.0 - 1.0;
    var out: VertexOutput;
    out.position = vec4<f32>(ndc, 1.0, 1.0);
    out.ndc = ndc;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let far = globals.sky_inv * vec4<f32>(in.ndc, 1.0, 1.0);
    let dir = far.xyz / far.w;
    let color = textureSample(sky, sky_sampler, vec3<f32>(-dir.x, dir.yz)).rgb;
    return vec4<f32>(color, 1.0);
}
"#
);

/// Keeps tone-mapped pixels brighter than the threshold, with a narrow soft
/// edge.
pub const BLOOM_EXTRACT_SHADER: &str = concat!(
    fullscreen_vertex_wgsl!(),
    aces_wgsl!(),
    r#"
struct ExtractParams {
    threshold: f32,
    smooth_width: f32,
    exposure: f32,
    _pad: f32,
};

@group(0) @binding(0) var<uniform> params: ExtractParams;
@group(0) @binding(1) var input_tex: texture_2d<f32>;
@group(0) @binding(2) var input_sampler: sampler;

@fragment
fn fs_extract(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let hdr = textureSampleLevel(input_tex, input_sampler, in.uv, 0.0).rgb;
    let color = aces_filmic(hdr, params.exposure);
    let luma = dot(color, vec3<f32>(0.2126, 0.7152, 0.0722));
    let keep = smoothstep(params.threshold, params.threshold + params.smooth_width, luma);
    return mix(vec4<f32>(0.0), vec4<f32>(color, 1.0), keep);
}
"#
);

/// One direction of a separable Gaussian blur.
pub const BLOOM_BLUR_SHADER: &str = concat!(
    fullscreen_vertex_wgsl!(),
    r#"
struct BlurParams {
    direction: vec2<f32>,
    inv_size: vec2<f32>,
    coefficients: array<vec4<f32>, 3>,
    kernel_radius: u32,
};

@group(0) @binding(0) var<uniform> params: BlurParams;
@group(0) @binding(1) var input_tex: texture_2d<f32>;
@group(0) @binding(2) var input_sampler: sampler;

fn coefficient(i: u32) -> f32 {
    return params.coefficients[i / 4u][i % 4u];
}

@fragment
fn fs_blur(in: FullscreenOutput) -> @location(0) vec4<f32> {
    var weight_sum = coefficient(0u);
    var sum = textureSampleLevel(input_tex, input_sampler, in.uv, 0.0).rgb * weight_sum;
    for (var i = 1u; i < params.kernel_radius; i++) {
        let w = coefficient(i);
        let offset = params.direction * params.inv_size * f32(i);
        let a = textureSampleLevel(input_tex, input_sampler, in.uv + offset, 0.0).rgb;
        let b = textureSampleLevel(input_tex, input_sampler, in.uv - offset, 0.0).rgb;
        sum += (a + b) * w;
        weight_sum += 2.0 * w;
    }
    return vec4<f32>(sum / weight_sum, 1.0);
}
"#
);

/// Tone maps the scene, adds the weighted bloom levels on top and applies
/// optional sRGB encoding.
pub const BLOOM_COMPOSITE_SHADER: &str = concat!(
    fullscreen_vertex_wgsl!(),
    aces_wgsl!(),
    r#"
struct CompositeParams {
    weights: array<vec4<f32>, 2>,
    strength: f32,
    exposure: f32,
    encode_srgb: f32,
    bloom_enabled: f32,
};

@group(0) @binding(0) var<uniform> params: CompositeParams;
@group(0) @binding(1) var scene_tex: texture_2d<f32>;
@group(0) @binding(2) var level0: texture_2d<f32>;
@group(0) @binding(3) var level1: texture_2d<f32>;
@group(0) @binding(4) var level2: texture_2d<f32>;
@group(0) @binding(5) var level3: texture_2d<f32>;
@group(0) @binding(6) var level4: texture_2d<f32>;
@group(0) @binding(7) var linear_sampler: sampler;

fn linear_to_srgb(c: vec3<f32>) -> vec3<f32> {
    let low = c * 12.92;
    let high = 1.055 * pow(c, vec3<f32>(1.0 / 2.4)) - 0.055;
    return select(high, low, c <= vec3<f32>(0.0031308));
}

@fragment
fn fs_composite(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let hdr = textureSampleLevel(scene_tex, linear_sampler, in.uv, 0.0).rgb;
    let bloom = params.weights[0].x * textureSampleLevel(level0, linear_sampler, in.uv, 0.0).rgb
        + params.weights[0].y * textureSampleLevel(level1, linear_sampler, in.uv, 0.0).rgb
        + params.weights[0].z * textureSampleLevel(level2, linear_sampler, in.uv, 0.0).rgb
        + params.weights[0].w * textureSampleLevel(level3, linear_sampler, in.uv, 0.0).rgb
        + params.weights[1].x * textureSampleLevel(level4, linear_sampler, in.uv, 0.0).rgb;
    var color = aces_filmic(hdr, params.exposure);
    color = saturate(color + bloom * params.strength * params.bloom_enabled);
    color = mix(color, linear_to_srgb(color), params.encode_srgb);
    return vec4<f32>(color, 1.0);
}
"#
);
