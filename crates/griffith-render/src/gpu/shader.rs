//! WGSL source shared by the depth-only and shaded pipelines.
//!
//! Group 0 holds the per-pass globals and the instance storage buffer; group 1
//! holds the shadow map and its comparison sampler (shaded pipelines only).
//! Light 0 is the sun/moon and is the only light the shadow map attenuates.

pub const SCENE_SHADER_SOURCE: &str = r#"
const MAX_LIGHTS: u32 = 16u;
const SHADOW_BIAS: f32 = 0.002;

struct Light {
    position: vec4<f32>,
    color: vec4<f32>,
    attenuation: vec4<f32>,
};

struct Globals {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    light_count: vec4<u32>,
    lights: array<Light, 16>,
};

struct Instance {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(0) @binding(1)
var<storage, read> instances: array<Instance>;

@group(1) @binding(0)
var shadow_map: texture_depth_2d;

@group(1) @binding(1)
var shadow_sampler: sampler_comparison;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) @interpolate(flat) instance_id: u32,
};

@vertex
fn vs_depth(in: VertexInput, @builtin(instance_index) iid: u32) -> @builtin(position) vec4<f32> {
    let world = instances[iid].model * vec4<f32>(in.position, 1.0);
    return globals.view_proj * world;
}

@vertex
fn vs_main(in: VertexInput, @builtin(instance_index) iid: u32) -> VertexOutput {
    let inst = instances[iid];
    let world = inst.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = globals.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = (inst.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    out.instance_id = iid;
    return out;
}

fn phong(normal: vec3<f32>, world: vec3<f32>, inst: Instance, sun_visibility: f32) -> vec3<f32> {
    let view_dir = normalize(globals.camera_position.xyz - world);
    var result = inst.color.rgb * inst.params.x;
    let count = min(globals.light_count.x, MAX_LIGHTS);
    for (var i = 0u; i < count; i = i + 1u) {
        let light = globals.lights[i];
        let to_light = light.position.xyz - light.position.w * world;
        let dist = length(to_light);
        let l = normalize(to_light);
        let h = normalize(l + view_dir);
        let attenuation = 1.0 / (1.0 + light.attenuation.x * dist * dist);
        let diffuse = max(dot(normal, l), 0.0);
        let specular = pow(max(dot(normal, h), 0.0), inst.params.w);
        var contribution = inst.color.rgb * light.color.rgb * inst.params.y * diffuse
            + light.color.rgb * inst.params.z * specular;
        if (i == 0u) {
            contribution = contribution * sun_visibility;
        }
        result = result + attenuation * contribution;
    }
    return result;
}

fn shadow_visibility(world: vec3<f32>) -> f32 {
    let clip = globals.light_view_proj * vec4<f32>(world, 1.0);
    let ndc = clip.xyz / clip.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, -ndc.y * 0.5 + 0.5);
    let lit = textureSampleCompareLevel(shadow_map, shadow_sampler, uv, ndc.z - SHADOW_BIAS);
    let inside = clip.w > 0.0 && all(uv >= vec2<f32>(0.0)) && all(uv <= vec2<f32>(1.0)) && ndc.z <= 1.0;
    return select(1.0, lit, inside);
}

@fragment
fn fs_phong(in: VertexOutput) -> @location(0) vec4<f32> {
    let inst = instances[in.instance_id];
    let color = phong(normalize(in.world_normal), in.world_position, inst, 1.0);
    return vec4<f32>(color, inst.color.a);
}

@fragment
fn fs_shadowed(in: VertexOutput) -> @location(0) vec4<f32> {
    let inst = instances[in.instance_id];
    let visibility = shadow_visibility(in.world_position);
    let color = phong(normalize(in.world_normal), in.world_position, inst, visibility);
    return vec4<f32>(color, inst.color.a);
}

@fragment
fn fs_unlit(in: VertexOutput) -> @location(0) vec4<f32> {
    return instances[in.instance_id].color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points_present() {
        for entry in ["vs_depth", "vs_main", "fs_phong", "fs_shadowed", "fs_unlit"] {
            assert!(
                SCENE_SHADER_SOURCE.contains(&format!("fn {entry}(")),
                "missing entry point {entry}"
            );
        }
    }

    #[test]
    fn test_shader_compiles_on_device() {
        let Ok(ctx) = super::super::init_headless_blocking() else {
            return;
        };
        let _module = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("scene-shader-test"),
                source: wgpu::ShaderSource::Wgsl(SCENE_SHADER_SOURCE.into()),
            });
    }
}
