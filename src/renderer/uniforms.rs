//! CPU mirrors of the WGSL uniform structs.

use glam::{Mat4, Vec3};

use crate::options::RendererOptions;
use crate::scene::{Light, Material, PlacedLight, PointLight, SpotLight};
use crate::util::color::srgb_hex_to_linear;

/// Draw flag: skip lighting.
pub const FLAG_UNLIT: u32 = 1;
/// Draw flag: apply the spot shadow.
pub const FLAG_RECEIVE_SHADOW: u32 = 1 << 1;

/// Scene lighting and output settings.
/// NOTE: Must match WGSL struct layout exactly (176 bytes)
///
/// WGSL layout:
///   spot_view_proj: mat4x4<f32>  (offset 0)
///   spot_position: vec3<f32>     (offset 64)
///   spot_intensity: f32          (offset 76)
///   spot_direction: vec3<f32>    (offset 80)
///   spot_distance: f32           (offset 92)
///   spot_color: vec3<f32>        (offset 96)
///   spot_decay: f32              (offset 108)
///   spot_cos_outer: f32          (offset 112)
///   spot_cos_inner: f32          (offset 116)
///   shadow_bias: f32             (offset 120)
///   shadow_enabled: u32          (offset 124)
///   point_position: vec3<f32>    (offset 128)
///   point_intensity: f32         (offset 140)
///   point_color: vec3<f32>       (offset 144)
///   point_distance: f32          (offset 156)
///   point_decay: f32             (offset 160)
///   ambient: f32                 (offset 164)
///   exposure: f32                (offset 168)
///   tone_mapping: u32            (offset 172)
///   Total: 176 bytes
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    /// Spot light view-projection for shadow lookups.
    pub spot_view_proj: [[f32; 4]; 4],
    /// Spot light world position.
    pub spot_position: [f32; 3],
    /// Spot light intensity.
    pub spot_intensity: f32,
    /// Unit direction the spot cone points along.
    pub spot_direction: [f32; 3],
    /// Spot range; 0 means unlimited.
    pub spot_distance: f32,
    /// Linear spot colour.
    pub spot_color: [f32; 3],
    /// Spot distance falloff exponent.
    pub spot_decay: f32,
    /// Cosine of the cone half-angle.
    pub spot_cos_outer: f32,
    /// Cosine where the penumbra starts.
    pub spot_cos_inner: f32,
    /// Depth bias applied to shadow lookups.
    pub shadow_bias: f32,
    /// 1 when the spot shadow map is valid.
    pub shadow_enabled: u32,
    /// Point light world position.
    pub point_position: [f32; 3],
    /// Point light intensity.
    pub point_intensity: f32,
    /// Linear point colour.
    pub point_color: [f32; 3],
    /// Point range; 0 means unlimited.
    pub point_distance: f32,
    /// Point distance falloff exponent.
    pub point_decay: f32,
    /// Flat ambient term.
    pub ambient: f32,
    /// Tone mapping exposure.
    pub exposure: f32,
    /// Tone mapping operator id.
    pub tone_mapping: u32,
}

/// Per-draw model data.
/// NOTE: Must match WGSL struct layout exactly (176 bytes)
///
/// WGSL layout:
///   model: mat4x4<f32>       (offset 0)
///   normal: mat4x4<f32>      (offset 64)
///   base_color: vec4<f32>    (offset 128)
///   emissive: vec3<f32>      (offset 144)
///   roughness: f32           (offset 156)
///   metalness: f32           (offset 160)
///   flags: u32               (offset 164)
///   _pad: vec2<f32>          (offset 168)
///   Total: 176 bytes
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    /// Model-to-world matrix.
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`.
    pub normal: [[f32; 4]; 4],
    /// Linear RGBA base colour.
    pub base_color: [f32; 4],
    /// Linear emissive colour.
    pub emissive: [f32; 3],
    /// PBR roughness.
    pub roughness: f32,
    /// PBR metalness.
    pub metalness: f32,
    /// `FLAG_*` bits.
    pub flags: u32,
    /// Padding to 16-byte alignment.
    pub _pad: [f32; 2],
}

/// Light-space matrix for the shadow pass (64 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowUniform {
    /// Light view-projection.
    pub view_proj: [[f32; 4]; 4],
}

impl DrawUniform {
    /// Uniform for a mesh instance placed by `world`.
    pub fn new(world: Mat4, material: &Material, receive_shadow: bool) -> Self {
        let mut flags = 0;
        if material.unlit {
            flags |= FLAG_UNLIT;
        }
        if receive_shadow {
            flags |= FLAG_RECEIVE_SHADOW;
        }
        Self {
            model: world.to_cols_array_2d(),
            normal: world.inverse().transpose().to_cols_array_2d(),
            base_color: material.base_color,
            emissive: material.emissive,
            roughness: material.roughness,
            metalness: material.metalness,
            flags,
            _pad: [0.0; 2],
        }
    }
}

/// Light-space view-projection of a spot light at `position`.
///
/// The frustum's full angle is `2 * angle * focus`, square aspect.
pub fn spot_view_proj(spot: &SpotLight, position: Vec3) -> Mat4 {
    let dir = (spot.target - position).normalize_or(Vec3::NEG_Y);
    // look_at degenerates when the view direction is parallel to up.
    let up = if dir.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    let fov = (2.0 * spot.angle * spot.shadow.focus).clamp(0.01, 3.1);
    let near = spot.shadow.near.max(1e-3);
    let far = spot.shadow.far.max(near + 1e-3);
    Mat4::perspective_rh(fov, 1.0, near, far)
        * Mat4::look_at_rh(position, spot.target, up)
}

impl LightsUniform {
    /// Pack the first spot and first point light of `lights`.
    pub fn from_lights(
        lights: &[PlacedLight],
        options: &RendererOptions,
    ) -> Self {
        let mut u = Self {
            spot_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            spot_position: [0.0; 3],
            spot_intensity: 0.0,
            spot_direction: [0.0, -1.0, 0.0],
            spot_distance: 0.0,
            spot_color: [0.0; 3],
            spot_decay: 2.0,
            spot_cos_outer: 1.0,
            spot_cos_inner: 1.0,
            shadow_bias: 0.0,
            shadow_enabled: 0,
            point_position: [0.0; 3],
            point_intensity: 0.0,
            point_color: [0.0; 3],
            point_distance: 0.0,
            point_decay: 2.0,
            ambient: options.ambient,
            exposure: options.exposure,
            tone_mapping: options.tone_mapping.as_u32(),
        };

        if let Some((spot, world)) = lights.iter().find_map(|l| match l.light {
            Light::Spot(s) => Some((s, l.world)),
            Light::Point(_) => None,
        }) {
            u.set_spot(&spot, world.w_axis.truncate(), options.shadows);
        }
        if let Some((point, world)) = lights.iter().find_map(|l| match l.light {
            Light::Point(p) => Some((p, l.world)),
            Light::Spot(_) => None,
        }) {
            u.set_point(&point, world.w_axis.truncate());
        }
        u
    }

    fn set_spot(&mut self, spot: &SpotLight, position: Vec3, shadows: bool) {
        let dir = (spot.target - position).normalize_or(Vec3::NEG_Y);
        self.spot_view_proj = spot_view_proj(spot, position).to_cols_array_2d();
        self.spot_position = position.to_array();
        self.spot_intensity = spot.intensity;
        self.spot_direction = dir.to_array();
        self.spot_distance = spot.distance;
        self.spot_color = spot.color;
        self.spot_decay = spot.decay;
        self.spot_cos_outer = spot.angle.cos();
        self.spot_cos_inner = (spot.angle * (1.0 - spot.penumbra)).cos();
        self.shadow_bias = spot.shadow.bias;
        self.shadow_enabled = u32::from(spot.cast_shadow && shadows);
    }

    fn set_point(&mut self, point: &PointLight, position: Vec3) {
        self.point_position = position.to_array();
        self.point_intensity = point.intensity;
        self.point_color = point.color;
        self.point_distance = point.distance;
        self.point_decay = point.decay;
    }
}

/// Linear clear color for the configured background.
pub fn clear_color(options: &RendererOptions) -> wgpu::Color {
    let [r, g, b] = srgb_hex_to_linear(options.background);
    wgpu::Color {
        r: f64::from(r),
        g: f64::from(g),
        b: f64::from(b),
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Node, Payload, SceneGraph, ShadowCamera, Transform};

    fn spot() -> SpotLight {
        SpotLight {
            color: [1.0; 3],
            intensity: 180.0,
            distance: 90.0,
            decay: 1.99,
            angle: std::f32::consts::FRAC_PI_6,
            penumbra: 0.5,
            target: Vec3::ZERO,
            cast_shadow: true,
            shadow: ShadowCamera {
                near: 1.0,
                far: 10.0,
                focus: 1.0,
                bias: 0.0,
            },
        }
    }

    #[test]
    fn uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<LightsUniform>(), 176);
        assert_eq!(std::mem::size_of::<DrawUniform>(), 176);
        assert_eq!(std::mem::size_of::<ShadowUniform>(), 64);
    }

    #[test]
    fn straight_down_spot_has_finite_shadow_matrix() {
        let m = spot_view_proj(&spot(), Vec3::new(0.0, 8.0, 0.0));
        assert!(m.is_finite());
        // The target projects to the centre of the shadow map.
        let clip = m * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn lights_are_packed_from_world_positions() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene.add(
            root,
            Node::new("spot")
                .with_transform(Transform::from_position(Vec3::new(0.0, 8.0, 0.0)))
                .with_payload(Payload::Light(Light::Spot(spot()))),
        );
        scene.add(
            root,
            Node::new("point")
                .with_transform(Transform::from_position(Vec3::X))
                .with_payload(Payload::Light(Light::Point(PointLight::default()))),
        );
        let u = LightsUniform::from_lights(&scene.lights(), &RendererOptions::default());
        assert_eq!(u.spot_position, [0.0, 8.0, 0.0]);
        assert_eq!(u.spot_direction, [0.0, -1.0, 0.0]);
        assert_eq!(u.point_position, [1.0, 0.0, 0.0]);
        assert_eq!(u.shadow_enabled, 1);
        assert!(u.spot_cos_inner > u.spot_cos_outer);
    }

    #[test]
    fn unlit_and_shadow_flags() {
        let material = Material {
            unlit: true,
            ..Material::default()
        };
        let u = DrawUniform::new(Mat4::IDENTITY, &material, true);
        assert_eq!(u.flags, FLAG_UNLIT | FLAG_RECEIVE_SHADOW);
    }
}
