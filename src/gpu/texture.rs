//! Depth attachments: the per-frame scene depth buffer and the spot-light
//! shadow map.

/// Depth format shared by the scene pass and the shadow pass.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A depth texture and its default view.
pub struct DepthTarget {
    /// The underlying GPU texture.
    pub texture: wgpu::Texture,
    /// A default full-texture view.
    pub view: wgpu::TextureView,
}

impl DepthTarget {
    /// Create a depth attachment sized to the surface.
    #[must_use]
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self::with_usage(
            device,
            "Scene Depth",
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        )
    }

    fn with_usage(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Square depth texture rendered from the spot light, sampled with a
/// comparison sampler for PCF.
pub struct ShadowMap {
    /// Depth attachment written by the shadow pass.
    pub target: DepthTarget,
    /// `LessEqual` comparison sampler used in the lit shader.
    pub sampler: wgpu::Sampler,
    /// Edge length in texels.
    pub size: u32,
}

impl ShadowMap {
    /// Allocate a `size x size` shadow map.
    #[must_use]
    pub fn new(device: &wgpu::Device, size: u32) -> Self {
        let target = DepthTarget::with_usage(
            device,
            "Shadow Map",
            size,
            size,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        Self {
            target,
            sampler,
            size: size.max(1),
        }
    }
}
