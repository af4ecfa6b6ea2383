use crate::target::{TargetAllocator, TargetDescriptor};

/// One GPU capture surface: square color texture plus the sampler the
/// portal material reads it through.
#[derive(Debug)]
pub struct GpuCaptureTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: u32,
    /// Load-op clear color for the next capture pass into this target.
    pub clear_color: wgpu::Color,
}

/// Allocates capture targets on a wgpu device. Every allocation builds a
/// complete new surface; the manager swaps handles, so a pass that is
/// still sampling the previous texture keeps it alive.
#[derive(Debug, Clone)]
pub struct WgpuTargetAllocator {
    device: wgpu::Device,
}

impl WgpuTargetAllocator {
    pub fn new(device: wgpu::Device) -> Self {
        Self { device }
    }
}

impl TargetAllocator for WgpuTargetAllocator {
    type Surface = GpuCaptureTarget;

    fn allocate(&mut self, desc: &TargetDescriptor) -> GpuCaptureTarget {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Portal Capture Color Texture"),
            size: wgpu::Extent3d {
                width: desc.size,
                height: desc.size,
                depth_or_array_layers: 1,
            },
            // No mip chain: the capture is shown on screen directly.
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Portal Capture Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        GpuCaptureTarget {
            texture,
            view,
            sampler,
            size: desc.size,
            clear_color: desc.clear_color,
        }
    }
}
