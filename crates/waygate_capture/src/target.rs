/// Capture targets are cleared to blue before the first real capture lands,
/// which makes a never-rendered surface obvious on screen.
pub const BOOTSTRAP_CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 1.0,
    a: 1.0,
};
pub const STEADY_CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Description of one square capture surface. Filtering is bilinear,
/// addressing clamps on both axes, and no mip chain is generated; those
/// are fixed by the allocator, not configurable here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetDescriptor {
    pub size: u32,
    pub format: wgpu::TextureFormat,
    pub clear_color: wgpu::Color,
}

impl TargetDescriptor {
    pub fn bootstrap(size: u32) -> Self {
        Self {
            size,
            format: TARGET_FORMAT,
            clear_color: BOOTSTRAP_CLEAR_COLOR,
        }
    }

    pub fn steady(size: u32) -> Self {
        Self {
            size,
            format: TARGET_FORMAT,
            clear_color: STEADY_CLEAR_COLOR,
        }
    }
}

/// Seam between the target manager and the graphics backend. The real
/// implementation allocates wgpu textures; tests substitute a fake.
pub trait TargetAllocator {
    type Surface;

    fn allocate(&mut self, desc: &TargetDescriptor) -> Self::Surface;
}

/// Viewport dimensions when the windowing layer can report them. `None`
/// skips the screen-size clamp on the resolution policy.
pub trait ViewportQuery {
    fn current_size(&self) -> Option<(u32, u32)>;
}
