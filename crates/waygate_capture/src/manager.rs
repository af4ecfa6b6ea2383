use std::sync::Arc;

use tracing::{debug, info};
use waygate_shared::resolution::ResolutionPolicy;

use crate::target::{TargetAllocator, TargetDescriptor};

/// Minimum size delta before the surface is reallocated, so small distance
/// jitter never thrashes the target.
pub const RESIZE_HYSTERESIS: u32 = 32;

/// Owns the published capture surface and applies the resolution policy
/// with hysteresis. Surfaces are replaced construct-then-swap behind an
/// `Arc`, never resized in place, so an in-flight capture keeps the old
/// surface alive until it finishes.
pub struct RenderTargetManager<A: TargetAllocator> {
    allocator: A,
    policy: ResolutionPolicy,
    hysteresis: u32,
    cached_size: u32,
    last_distance: f32,
    surface: Option<Arc<A::Surface>>,
}

impl<A: TargetAllocator> RenderTargetManager<A> {
    pub fn new(allocator: A, policy: ResolutionPolicy) -> Self {
        Self {
            allocator,
            policy,
            hysteresis: RESIZE_HYSTERESIS,
            cached_size: 0,
            last_distance: 0.0,
            surface: None,
        }
    }

    pub fn with_hysteresis(mut self, hysteresis: u32) -> Self {
        self.hysteresis = hysteresis;
        self
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.surface.is_some()
    }

    /// Allocates the first surface, cleared to the bootstrap color.
    /// Does nothing once a surface exists.
    pub fn ensure_bootstrapped(&mut self, distance: f32, viewport: Option<(u32, u32)>) {
        if self.surface.is_some() {
            return;
        }

        let size = self.policy.render_size(distance, viewport);
        let surface = self.allocator.allocate(&TargetDescriptor::bootstrap(size));
        self.surface = Some(Arc::new(surface));
        self.cached_size = size;
        self.last_distance = distance;
        debug!(size, distance, "bootstrapped capture target");
    }

    /// Republishes a new surface only when the desired size moves past the
    /// hysteresis threshold; otherwise the current handle is untouched.
    pub fn update_for_distance(&mut self, distance: f32, viewport: Option<(u32, u32)>) {
        let desired = self.policy.render_size(distance, viewport);
        if desired.abs_diff(self.cached_size) > self.hysteresis {
            info!(
                "resizing portal capture target: {} -> {} (distance: {:.1})",
                self.cached_size, desired, distance
            );
            let surface = self.allocator.allocate(&TargetDescriptor::steady(desired));
            self.surface = Some(Arc::new(surface));
            self.cached_size = desired;
        }
        self.last_distance = distance;
    }

    pub fn surface(&self) -> Option<&Arc<A::Surface>> {
        self.surface.as_ref()
    }

    pub fn cached_size(&self) -> u32 {
        self.cached_size
    }

    pub fn last_distance(&self) -> f32 {
        self.last_distance
    }
}
