use serde::{Deserialize, Serialize};

pub const NEAR_DISTANCE: f32 = 300.0;
pub const FAR_DISTANCE: f32 = 2000.0;
pub const MAX_TARGET_SIZE: u32 = 1024;
pub const MIN_TARGET_SIZE: u32 = 256;

/// Maps viewer distance to a square capture-target size. Pure and
/// deterministic; hysteresis lives in the target manager, not here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolutionPolicy {
    pub near_distance: f32,
    pub far_distance: f32,
    pub min_size: u32,
    pub max_size: u32,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            near_distance: NEAR_DISTANCE,
            far_distance: FAR_DISTANCE,
            min_size: MIN_TARGET_SIZE,
            max_size: MAX_TARGET_SIZE,
        }
    }
}

impl ResolutionPolicy {
    /// Lerps max->min size over [near, far], rounds up to a power of two,
    /// then clamps against the viewport's smaller dimension when known.
    pub fn render_size(&self, distance: f32, viewport: Option<(u32, u32)>) -> u32 {
        let span = (self.far_distance - self.near_distance).max(f32::EPSILON);
        let alpha = ((distance - self.near_distance) / span).clamp(0.0, 1.0);
        let blended =
            self.max_size as f32 + (self.min_size as f32 - self.max_size as f32) * alpha;
        let mut size = (blended as u32).next_power_of_two();

        if let Some((width, height)) = viewport {
            let screen = width.min(height).max(1).next_power_of_two();
            size = size.clamp(self.min_size.min(screen), screen);
        }
        size
    }
}
