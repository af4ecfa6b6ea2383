use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::surface::{PortalConfig, PortalKind, PortalSurface};

/// Offset along the plane normal, avoids a visible pixel seam at the
/// portal boundary.
pub const CLIP_PLANE_OFFSET: f32 = 0.3;

/// Near-clip plane handed to the renderer so geometry between the capture
/// origin and the portal surface is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipPlane {
    pub normal: Vec3,
    pub base: Vec3,
}

/// `target` is the linked surface for a true portal and the portal's own
/// surface for a mirror; the caller resolves that choice.
pub fn clip_plane(config: &PortalConfig, target: &PortalSurface, offset: f32) -> ClipPlane {
    let is_mirror = config.kind == PortalKind::Mirror;
    let sign = if is_mirror || config.exit_in_front {
        -1.0
    } else {
        1.0
    };
    let normal = -target.forward * sign;
    ClipPlane {
        normal,
        base: target.position + offset * normal,
    }
}
