use glam::{Quat, Vec3};
use tracing::debug;

use crate::pose::{yaw_only, Pose};
use crate::surface::{PortalConfig, PortalSurface};

/// Outcome of Snell's law for one incident ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Refraction {
    /// Transmitted ray, with the refraction angle in radians.
    Transmitted(f32),
    /// No transmitted ray; the surface acts as a mirror this frame.
    TotalReflection,
}

/// Angle in radians between the portal normal and the ray from the portal
/// midpoint to `point`.
pub fn incidence_angle(point: Vec3, portal_mid: Vec3, portal_normal: Vec3) -> f32 {
    let to_point = (point - portal_mid).normalize_or_zero();
    let normal = portal_normal.normalize_or_zero();
    to_point.dot(normal).clamp(-1.0, 1.0).acos()
}

/// n1 * sin(theta1) = n2 * sin(theta2). Returns `TotalReflection` when the
/// implied sin(theta2) leaves [-1, 1].
pub fn refraction_angle(incidence: f32, n_front: f32, n_back: f32) -> Refraction {
    let sin_refracted = n_front / n_back * incidence.sin();
    if sin_refracted.abs() > 1.0 {
        Refraction::TotalReflection
    } else {
        Refraction::Transmitted(sin_refracted.asin())
    }
}

/// Bends the watcher pose around the portal midpoint to simulate the view
/// refracting through the surface. The returned flag reports total internal
/// reflection; it is recomputed every frame and never sticky.
pub fn bend_pose(pose: &Pose, surface: &PortalSurface, config: &PortalConfig) -> (Pose, bool) {
    if !config.refracts() {
        return (*pose, false);
    }

    let mid = surface.middle_point;
    let normal = surface.forward;
    let theta_in = incidence_angle(pose.position, mid, normal);
    let theta_out =
        match refraction_angle(theta_in, config.refractive_front, config.refractive_back) {
            Refraction::Transmitted(angle) => angle,
            Refraction::TotalReflection => {
                debug!(
                    incidence = theta_in,
                    "total internal reflection, capture falls back to mirror behavior"
                );
                return (*pose, true);
            }
        };

    // Incidence plane through the watcher, the midpoint and a point along
    // the normal. Its unit normal is the axis the view pivots around.
    let plane_normal = (mid - pose.position)
        .cross(mid + normal - pose.position)
        .normalize_or_zero();
    if plane_normal == Vec3::ZERO {
        // Watcher sits on the portal axis: incidence is zero, nothing to bend.
        return (*pose, false);
    }

    let bend = Quat::from_axis_angle(plane_normal, theta_in - theta_out);
    let position = mid + bend * (pose.position - mid);

    // The camera turns under refraction but never tilts: only the yaw
    // component of the bend reaches the final orientation.
    let rotation = yaw_only(bend) * pose.rotation;

    (Pose { position, rotation }, false)
}
