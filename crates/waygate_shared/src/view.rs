use std::f32::consts::PI;

use glam::{Mat3, Mat4, Quat};

use crate::clip::{clip_plane, ClipPlane};
use crate::optics::bend_pose;
use crate::pose::Pose;
use crate::surface::{PortalConfig, PortalKind, PortalSurface};

/// Capture camera state for one frame, ready to hand to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalView {
    pub pose: Pose,
    pub clip_plane: ClipPlane,
    pub projection: Mat4,
    pub total_reflection: bool,
}

/// Re-expresses `pose` from the source portal's frame into the linked
/// portal's frame. The half-turn about the portal up axis makes a viewer
/// looking into the source see out of the destination instead of a
/// mirrored reflection.
pub fn through_pair(pose: &Pose, source: &PortalSurface, dest: &PortalSurface) -> Pose {
    let rotation = dest.basis() * Mat3::from_rotation_y(PI) * source.basis().transpose();
    Pose {
        position: dest.position + rotation * (pose.position - source.position),
        rotation: Quat::from_mat3(&rotation) * pose.rotation,
    }
}

/// Full per-frame solve: refraction bend, re-projection through the pair,
/// occlusion clip plane. The projection matrix passes through untouched.
pub fn solve(
    watcher: &Pose,
    config: &PortalConfig,
    source: &PortalSurface,
    dest: &PortalSurface,
    projection: Mat4,
    clip_offset: f32,
) -> PortalView {
    let (bent, total_reflection) = bend_pose(watcher, source, config);
    let pose = through_pair(&bent, source, dest);

    let clip_target = if config.kind == PortalKind::Portal {
        dest
    } else {
        source
    };
    let clip_plane = clip_plane(config, clip_target, clip_offset);

    PortalView {
        pose,
        clip_plane,
        projection,
        total_reflection,
    }
}
