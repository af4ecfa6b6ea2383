use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.rotation * Vec3::NEG_Z).normalize_or_zero()
    }

    pub fn yaw(&self) -> f32 {
        self.rotation.to_euler(EulerRot::YXZ).0
    }

    pub fn pitch(&self) -> f32 {
        self.rotation.to_euler(EulerRot::YXZ).1
    }
}

/// Keeps only the yaw component of a rotation, pitch and roll are zeroed.
pub fn yaw_only(rotation: Quat) -> Quat {
    let (yaw, _, _) = rotation.to_euler(EulerRot::YXZ);
    Quat::from_rotation_y(yaw)
}
