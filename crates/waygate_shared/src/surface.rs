use std::collections::HashMap;

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalKind {
    Mirror,
    Portal,
}

/// Non-owning handle to a portal surface. Linked portals reference each
/// other through these ids, resolved via [`PortalRegistry`], so an A<->B
/// link never forms an ownership cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortalId(pub u32);

/// World-space geometry of one portal surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortalSurface {
    pub position: Vec3,
    /// Unit normal on the front face.
    pub forward: Vec3,
    pub up: Vec3,
    /// Center of the visible opening; the refraction pivot.
    pub middle_point: Vec3,
}

impl PortalSurface {
    pub fn new(position: Vec3, forward: Vec3, up: Vec3) -> Self {
        Self {
            position,
            forward,
            up,
            middle_point: position,
        }
    }

    pub fn with_middle_point(mut self, middle_point: Vec3) -> Self {
        self.middle_point = middle_point;
        self
    }

    pub fn right(&self) -> Vec3 {
        safe_normalize(self.up.cross(self.forward), Vec3::X)
    }

    pub fn basis(&self) -> Mat3 {
        Mat3::from_cols(
            self.right(),
            safe_normalize(self.up, Vec3::Y),
            safe_normalize(self.forward, Vec3::Z),
        )
    }
}

/// Optical and pairing configuration of a portal capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortalConfig {
    pub kind: PortalKind,
    pub linked: Option<PortalId>,
    pub exit_in_front: bool,
    pub weight: f32,
    /// Refractive index of the medium in front of the surface.
    pub refractive_front: f32,
    /// Refractive index of the medium behind the surface.
    pub refractive_back: f32,
}

impl PortalConfig {
    pub fn new(kind: PortalKind, linked: Option<PortalId>, exit_in_front: bool, weight: f32) -> Self {
        Self {
            kind,
            linked,
            // Only a true portal can exit in front of its linked surface.
            exit_in_front: exit_in_front && kind == PortalKind::Portal,
            weight: weight.max(0.0),
            refractive_front: 1.0,
            refractive_back: 1.0,
        }
    }

    pub fn with_refractive_indices(mut self, front: f32, back: f32) -> Self {
        self.refractive_front = front;
        self.refractive_back = back;
        self
    }

    pub fn refracts(&self) -> bool {
        self.kind != PortalKind::Mirror && self.refractive_front != self.refractive_back
    }
}

#[derive(Debug, Default)]
pub struct PortalRegistry {
    surfaces: HashMap<PortalId, PortalSurface>,
    next_id: u32,
}

impl PortalRegistry {
    pub fn insert(&mut self, surface: PortalSurface) -> PortalId {
        let id = PortalId(self.next_id);
        self.next_id += 1;
        self.surfaces.insert(id, surface);
        id
    }

    /// Inserts or replaces a surface under a host-chosen id. Lets the scene
    /// graph register a portal after captures already hold its id.
    pub fn register(&mut self, id: PortalId, surface: PortalSurface) {
        self.next_id = self.next_id.max(id.0 + 1);
        self.surfaces.insert(id, surface);
    }

    pub fn get(&self, id: PortalId) -> Option<&PortalSurface> {
        self.surfaces.get(&id)
    }

    pub fn remove(&mut self, id: PortalId) -> Option<PortalSurface> {
        self.surfaces.remove(&id)
    }

    pub fn contains(&self, id: PortalId) -> bool {
        self.surfaces.contains_key(&id)
    }
}

pub(crate) fn safe_normalize(v: Vec3, fallback: Vec3) -> Vec3 {
    let n = v.normalize_or_zero();
    if n.length_squared() > 0.0 {
        n
    } else {
        fallback
    }
}
