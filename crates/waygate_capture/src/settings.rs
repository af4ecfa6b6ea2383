use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;
use waygate_shared::clip::CLIP_PLANE_OFFSET;
use waygate_shared::resolution::{
    ResolutionPolicy, FAR_DISTANCE, MAX_TARGET_SIZE, MIN_TARGET_SIZE, NEAR_DISTANCE,
};

use crate::manager::RESIZE_HYSTERESIS;

const MIN_SIZE_FLOOR: u32 = 64;
const MAX_SIZE_CEILING: u32 = 4096;
const MAX_HYSTERESIS: u32 = 512;
const MAX_CLIP_OFFSET: f32 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    #[serde(default = "default_near_distance")]
    pub near_distance: f32,
    #[serde(default = "default_far_distance")]
    pub far_distance: f32,
    #[serde(default = "default_min_target_size")]
    pub min_target_size: u32,
    #[serde(default = "default_max_target_size")]
    pub max_target_size: u32,
    #[serde(default = "default_resize_hysteresis")]
    pub resize_hysteresis: u32,
    #[serde(default = "default_clip_offset")]
    pub clip_offset: f32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            near_distance: default_near_distance(),
            far_distance: default_far_distance(),
            min_target_size: default_min_target_size(),
            max_target_size: default_max_target_size(),
            resize_hysteresis: default_resize_hysteresis(),
            clip_offset: default_clip_offset(),
        }
    }
}

impl CaptureSettings {
    pub fn sanitize(mut self) -> Self {
        self.near_distance = self.near_distance.max(0.0);
        if self.far_distance <= self.near_distance {
            self.far_distance = self.near_distance + 1.0;
        }
        self.min_target_size = self
            .min_target_size
            .clamp(MIN_SIZE_FLOOR, MAX_SIZE_CEILING)
            .next_power_of_two();
        self.max_target_size = self
            .max_target_size
            .clamp(self.min_target_size, MAX_SIZE_CEILING)
            .next_power_of_two();
        self.resize_hysteresis = self.resize_hysteresis.min(MAX_HYSTERESIS);
        self.clip_offset = self.clip_offset.clamp(0.0, MAX_CLIP_OFFSET);
        self
    }

    pub fn policy(&self) -> ResolutionPolicy {
        ResolutionPolicy {
            near_distance: self.near_distance,
            far_distance: self.far_distance,
            min_size: self.min_target_size,
            max_size: self.max_target_size,
        }
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let parsed = toml::from_str::<Self>(&contents).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to deserialize capture settings: {e}"),
            )
        })?;
        Ok(parsed.sanitize())
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let settings = self.clone().sanitize();
        let serialized = toml::to_string_pretty(&settings).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to serialize capture settings: {e}"),
            )
        })?;
        fs::write(path, serialized)
    }
}

pub fn load_or_create_settings(path: &Path) -> CaptureSettings {
    match CaptureSettings::load(path) {
        Ok(settings) => settings,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let settings = CaptureSettings::default();
            if let Err(save_err) = settings.save(path) {
                warn!(
                    "Failed to create default capture settings at {}: {save_err}",
                    path.display()
                );
            }
            settings
        }
        Err(err) => {
            warn!(
                "Failed to load capture settings from {}: {err}",
                path.display()
            );
            CaptureSettings::default()
        }
    }
}

fn default_near_distance() -> f32 {
    NEAR_DISTANCE
}

fn default_far_distance() -> f32 {
    FAR_DISTANCE
}

fn default_min_target_size() -> u32 {
    MIN_TARGET_SIZE
}

fn default_max_target_size() -> u32 {
    MAX_TARGET_SIZE
}

fn default_resize_hysteresis() -> u32 {
    RESIZE_HYSTERESIS
}

fn default_clip_offset() -> f32 {
    CLIP_PLANE_OFFSET
}
