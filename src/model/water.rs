use glam::Vec3;

use crate::config::{rgb_from_hex, WaterConfig};

/// Animated water plane at y = 0, lit by the sky's sun. `time` drives the
/// wave normals in the water shader and only ever grows; it is kept in
/// `f64` so the per-frame increment never rounds away.
#[derive(Debug, Clone, PartialEq)]
pub struct Water {
    pub size: f32,
    pub time: f64,
    pub sun_color: Vec3,
    pub water_color: Vec3,
    pub distortion_scale: f32,
    pub alpha: f32,
}

impl Water {
    pub fn new(config: &WaterConfig) -> Self {
        Self {
            size: config.size,
            time: 0.0,
            sun_color: rgb_from_hex(config.sun_color),
            water_color: rgb_from_hex(config.water_color),
            distortion_scale: config.distortion_scale,
            alpha: config.alpha,
        }
    }

    pub fn advance(&mut self, step: f64) {
        self.time += step;
    }
}
