//! Scene configuration. `Default` carries the values the scene ships with.

use glam::Vec3;

/// Key codes (W3C `KeyboardEvent.code` names) bound to camera movement
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "KeyW".to_string(),
            backward: "KeyS".to_string(),
            left: "KeyA".to_string(),
            right: "KeyD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    /// Point the camera initially looks at
    pub look_at: Vec3,
    pub fov_y_deg: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(2.0, 4.0, 10.0),
            look_at: Vec3::new(2.0, 4.0, 9.0),
            fov_y_deg: 75.0,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkyConfig {
    /// Sun height above the horizon, degrees
    pub elevation_deg: f32,
    pub azimuth_deg: f32,
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            elevation_deg: 3.0,
            azimuth_deg: 180.0,
            turbidity: 2.0,
            rayleigh: 1.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaterConfig {
    /// Edge length of the square water plane
    pub size: f32,
    pub sun_color: u32,
    pub water_color: u32,
    pub distortion_scale: f32,
    pub alpha: f32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            size: 10_000.0,
            sun_color: 0xffd8a8,
            water_color: 0x1e90ff,
            distortion_scale: 3.7,
            alpha: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovementConfig {
    /// World units per frame for each held movement key
    pub step: f32,
    /// Water phase advance per frame
    pub water_time_step: f64,
    pub pointer_speed: f32,
    pub bindings: KeyBindings,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            step: 0.1,
            water_time_step: 1.0 / 360.0,
            pointer_speed: 1.0,
            bindings: KeyBindings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub sky: SkyConfig,
    pub water: WaterConfig,
    pub movement: MovementConfig,
    pub exposure: f32,
    pub window_title: String,
    pub window_size: (u32, u32),
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            sky: SkyConfig::default(),
            water: WaterConfig::default(),
            movement: MovementConfig::default(),
            exposure: 0.5,
            window_title: "skywater".to_string(),
            window_size: (1280, 720),
        }
    }
}

/// `0xRRGGBB` to normalised RGB
pub fn rgb_from_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}
