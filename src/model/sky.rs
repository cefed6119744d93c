use glam::Vec3;

use crate::config::SkyConfig;

/// Unit sun vector from elevation above the horizon and azimuth, both in
/// degrees. Azimuth 0 points along +Z, 180 along -Z.
pub fn sun_direction(elevation_deg: f32, azimuth_deg: f32) -> Vec3 {
    let phi = (90.0 - elevation_deg).to_radians();
    let theta = azimuth_deg.to_radians();
    Vec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos())
}

/// Parameters of the analytic (Preetham) sky. Set once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Sky {
    pub sun_position: Vec3,
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
}

impl Sky {
    pub fn new(config: &SkyConfig) -> Self {
        Self {
            sun_position: sun_direction(config.elevation_deg, config.azimuth_deg),
            turbidity: config.turbidity,
            rayleigh: config.rayleigh,
            mie_coefficient: config.mie_coefficient,
            mie_directional_g: config.mie_directional_g,
        }
    }

    pub fn params(&self) -> [f32; 4] {
        [self.turbidity, self.rayleigh, self.mie_coefficient, self.mie_directional_g]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sun_sits_low_in_the_south() {
        let sun = sun_direction(3.0, 180.0);
        let expected = Vec3::new(0.0, 3f32.to_radians().sin(), -3f32.to_radians().cos());
        assert!((sun - expected).length() < 1e-5, "{sun:?}");
        assert!((sun.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zenith_sun_points_up() {
        let sun = sun_direction(90.0, 42.0);
        assert!((sun - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn sky_from_config_keeps_scattering_params() {
        let sky = Sky::new(&SkyConfig::default());
        assert_eq!(sky.params(), [2.0, 1.0, 0.005, 0.8]);
        assert!(sky.sun_position.y > 0.0);
    }
}
