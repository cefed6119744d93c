use crate::config::SceneConfig;
use super::{Sky, Water};

/// Everything that is drawn besides the UI overlay
pub struct Scene {
    pub sky: Sky,
    pub water: Water,
}

impl Scene {
    pub fn new(config: &SceneConfig) -> Self {
        let sky = Sky::new(&config.sky);
        let water = Water::new(&config.water);
        Self { sky, water }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_rest_with_configured_sun() {
        let config = SceneConfig::default();
        let scene = Scene::new(&config);
        assert_eq!(scene.water.time, 0.0);
        assert_eq!(scene.water.size, config.water.size);
        assert!((scene.sky.sun_position.length() - 1.0).abs() < 1e-6);
    }
}
