// MODEL: Scene state and data
pub mod camera;
pub mod sky;
pub mod water;
pub mod scene;

pub use camera::Camera;
pub use sky::Sky;
pub use water::Water;
pub use scene::Scene;
