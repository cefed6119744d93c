// VIEW: GPU setup and rendering
pub mod render;
pub mod gpu_init;

pub use render::{FrameUniform, OverlayFrame, SceneRenderer};
pub use gpu_init::GpuContext;
