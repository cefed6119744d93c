// CONTROLLER: Input, camera controls and the per-frame step
pub mod input;
pub mod pointer_lock;
pub mod frame_loop;

pub use input::{InputDispatcher, InputEvent, InputState};
pub use pointer_lock::{LockState, LockTransition, PointerLockControls};
pub use frame_loop::{CameraControls, FrameLoopContext, FrameRenderer, FrameStep};
