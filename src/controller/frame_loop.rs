use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{KeyBindings, MovementConfig, SceneConfig};
use crate::model::{Camera, Scene};
use crate::ui::{self, Overlay};
use super::input::{InputDispatcher, InputState};
use super::pointer_lock::PointerLockControls;

/// Camera control as seen by the frame step
pub trait CameraControls {
    fn is_locked(&self) -> bool;
    /// Move along the view direction, parallel to the ground
    fn move_forward(&mut self, distance: f32);
    fn move_right(&mut self, distance: f32);
    fn camera(&self) -> &Camera;
}

/// Draws the scene. Errors belong to the renderer (lost surface etc.),
/// the frame step just hands them back.
pub trait FrameRenderer {
    type Error;

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), Self::Error>;
}

/// One tick of the scene: movement, water animation, render.
/// Called once per display refresh by whatever drives the loop.
#[derive(Debug, Clone)]
pub struct FrameStep {
    /// Distance per frame for each held movement key. No delta-time
    /// scaling: speed follows the frame rate.
    pub move_step: f32,
    pub water_time_step: f64,
    pub bindings: KeyBindings,
}

impl Default for FrameStep {
    fn default() -> Self {
        Self::new(&MovementConfig::default())
    }
}

impl FrameStep {
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            move_step: config.step,
            water_time_step: config.water_time_step,
            bindings: config.bindings.clone(),
        }
    }

    /// Each held key contributes independently. W+D moves diagonally at
    /// more than `move_step`; there is no normalisation.
    pub fn apply_movement<C: CameraControls + ?Sized>(&self, input: &InputState, controls: &mut C) {
        if !controls.is_locked() {
            return;
        }
        let d = self.move_step;
        if input.is_pressed(&self.bindings.forward) {
            controls.move_forward(d);
        }
        if input.is_pressed(&self.bindings.backward) {
            controls.move_forward(-d);
        }
        if input.is_pressed(&self.bindings.left) {
            controls.move_right(-d);
        }
        if input.is_pressed(&self.bindings.right) {
            controls.move_right(d);
        }
    }

    pub fn step<C, R>(
        &self,
        input: &InputState,
        controls: &mut C,
        scene: &mut Scene,
        renderer: &mut R,
    ) -> Result<(), R::Error>
    where
        C: CameraControls + ?Sized,
        R: FrameRenderer + ?Sized,
    {
        self.apply_movement(input, controls);
        scene.water.advance(self.water_time_step);
        renderer.render(scene, controls.camera())
    }
}

/// Scene state shared between the platform event handlers and the frame
/// callback. Everything lives on the one UI thread, hence `Rc<RefCell<_>>`.
pub struct FrameLoopContext {
    pub input_state: Rc<RefCell<InputState>>,
    pub controls: Rc<RefCell<PointerLockControls>>,
    pub overlay: Rc<RefCell<Overlay>>,
    pub scene: Scene,
    pub frame_step: FrameStep,
    pub egui_ctx: egui::Context,
}

impl FrameLoopContext {
    pub fn new(config: &SceneConfig, width: u32, height: u32) -> Self {
        let camera = Camera::from_config(&config.camera, width, height);
        let mut controls = PointerLockControls::new(camera);
        controls.pointer_speed = config.movement.pointer_speed;

        Self {
            input_state: Rc::new(RefCell::new(InputState::new())),
            controls: Rc::new(RefCell::new(controls)),
            overlay: Rc::new(RefCell::new(Overlay::new())),
            scene: Scene::new(config),
            frame_step: FrameStep::new(&config.movement),
            egui_ctx: egui::Context::default(),
        }
    }

    /// Dispatcher with the key tracker and the camera controls registered.
    /// Lock transitions reported by the controls toggle the overlay.
    pub fn input_dispatcher(&self) -> InputDispatcher {
        let mut dispatcher = InputDispatcher::new();

        let input_state = self.input_state.clone();
        dispatcher.register(move |event| input_state.borrow_mut().process_event(event));

        let controls = self.controls.clone();
        let overlay = self.overlay.clone();
        dispatcher.register(move |event| {
            let transition = controls.borrow_mut().process_event(event);
            if let Some(transition) = transition {
                tracing::info!(?transition, "pointer lock changed");
                overlay.borrow_mut().apply(transition);
            }
        });

        dispatcher
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.controls.borrow_mut().camera_mut().set_aspect(width, height);
    }

    pub fn build_overlay(&self, raw_input: egui::RawInput) -> egui::FullOutput {
        let controls = self.controls.borrow();
        ui::build_ui(
            &self.egui_ctx,
            raw_input,
            &self.overlay.borrow(),
            controls.camera(),
            &self.scene,
        )
    }

    /// Run one frame step against the shared state
    pub fn frame<R: FrameRenderer + ?Sized>(&mut self, renderer: &mut R) -> Result<(), R::Error> {
        let input = self.input_state.borrow();
        let mut controls = self.controls.borrow_mut();
        self.frame_step.step(&input, &mut *controls, &mut self.scene, renderer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::controller::PointerLockControls;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Move {
        Forward(f32),
        Right(f32),
    }

    struct RecordingControls {
        locked: bool,
        moves: Vec<Move>,
        camera: Camera,
    }

    impl RecordingControls {
        fn new(locked: bool) -> Self {
            Self { locked, moves: Vec::new(), camera: Camera::new(800, 600) }
        }
    }

    impl CameraControls for RecordingControls {
        fn is_locked(&self) -> bool { self.locked }
        fn move_forward(&mut self, distance: f32) { self.moves.push(Move::Forward(distance)); }
        fn move_right(&mut self, distance: f32) { self.moves.push(Move::Right(distance)); }
        fn camera(&self) -> &Camera { &self.camera }
    }

    #[derive(Default)]
    struct CountingRenderer {
        frames: usize,
        last_water_time: f64,
    }

    impl FrameRenderer for CountingRenderer {
        type Error = ();

        fn render(&mut self, scene: &Scene, _camera: &Camera) -> Result<(), ()> {
            self.frames += 1;
            self.last_water_time = scene.water.time;
            Ok(())
        }
    }

    fn scene() -> Scene {
        Scene::new(&SceneConfig::default())
    }

    fn pressed(keys: &[&str]) -> InputState {
        let mut input = InputState::new();
        for k in keys {
            input.on_key_down(k);
        }
        input
    }

    #[test]
    fn unlocked_never_moves() {
        let step = FrameStep::default();
        let input = pressed(&["KeyW", "KeyA", "KeyS", "KeyD"]);
        let mut controls = RecordingControls::new(false);
        let mut scene = scene();
        let mut renderer = CountingRenderer::default();

        for _ in 0..50 {
            step.step(&input, &mut controls, &mut scene, &mut renderer).unwrap();
        }
        assert!(controls.moves.is_empty());
        assert_eq!(renderer.frames, 50);
    }

    #[test]
    fn unlocked_real_controls_keep_pose() {
        let step = FrameStep::default();
        let input = pressed(&["KeyW", "KeyD"]);
        let mut controls = PointerLockControls::new(Camera::new(800, 600));
        let start = controls.camera().eye;
        let mut scene = scene();
        let mut renderer = CountingRenderer::default();

        for _ in 0..10 {
            step.step(&input, &mut controls, &mut scene, &mut renderer).unwrap();
        }
        assert_eq!(controls.camera().eye, start);
    }

    #[test]
    fn forward_key_moves_exactly_one_step() {
        let step = FrameStep::default();
        let input = pressed(&["KeyW"]);
        let mut controls = RecordingControls::new(true);
        let mut renderer = CountingRenderer::default();

        step.step(&input, &mut controls, &mut scene(), &mut renderer).unwrap();
        assert_eq!(controls.moves, vec![Move::Forward(0.1)]);
    }

    #[test]
    fn each_key_maps_to_its_direction() {
        let step = FrameStep::default();
        let cases = [
            ("KeyW", Move::Forward(0.1)),
            ("KeyS", Move::Forward(-0.1)),
            ("KeyA", Move::Right(-0.1)),
            ("KeyD", Move::Right(0.1)),
        ];
        for (key, expected) in cases {
            let mut controls = RecordingControls::new(true);
            step.apply_movement(&pressed(&[key]), &mut controls);
            assert_eq!(controls.moves, vec![expected], "key {key}");
        }
    }

    #[test]
    fn diagonal_moves_are_additive() {
        let step = FrameStep::default();
        let input = pressed(&["KeyW", "KeyD"]);
        let mut controls = RecordingControls::new(true);

        step.apply_movement(&input, &mut controls);
        assert_eq!(controls.moves, vec![Move::Forward(0.1), Move::Right(0.1)]);
    }

    #[test]
    fn released_keys_do_not_move() {
        let step = FrameStep::default();
        let mut input = pressed(&["KeyW"]);
        input.on_key_up("KeyW");
        let mut controls = RecordingControls::new(true);

        step.apply_movement(&input, &mut controls);
        assert!(controls.moves.is_empty());
    }

    #[test]
    fn water_phase_advances_regardless_of_lock() {
        let step = FrameStep::default();
        let input = InputState::new();
        let mut scene = scene();
        let mut renderer = CountingRenderer::default();

        let mut unlocked = RecordingControls::new(false);
        for _ in 0..180 {
            step.step(&input, &mut unlocked, &mut scene, &mut renderer).unwrap();
        }
        let mut locked = RecordingControls::new(true);
        for _ in 0..180 {
            step.step(&input, &mut locked, &mut scene, &mut renderer).unwrap();
        }

        assert!((scene.water.time - 1.0).abs() < 1e-4, "time = {}", scene.water.time);
        assert_eq!(renderer.frames, 360);
    }

    #[test]
    fn water_phase_never_stalls() {
        let step = FrameStep::default();
        let input = InputState::new();
        let mut scene = scene();
        scene.water.time = 65536.0;
        let mut renderer = CountingRenderer::default();

        for _ in 0..360 {
            step.step(&input, &mut RecordingControls::new(false), &mut scene, &mut renderer).unwrap();
        }
        assert!((scene.water.time - 65537.0).abs() < 1e-6, "time = {}", scene.water.time);
        assert!((renderer.last_water_time - 65537.0).abs() < 1e-6);
    }

    #[test]
    fn render_sees_the_advanced_phase() {
        let step = FrameStep::default();
        let mut scene = scene();
        let mut renderer = CountingRenderer::default();

        step.step(&InputState::new(), &mut RecordingControls::new(true), &mut scene, &mut renderer).unwrap();
        assert_eq!(renderer.frames, 1);
        assert_eq!(renderer.last_water_time, 1.0 / 360.0);
    }

    #[test]
    fn locked_walk_moves_real_camera() {
        let step = FrameStep::default();
        let input = pressed(&["KeyW"]);
        let mut controls = PointerLockControls::new(Camera::new(800, 600));
        controls.lock();
        let start = controls.camera().eye;
        let mut scene = scene();
        let mut renderer = CountingRenderer::default();

        for _ in 0..10 {
            step.step(&input, &mut controls, &mut scene, &mut renderer).unwrap();
        }
        let moved = controls.camera().eye - start;
        assert!((moved.length() - 1.0).abs() < 1e-4);
        assert!(moved.z < 0.0);
    }

    #[test]
    fn renderer_errors_pass_through() {
        struct Failing;
        impl FrameRenderer for Failing {
            type Error = &'static str;
            fn render(&mut self, _: &Scene, _: &Camera) -> Result<(), &'static str> {
                Err("surface lost")
            }
        }

        let step = FrameStep::default();
        let mut scene = scene();
        let result = step.step(&InputState::new(), &mut RecordingControls::new(false), &mut scene, &mut Failing);
        assert_eq!(result, Err("surface lost"));
        assert_eq!(scene.water.time, 1.0 / 360.0);
    }

    #[test]
    fn dispatched_events_drive_a_frame() {
        use crate::controller::InputEvent;

        let mut ctx = FrameLoopContext::new(&SceneConfig::default(), 800, 600);
        let mut dispatcher = ctx.input_dispatcher();
        let mut renderer = CountingRenderer::default();
        let start = ctx.controls.borrow().camera().eye;

        dispatcher.dispatch(&InputEvent::KeyDown("KeyW".into()));
        ctx.frame(&mut renderer).unwrap();
        assert_eq!(ctx.controls.borrow().camera().eye, start);
        assert!(ctx.overlay.borrow().is_visible());

        dispatcher.dispatch(&InputEvent::PointerLockChanged { locked: true });
        assert!(!ctx.overlay.borrow().is_visible());
        ctx.frame(&mut renderer).unwrap();
        let eye = ctx.controls.borrow().camera().eye;
        assert!((eye - (start + glam::Vec3::new(0.0, 0.0, -0.1))).length() < 1e-5);

        dispatcher.dispatch(&InputEvent::KeyUp("KeyW".into()));
        dispatcher.dispatch(&InputEvent::PointerLockChanged { locked: false });
        assert!(ctx.overlay.borrow().is_visible());
        ctx.frame(&mut renderer).unwrap();
        assert_eq!(ctx.controls.borrow().camera().eye, eye);

        assert_eq!(renderer.frames, 3);
        assert!((ctx.scene.water.time - 3.0 / 360.0).abs() < 1e-6);
    }

    #[test]
    fn mouse_motion_turns_only_while_locked() {
        use crate::controller::InputEvent;

        let ctx = FrameLoopContext::new(&SceneConfig::default(), 800, 600);
        let mut dispatcher = ctx.input_dispatcher();
        let yaw = ctx.controls.borrow().camera().yaw;

        dispatcher.dispatch(&InputEvent::MouseMove { dx: 50.0, dy: 0.0 });
        assert_eq!(ctx.controls.borrow().camera().yaw, yaw);

        dispatcher.dispatch(&InputEvent::PointerLockChanged { locked: true });
        dispatcher.dispatch(&InputEvent::MouseMove { dx: 50.0, dy: 0.0 });
        assert!(ctx.controls.borrow().camera().yaw > yaw);
    }

    #[test]
    fn overlay_builds_without_a_gpu() {
        let ctx = FrameLoopContext::new(&SceneConfig::default(), 800, 600);
        let output = ctx.build_overlay(crate::ui::raw_input(800, 600, 1.0));
        assert!(!output.shapes.is_empty());
    }
}
