use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window},
};
use std::sync::Arc;

use skywater::{
    logging, AppError, SceneConfig,
    controller::{input::native, CameraControls, FrameLoopContext, InputDispatcher, InputEvent},
    view::{GpuContext, SceneRenderer},
};

struct App {
    window: Arc<Window>,
    renderer: SceneRenderer,
    frame_ctx: FrameLoopContext,
    dispatcher: InputDispatcher,
    egui_state: egui_winit::State,
}

impl App {
    async fn new(window: Arc<Window>, config: &SceneConfig) -> Result<Self, AppError> {
        let gpu = GpuContext::new_native(window.clone()).await?;
        let (width, height) = (gpu.config.width, gpu.config.height);

        let frame_ctx = FrameLoopContext::new(config, width, height);
        let renderer = SceneRenderer::new(gpu, &frame_ctx.scene, config.exposure);
        let dispatcher = frame_ctx.input_dispatcher();

        let egui_state = egui_winit::State::new(
            frame_ctx.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        tracing::info!(width, height, "scene ready");
        Ok(Self { window, renderer, frame_ctx, dispatcher, egui_state })
    }

    fn is_locked(&self) -> bool {
        self.frame_ctx.controls.borrow().is_locked()
    }

    /// Grab the cursor. Not every platform supports `Locked`, fall back to
    /// `Confined` and rely on raw mouse motion either way.
    fn lock_pointer(&mut self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                self.window.set_cursor_visible(false);
                self.dispatcher.dispatch(&InputEvent::PointerLockChanged { locked: true });
            }
            Err(err) => tracing::warn!(%err, "cursor grab failed"),
        }
    }

    fn release_pointer(&mut self) {
        if let Err(err) = self.window.set_cursor_grab(CursorGrabMode::None) {
            tracing::warn!(%err, "cursor release failed");
        }
        self.window.set_cursor_visible(true);
        self.dispatcher.dispatch(&InputEvent::PointerLockChanged { locked: false });
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        // Let egui see the event first; the debug window is draggable
        let egui_captured = self.egui_state.on_window_event(self.window.as_ref(), event).consumed;
        if egui_captured && !self.is_locked() {
            return true;
        }

        match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state, physical_key, .. }, .. } => {
                if *physical_key == PhysicalKey::Code(KeyCode::Escape)
                    && *state == ElementState::Pressed
                    && self.is_locked()
                {
                    self.release_pointer();
                }
                if let Some(input) = native::key_event_to_input(physical_key, *state) {
                    self.dispatcher.dispatch(&input);
                }
                true
            }
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                if !self.is_locked() {
                    self.lock_pointer();
                }
                true
            }
            WindowEvent::Focused(false) => {
                if self.is_locked() {
                    self.release_pointer();
                }
                true
            }
            _ => false,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size.width, new_size.height);
            self.frame_ctx.resize(new_size.width, new_size.height);
        }
    }

    /// Draw one frame. Returns `true` when the surface error is fatal.
    fn redraw(&mut self) -> bool {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let mut output = self.frame_ctx.build_overlay(raw_input);
        let platform_output = std::mem::take(&mut output.platform_output);
        self.egui_state.handle_platform_output(&self.window, platform_output);
        self.renderer.prepare_overlay(&self.frame_ctx.egui_ctx, output);

        match self.frame_ctx.frame(&mut self.renderer) {
            Ok(()) => false,
            Err(err) => self.renderer.handle_surface_error(&err),
        }
    }
}

fn main() -> Result<(), AppError> {
    logging::init();
    let config = SceneConfig::default();

    let event_loop = EventLoop::new()?;
    let (width, height) = config.window_size;
    let window_attributes = Window::default_attributes()
        .with_title(config.window_title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(width, height));
    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut app = pollster::block_on(App::new(window, &config))?;

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => app.resize(*physical_size),
                        WindowEvent::RedrawRequested => {
                            if app.redraw() {
                                tracing::error!("surface out of memory, exiting");
                                elwt.exit();
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                app.dispatcher.dispatch(&native::mouse_motion_to_input(delta));
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
