pub mod config;
pub mod error;
pub mod logging;
pub mod utils;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

pub use config::SceneConfig;
pub use error::AppError;

#[cfg(target_arch = "wasm32")]
use std::{cell::RefCell, rc::Rc};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};
#[cfg(target_arch = "wasm32")]
use web_sys::{Document, Event, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent, Window};

#[cfg(target_arch = "wasm32")]
use controller::{input::wasm, FrameLoopContext, InputDispatcher, InputEvent};
#[cfg(target_arch = "wasm32")]
use view::{GpuContext, SceneRenderer};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    logging::init();
    let config = SceneConfig::default();
    let (window, document, canvas) = init_canvas()?;
    setup_app(config, &window, &document, &canvas).await?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
async fn setup_app(
    config: SceneConfig,
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
) -> Result<(), AppError> {
    let (width, height) = (canvas.width(), canvas.height());
    let gpu = GpuContext::new(canvas, width, height).await?;

    let mut frame_ctx = FrameLoopContext::new(&config, width, height);
    let mut renderer = SceneRenderer::new(gpu, &frame_ctx.scene, config.exposure);
    tracing::info!(width, height, "scene ready");

    let dispatcher = Rc::new(RefCell::new(frame_ctx.input_dispatcher()));
    setup_input_listeners(document, canvas, dispatcher)
        .map_err(|e| AppError::Dom(format!("event listener setup failed: {e:?}")))?;

    let f = RcCellCallback::new(window.clone(), {
        let window = window.clone();
        let canvas = canvas.clone();

        move || {
            let (width, height) = window_size(&window);
            if (width, height) != renderer.size() && width > 0 && height > 0 {
                canvas.set_width(width);
                canvas.set_height(height);
                renderer.resize(width, height);
                frame_ctx.resize(width, height);
            }

            let output = frame_ctx.build_overlay(ui::raw_input(width, height, 1.0));
            renderer.prepare_overlay(&frame_ctx.egui_ctx, output);

            match frame_ctx.frame(&mut renderer) {
                Ok(()) => true,
                Err(err) => !renderer.handle_surface_error(&err),
            }
        }
    });
    f.start();

    Ok(())
}

/// Forward DOM events into the dispatcher
#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(
    document: &Document,
    canvas: &HtmlCanvasElement,
    dispatcher: Rc<RefCell<InputDispatcher>>,
) -> Result<(), JsValue> {
    // Keyboard down
    {
        let dispatcher = dispatcher.clone();
        let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            dispatcher.borrow_mut().dispatch(&wasm::keyboard_event_to_input(&e, true));
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }

    // Keyboard up
    {
        let dispatcher = dispatcher.clone();
        let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            dispatcher.borrow_mut().dispatch(&wasm::keyboard_event_to_input(&e, false));
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        keyup.forget();
    }

    // Mouse look, ignored by the controls while unlocked
    {
        let dispatcher = dispatcher.clone();
        let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
            dispatcher.borrow_mut().dispatch(&wasm::mouse_move_to_input(&e));
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
        mm.forget();
    }

    // Pointer lock change, also fires when the browser releases on Escape
    {
        let dispatcher = dispatcher.clone();
        let doc_pl = document.clone();
        let plc = Closure::wrap(Box::new(move |_e: Event| {
            let locked = doc_pl.pointer_lock_element().is_some();
            dispatcher.borrow_mut().dispatch(&InputEvent::PointerLockChanged { locked });
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("pointerlockchange", plc.as_ref().unchecked_ref())?;
        plc.forget();
    }

    // Canvas click to enter pointer lock
    {
        let canvas_click = canvas.clone();
        let click = Closure::wrap(Box::new(move |_e: MouseEvent| {
            if let Ok(html_el) = canvas_click.clone().dyn_into::<HtmlElement>() {
                html_el.request_pointer_lock();
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        click.forget();
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn window_size(window: &Window) -> (u32, u32) {
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32;
    (dim(window.inner_width()), dim(window.inner_height()))
}

/// Full-window canvas appended to the body
#[cfg(target_arch = "wasm32")]
fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or(js_error("no global `window`"))?;
    let document = window.document().ok_or(js_error("no document on window"))?;
    let body = document.body().ok_or(js_error("no body on document"))?;
    let canvas_el = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;
    let (width, height) = window_size(&window);
    canvas_el.set_width(width.max(1));
    canvas_el.set_height(height.max(1));
    body.append_child(&canvas_el)?;
    Ok((window, document, canvas_el))
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

/// requestAnimationFrame loop. The callback returns `false` to stop.
#[cfg(target_arch = "wasm32")]
struct RcCellCallback {
    inner: Rc<RefCell<Box<dyn FnMut() -> bool>>>,
    window: Window,
}

#[cfg(target_arch = "wasm32")]
impl RcCellCallback {
    fn new(window: Window, f: impl FnMut() -> bool + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn start(self) {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            if !inner.borrow_mut().as_mut()() {
                tracing::error!("render loop stopped");
                return;
            }

            // Schedule next frame
            if let Some(cb) = callback_clone.borrow().as_ref() {
                if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    tracing::error!(?e, "requestAnimationFrame failed");
                }
            }
        }) as Box<dyn FnMut()>));

        if let Some(cb) = callback.borrow().as_ref() {
            if let Err(e) = self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                tracing::error!(?e, "requestAnimationFrame failed");
            }
        }

        // Leak the closure to keep it alive
        std::mem::forget(callback);
    }
}
