use egui::Context;

use crate::controller::LockTransition;
use crate::model::{Camera, Scene};

/// Instructions shown while the pointer is free. Visible at startup,
/// hidden on lock, shown again on unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    visible: bool,
}

impl Default for Overlay {
    fn default() -> Self {
        Self { visible: true }
    }
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn apply(&mut self, transition: LockTransition) {
        self.visible = match transition {
            LockTransition::Locked => false,
            LockTransition::Unlocked => true,
        };
    }
}

/// Raw input for frames where egui only paints (web canvas)
pub fn raw_input(width: u32, height: u32, pixels_per_point: f32) -> egui::RawInput {
    let mut raw_input = egui::RawInput::default();
    raw_input.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::new(0.0, 0.0),
        egui::vec2(width as f32 / pixels_per_point, height as f32 / pixels_per_point),
    ));
    raw_input
}

/// Build the overlay and return egui output
pub fn build_ui(
    egui_ctx: &Context,
    raw_input: egui::RawInput,
    overlay: &Overlay,
    camera: &Camera,
    scene: &Scene,
) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        if overlay.is_visible() {
            draw_blocker(ctx);
            draw_instructions(ctx);
            draw_debug_window(ctx, camera, scene);
        }
    })
}

fn draw_blocker(ctx: &Context) {
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Background, egui::Id::new("blocker")));
    painter.rect_filled(
        ctx.available_rect(),
        0.0,
        egui::Color32::from_black_alpha(128),
    );
}

fn draw_instructions(ctx: &Context) {
    egui::Area::new(egui::Id::new("instructions"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new("Click to play")
                        .size(36.0)
                        .color(egui::Color32::WHITE),
                );
                ui.add_space(8.0);
                ui.label(egui::RichText::new("Move: WASD").size(14.0).color(egui::Color32::WHITE));
                ui.label(egui::RichText::new("Look: MOUSE").size(14.0).color(egui::Color32::WHITE));
                ui.label(egui::RichText::new("Release: ESC").size(14.0).color(egui::Color32::WHITE));
            });
        });
}

fn draw_debug_window(ctx: &Context, camera: &Camera, scene: &Scene) {
    let eye = camera.eye;
    egui::Window::new("Debug")
        .default_pos([8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(egui::RichText::new(format!("Pos: x: {:.1} y: {:.1} z: {:.1}", eye.x, eye.y, eye.z)).small());
            ui.label(
                egui::RichText::new(format!(
                    "Yaw: {:.1} Pitch: {:.1}",
                    camera.yaw.to_degrees(),
                    camera.pitch.to_degrees()
                ))
                .small(),
            );
            ui.label(egui::RichText::new(format!("Water phase: {:.2}", scene.water.time)).small());
        });
}
