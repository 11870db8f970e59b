// ui.rs — 菜单、状态栏与指南针

use glam::Vec2;
use panorama_motion::{CompassListener, ControlMode, PanoramaController, ProjectionMode};
use std::f32::consts::{PI, TAU};
use std::path::PathBuf;
use winit::window::{Fullscreen, Window};

/// Latest movement report, kept for drawing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compass {
    pub rotation_angle: f32,
    pub field_of_view: f32,
}

impl CompassListener for Compass {
    fn on_movement(&mut self, rotation_angle: f32, field_of_view: f32) {
        self.rotation_angle = rotation_angle;
        self.field_of_view = field_of_view;
    }
}

impl Compass {
    /// Heading in degrees, 0..360.
    pub fn heading_deg(&self) -> f32 {
        self.rotation_angle.rem_euclid(TAU).to_degrees()
    }
}

/// Requests that need the renderer, handled after the UI pass.
#[derive(Debug, Default)]
pub struct UiRequests {
    pub open_image: Option<PathBuf>,
    pub projection: Option<ProjectionMode>,
}

pub struct UiStatus {
    pub fps: f32,
    pub show_fps: bool,
    pub is_loading: bool,
    pub is_fullscreen: bool,
}

pub fn pick_image() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Images", &["jpg", "jpeg", "png", "bmp"])
        .pick_file()
}

pub fn toggle_fullscreen(window: &Window, status: &mut UiStatus) {
    status.is_fullscreen = !status.is_fullscreen;
    if status.is_fullscreen {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        window.set_fullscreen(None);
    }
}

pub fn draw_ui(
    ctx: &egui::Context,
    controller: &mut PanoramaController,
    compass: Compass,
    status: &mut UiStatus,
    requests: &mut UiRequests,
    window: &Window,
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            // File
            ui.menu_button("File", |ui| {
                if ui.button("Open image…").clicked() {
                    ui.close_menu();
                    requests.open_image = pick_image();
                }
                if ui.button("Exit").clicked() {
                    controller.teardown();
                    std::process::exit(0);
                }
            });

            // View
            ui.menu_button("View", |ui| {
                if ui.button("Reset view").clicked() {
                    controller.reset();
                    ui.close_menu();
                }

                let label = if status.is_fullscreen { "Exit fullscreen" } else { "Fullscreen" };
                if ui.button(label).clicked() {
                    toggle_fullscreen(window, status);
                    ui.close_menu();
                }

                ui.separator();
                ui.menu_button("Projection", |ui| {
                    let mut projection = controller.projection();
                    for mode in ProjectionMode::ALL {
                        if ui.radio_value(&mut projection, mode, mode.to_string()).clicked() {
                            ui.close_menu();
                        }
                    }
                    if projection != controller.projection() {
                        requests.projection = Some(projection);
                    }
                });

                ui.menu_button("Control", |ui| {
                    let mut control = controller.control();
                    for mode in ControlMode::ALL {
                        let text = if mode.is_supported_with(controller.projection()) {
                            mode.to_string()
                        } else {
                            format!("{mode} (motion only)")
                        };
                        if ui.radio_value(&mut control, mode, text).clicked() {
                            ui.close_menu();
                        }
                    }
                    if control != controller.control() {
                        controller.set_control_mode(control);
                    }
                });

                ui.separator();
                ui.menu_button("Pan speed", |ui| {
                    let mut speed = controller.pan_speed().x;
                    if ui
                        .add(egui::Slider::new(&mut speed, 0.001..=0.02).text("rad/pt"))
                        .changed()
                    {
                        controller.set_pan_speed(Vec2::splat(speed));
                    }
                    if ui.button("Reset 0.005").clicked() {
                        controller.set_pan_speed(panorama_motion::gesture::DEFAULT_PAN_SPEED);
                    }
                });

                ui.separator();
                if ui.checkbox(&mut status.show_fps, "Show FPS").clicked() {
                    ui.close_menu();
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if status.is_loading {
                ui.label(egui::RichText::new("Loading image…").color(egui::Color32::YELLOW));
                ui.label("|");
            }

            ui.label(format!("Projection: {}", controller.projection()));
            ui.label("|");
            ui.label(format!("Control: {}", controller.control()));
            if controller.control().includes_motion() {
                let motion = if controller.is_motion_active() { "on" } else { "off" };
                ui.label(format!("(gyro {motion})"));
            }
            ui.label("|");
            ui.label(format!("Heading: {:.1}°", compass.heading_deg()));
            ui.label("|");
            ui.label(format!("FOV: {:.1}°", compass.field_of_view.to_degrees()));

            if status.show_fps {
                ui.label("|");
                ui.label(
                    egui::RichText::new(format!("FPS: {:.1}", status.fps)).color(egui::Color32::GREEN),
                );
            }
        });
    });

    draw_compass(ctx, compass);
}

/// 圆形表盘 + 视场扇形，扇形中心指向当前朝向（顺时针为正）。
fn draw_compass(ctx: &egui::Context, compass: Compass) {
    egui::Area::new("compass")
        .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -40.0))
        .interactable(false)
        .show(ctx, |ui| {
            let size = egui::vec2(72.0, 72.0);
            let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
            let painter = ui.painter();
            let center = rect.center();
            let radius = rect.width() * 0.5 - 2.0;

            painter.circle_filled(center, radius, egui::Color32::from_black_alpha(140));

            let fov = compass.field_of_view.clamp(0.0, PI);
            let steps = 24;
            let mut points = vec![center];
            for i in 0..=steps {
                let a = compass.rotation_angle - fov / 2.0 + fov * i as f32 / steps as f32;
                points.push(center + egui::vec2(a.sin(), -a.cos()) * radius);
            }
            painter.add(egui::Shape::convex_polygon(
                points,
                egui::Color32::from_rgba_unmultiplied(255, 255, 255, 90),
                egui::Stroke::NONE,
            ));

            painter.circle_stroke(center, radius, egui::Stroke::new(1.5, egui::Color32::WHITE));
            painter.text(
                center + egui::vec2(0.0, -radius + 8.0),
                egui::Align2::CENTER_CENTER,
                "N",
                egui::FontId::proportional(11.0),
                egui::Color32::WHITE,
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_wraps_into_full_turn() {
        let mut compass = Compass::default();
        compass.on_movement(-std::f32::consts::FRAC_PI_2, 1.0);
        assert!((compass.heading_deg() - 270.0).abs() < 1e-3);
        compass.on_movement(TAU + 0.5, 1.0);
        assert!((compass.heading_deg() - 0.5f32.to_degrees()).abs() < 1e-3);
    }
}
