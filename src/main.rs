// main.rs — 窗口、事件循环与控制器接线
//
// 拖动 / 模拟陀螺仪 → PanoramaController → Renderer，菜单和指南针由 egui 绘制。

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // 在 Release 模式下隐藏控制台窗口

mod drag;
mod renderer;
mod simulated;
mod ui;

use drag::DragTracker;
use panorama_motion::sensor::MotionSource;
use panorama_motion::{MotionSetting, MovementReport, NullMotionSource, PanoramaController, ViewerConfig};
use renderer::Renderer;
use simulated::ThreadedMotionSource;
use ui::{Compass, UiRequests, UiStatus};

use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use glam::Vec2;
use image::io::Reader as ImageReader;
use image::{GenericImageView, Rgba, RgbaImage};
use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const MIN_FOV_DEG: f32 = 20.0;
const MAX_FOV_DEG: f32 = 120.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match ViewerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(2);
        }
    };
    for warning in config.validate() {
        log::warn!("{warning}");
    }

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title("Panorama Motion")
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(e) => {
            log::error!("failed to create window: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = pollster::block_on(Renderer::new(window.clone(), config.vertical_fov_deg));

    let compass = Rc::new(RefCell::new(Compass::default()));
    let mut controller = PanoramaController::new(&config, build_motion_source(&config));
    controller.set_compass(Some(Box::new(compass.clone())));
    controller.set_movement_handler(Some(Box::new(|report: MovementReport| {
        log::trace!(
            "rotation {:.3} rad, fov {:.3} rad",
            report.rotation_angle,
            report.field_of_view
        );
    })));
    controller.sync_viewport(&renderer);
    controller.activate();

    let mut current_image = placeholder_panorama();
    controller.load_panorama(&current_image, &mut renderer);

    // 交互状态
    let clock = Instant::now();
    let mut drag = DragTracker::new(window.scale_factor());
    let mut cursor = PhysicalPosition::new(0.0, 0.0);

    // FPS 计算
    let mut last_frame_time = Instant::now();
    let mut frame_count = 0;

    let mut status = UiStatus {
        fps: 0.0,
        show_fps: false,
        is_loading: false,
        is_fullscreen: false,
    };

    // 异步加载通道
    let (tx, rx): (Sender<RgbaImage>, Receiver<RgbaImage>) = channel();
    if let Some(path) = config.image.clone() {
        status.is_loading = true;
        start_load_image(path, tx.clone());
    }

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        // 检查是否有新加载的图片
        if let Ok(rgba) = rx.try_recv() {
            controller.load_panorama(&rgba, &mut renderer);
            current_image = rgba;
            status.is_loading = false;
        }

        match event {
            Event::WindowEvent { event, .. } => {
                // 先让 egui 处理事件
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                let now = clock.elapsed().as_secs_f64();
                match event {
                    WindowEvent::CloseRequested => {
                        controller.teardown();
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                        controller.sync_viewport(&renderer);
                    }

                    WindowEvent::ScaleFactorChanged {
                        scale_factor,
                        new_inner_size,
                    } => {
                        drag.set_scale_factor(scale_factor);
                        renderer.resize(*new_inner_size);
                        controller.sync_viewport(&renderer);
                    }

                    // 键盘快捷键
                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => {
                                    if let Some(path) = ui::pick_image() {
                                        status.is_loading = true;
                                        start_load_image(path, tx.clone());
                                    }
                                }
                                Some(VirtualKeyCode::F11) => ui::toggle_fullscreen(&window, &mut status),
                                Some(VirtualKeyCode::R) => controller.reset(),
                                _ => {}
                            }
                        }
                    }

                    // 鼠标拖动
                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => {
                        let event = match state {
                            ElementState::Pressed => drag.press(to_vec2(cursor), None, now),
                            ElementState::Released => drag.release(now),
                        };
                        if let Some(event) = event {
                            controller.handle_gesture(event);
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor = position;
                        // 触摸拖动中忽略合成的光标事件
                        let event = match drag.finger() {
                            None => drag.moved(to_vec2(position), now),
                            Some(_) => None,
                        };
                        if let Some(event) = event {
                            controller.handle_gesture(event);
                        }
                    }

                    // 触摸：只跟踪第一根手指
                    WindowEvent::Touch(touch) => {
                        let position = to_vec2(touch.location);
                        let event = match touch.phase {
                            TouchPhase::Started => drag.press(position, Some(touch.id), now),
                            TouchPhase::Moved if drag.owns_finger(touch.id) => drag.moved(position, now),
                            TouchPhase::Ended | TouchPhase::Cancelled if drag.owns_finger(touch.id) => {
                                drag.release(now)
                            }
                            _ => None,
                        };
                        if let Some(event) = event {
                            controller.handle_gesture(event);
                        }
                    }

                    // 滚轮缩放：改变垂直视场角
                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                        };
                        let fov = (controller.vertical_fov() - scroll * 2.5).clamp(MIN_FOV_DEG, MAX_FOV_DEG);
                        renderer.set_vertical_fov(fov);
                        controller.set_vertical_fov(fov);
                    }

                    WindowEvent::DroppedFile(path) => {
                        status.is_loading = true;
                        start_load_image(path, tx.clone());
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                // FPS 统计
                frame_count += 1;
                let now = Instant::now();
                if now.duration_since(last_frame_time).as_secs_f32() >= 1.0 {
                    status.fps = frame_count as f32 / now.duration_since(last_frame_time).as_secs_f32();
                    frame_count = 0;
                    last_frame_time = now;
                }

                // 先推进惯性，再把相机交给渲染器
                controller.render_frame(clock.elapsed().as_secs_f64(), &mut renderer);

                let compass_snapshot = *compass.borrow();
                let mut requests = UiRequests::default();
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    ui::draw_ui(
                        ctx,
                        &mut controller,
                        compass_snapshot,
                        &mut status,
                        &mut requests,
                        &window,
                    );
                });

                if let Some(projection) = requests.projection {
                    controller.set_projection_mode(projection);
                    controller.load_panorama(&current_image, &mut renderer);
                }
                if let Some(path) = requests.open_image {
                    status.is_loading = true;
                    start_load_image(path, tx.clone());
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        controller.teardown();
                        *control_flow = ControlFlow::Exit;
                    }
                    Err(e) => log::error!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => {
                controller.pump_motion();
                window.request_redraw();
            }

            _ => {}
        }
    });
}

fn to_vec2(position: PhysicalPosition<f64>) -> Vec2 {
    Vec2::new(position.x as f32, position.y as f32)
}

fn build_motion_source(config: &ViewerConfig) -> Box<dyn MotionSource> {
    match &config.motion {
        MotionSetting::None => Box::new(NullMotionSource),
        MotionSetting::Sweep => Box::new(ThreadedMotionSource::sweep()),
        MotionSetting::Replay(path) => match simulated::load_replay(path) {
            Ok(samples) => {
                log::info!("replaying {} motion samples from {}", samples.len(), path.display());
                Box::new(ThreadedMotionSource::replay(samples))
            }
            Err(e) => {
                log::error!("{e}; device motion disabled");
                Box::new(NullMotionSource)
            }
        },
    }
}

/// 未加载图片时显示的经纬网格
fn placeholder_panorama() -> RgbaImage {
    let (width, height) = (2048, 1024);
    RgbaImage::from_fn(width, height, |x, y| {
        let meridian = x % 128 < 2;
        let parallel = y % 128 < 2;
        let equator = y.abs_diff(height / 2) < 2;
        let north = x < 4 || x >= width - 4;
        if north {
            Rgba([220, 60, 60, 255])
        } else if equator {
            Rgba([240, 200, 80, 255])
        } else if meridian || parallel {
            Rgba([200, 200, 200, 255])
        } else {
            let shade = 40 + (y * 60 / height) as u8;
            Rgba([shade / 2, shade / 2, shade, 255])
        }
    })
}

fn start_load_image(path: PathBuf, tx: Sender<RgbaImage>) {
    thread::spawn(move || {
        log::info!("loading {} in background", path.display());

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                log::error!("cannot open {}: {e}", path.display());
                return;
            }
        };
        let reader = BufReader::new(file);

        let img_result = ImageReader::new(reader)
            .with_guessed_format()
            .map_err(image::ImageError::IoError)
            .and_then(|mut r| {
                r.no_limits();
                r.decode()
            });

        match img_result {
            Ok(img) => {
                let (w, h) = img.dimensions();
                log::info!("image loaded: {w}x{h}");

                if tx.send(img.to_rgba8()).is_err() {
                    log::error!("viewer closed before the image arrived");
                }
            }
            Err(e) => log::error!("cannot decode {}: {e}", path.display()),
        }
    });
}
