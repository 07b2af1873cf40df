// main.rs — desktop host: window, input translation, controls and status bar

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use tour_panorama::i18n::{self, tr, tr_with};
use tour_panorama::renderer::Renderer;
use tour_panorama::viewer::DisplayState;
use tour_panorama::{
    Control, ControlOutcome, Frame, InputEvent, ItemType, LoadSettled, OutputSize, SystemClock,
    TouchPhase, UrlFetcher, Viewer, ViewerConfig, ViewerProps,
};

use glam::DVec2;
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, MouseButton, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowBuilder},
};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

#[derive(Debug, Default)]
struct HostArgs {
    image: Option<String>,
    name: Option<String>,
    item_type: Option<String>,
    description: Option<String>,
    config: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> HostArgs {
    let mut out = HostArgs::default();
    let mut it = args.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--name" => out.name = it.next().cloned(),
            "--type" => out.item_type = it.next().cloned(),
            "--description" => out.description = it.next().cloned(),
            "--config" => out.config = it.next().map(PathBuf::from),
            // handled by i18n::resolve_lang
            "--lang" => {
                it.next();
            }
            other if !other.starts_with("--") && out.image.is_none() => {
                out.image = Some(other.to_string());
            }
            other => log::warn!("ignoring unknown argument {other}"),
        }
    }
    out
}

/// "…/old-town_square.jpg" → "old-town square"
fn name_from_url(url: &str) -> String {
    let last = url.trim_end_matches('/').rsplit(['/', '\\']).next().unwrap_or(url);
    let stem = last.rsplit_once('.').map(|(s, _)| s).unwrap_or(last);
    let name = stem.replace('_', " ");
    if name.trim().is_empty() {
        tr("app.title")
    } else {
        name
    }
}

fn pick_image() -> Option<String> {
    rfd::FileDialog::new()
        .add_filter(&tr("file.filter.images"), &IMAGE_EXTENSIONS)
        .pick_file()
        .map(|p| p.display().to_string())
}

enum UiAction {
    Control(Control),
    OpenImage,
    SetLanguage(String),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let host = parse_args(&args);
    let mut current_lang = i18n::resolve_lang(&args);
    i18n::init(current_lang.clone());

    let config = ViewerConfig::load(host.config.as_deref()).unwrap_or_else(|e| {
        log::error!("{}", tr_with("error.config", &[("err", e.to_string())]));
        ViewerConfig::default()
    });

    let Some(image_url) = host.image.clone().or_else(pick_image) else {
        log::error!("{}", tr("error.no_image"));
        return;
    };
    let item_name = host.name.clone().unwrap_or_else(|| name_from_url(&image_url));
    let item_type = ItemType::from(host.item_type.as_deref().unwrap_or("destination"));

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title(tr_with("app.title_with_item", &[("name", item_name.clone())]))
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)
    {
        Ok(w) => w,
        Err(e) => {
            log::error!("{}", tr_with("error.window", &[("err", e.to_string())]));
            std::process::exit(1);
        }
    };

    let mut renderer = match pollster::block_on(Renderer::new(&window)) {
        Ok(r) => r,
        Err(e) => {
            log::error!("{}", tr_with("error.renderer", &[("err", e.to_string())]));
            std::process::exit(1);
        }
    };

    let close_requested = Rc::new(Cell::new(false));
    let on_close = {
        let flag = Rc::clone(&close_requested);
        move || flag.set(true)
    };
    let mut props = ViewerProps::new(image_url, item_name, item_type, on_close);
    if let Some(d) = host.description {
        props = props.with_description(d);
    }
    let mut viewer = Viewer::open(props, config, Arc::new(UrlFetcher), Arc::new(SystemClock::new()));

    let mut cursor: Option<DVec2> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match viewer.poll_loader() {
            Some(LoadSettled::Ready(_)) => {
                if let Some(img) = viewer.source_image() {
                    renderer.load_panorama(img);
                }
            }
            Some(LoadSettled::Unavailable) => renderer.clear_panorama(),
            None => {}
        }

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                // releases always reach the viewer so a drag can't get stuck
                let is_release = matches!(
                    event,
                    WindowEvent::MouseInput {
                        state: ElementState::Released,
                        ..
                    } | WindowEvent::CursorLeft { .. }
                );
                if response.consumed && !is_release {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        viewer.close();
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => renderer.resize(new_size),

                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size);
                    }

                    WindowEvent::KeyboardInput { input, .. } if input.state == ElementState::Pressed => {
                        let action = match input.virtual_keycode {
                            Some(VirtualKeyCode::O) => Some(UiAction::OpenImage),
                            Some(VirtualKeyCode::F11) => Some(UiAction::Control(Control::ToggleFullscreen)),
                            Some(VirtualKeyCode::Escape) => Some(UiAction::Control(Control::Close)),
                            Some(VirtualKeyCode::Space) => Some(UiAction::Control(Control::TogglePlay)),
                            Some(VirtualKeyCode::R) => Some(UiAction::Control(Control::Reset)),
                            Some(VirtualKeyCode::I) => Some(UiAction::Control(Control::ToggleInfo)),
                            Some(VirtualKeyCode::Plus | VirtualKeyCode::Equals | VirtualKeyCode::NumpadAdd) => {
                                Some(UiAction::Control(Control::ZoomIn))
                            }
                            Some(VirtualKeyCode::Minus | VirtualKeyCode::NumpadSubtract) => {
                                Some(UiAction::Control(Control::ZoomOut))
                            }
                            _ => None,
                        };
                        if let Some(a) = action {
                            apply_action(a, &mut viewer, &mut renderer, &window, &mut current_lang);
                        }
                    }

                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => match state {
                        ElementState::Pressed => {
                            if let Some(p) = cursor {
                                viewer.handle_input(InputEvent::PointerDown(p));
                            }
                        }
                        ElementState::Released => {
                            viewer.handle_input(InputEvent::PointerUp);
                        }
                    },

                    WindowEvent::CursorMoved { position, .. } => {
                        let p = DVec2::new(position.x, position.y);
                        cursor = Some(p);
                        viewer.handle_input(InputEvent::PointerMove(p));
                    }

                    WindowEvent::CursorLeft { .. } => {
                        cursor = None;
                        viewer.handle_input(InputEvent::PointerUp);
                    }

                    WindowEvent::Touch(touch) => {
                        let phase = match touch.phase {
                            winit::event::TouchPhase::Started => TouchPhase::Started,
                            winit::event::TouchPhase::Moved => TouchPhase::Moved,
                            winit::event::TouchPhase::Ended => TouchPhase::Ended,
                            winit::event::TouchPhase::Cancelled => TouchPhase::Cancelled,
                        };
                        // platforms that also emulate mouse events from touch are
                        // handled by the controller: a touch drag keeps priority
                        viewer.handle_input(InputEvent::Touch {
                            id: touch.id,
                            phase,
                            position: DVec2::new(touch.location.x, touch.location.y),
                        });
                    }

                    WindowEvent::DroppedFile(path) => {
                        if viewer.set_image_url(path.display().to_string()) {
                            renderer.clear_panorama();
                        }
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                viewer.animation_frame();

                let size = renderer.size;
                let frame = viewer.frame(OutputSize::new(size.width, size.height));
                let scale = window.scale_factor() as f32;

                let mut actions: Vec<UiAction> = Vec::new();
                let render_result = renderer.render_with_ui(&window, frame.as_ref(), |ctx| {
                    draw_ui(ctx, &viewer, frame.as_ref(), scale, &current_lang, &mut actions);
                });

                for a in actions {
                    apply_action(a, &mut viewer, &mut renderer, &window, &mut current_lang);
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::warn!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }

        if close_requested.get() {
            *control_flow = ControlFlow::Exit;
        }
    });
}

fn apply_action(
    action: UiAction,
    viewer: &mut Viewer,
    renderer: &mut Renderer,
    window: &Window,
    current_lang: &mut String,
) {
    match action {
        UiAction::Control(c) => match viewer.activate(c) {
            ControlOutcome::FullscreenRequested(true) => {
                if window.current_monitor().is_some() {
                    window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                } else {
                    viewer.fullscreen_failed();
                }
            }
            ControlOutcome::FullscreenRequested(false) => window.set_fullscreen(None),
            ControlOutcome::Closed => renderer.clear_panorama(),
            ControlOutcome::Changed | ControlOutcome::Ignored => {}
        },
        UiAction::OpenImage => {
            if let Some(url) = pick_image() {
                if viewer.set_image_url(url) {
                    renderer.clear_panorama();
                }
            }
        }
        UiAction::SetLanguage(code) => {
            i18n::init(code.clone());
            renderer.refresh_fonts(&code);
            *current_lang = code;
            window.set_title(&tr_with(
                "app.title_with_item",
                &[("name", viewer.props().item_name.clone())],
            ));
        }
    }
}

fn control_button(ui: &mut egui::Ui, viewer: &Viewer, control: Control, label: String, actions: &mut Vec<UiAction>) {
    if ui
        .add_enabled(viewer.control_enabled(control), egui::Button::new(label))
        .clicked()
    {
        actions.push(UiAction::Control(control));
    }
}

fn draw_ui(
    ctx: &egui::Context,
    viewer: &Viewer,
    frame: Option<&Frame>,
    pixels_per_point: f32,
    current_lang: &str,
    actions: &mut Vec<UiAction>,
) {
    let props = viewer.props();

    egui::TopBottomPanel::top("controls").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading(format!("{} {}", props.item_type.icon(), props.item_name));
            ui.label(tr(props.item_type.label_key()));
            ui.separator();

            control_button(ui, viewer, Control::ZoomOut, "−".into(), actions);
            control_button(ui, viewer, Control::ZoomIn, "+".into(), actions);
            control_button(ui, viewer, Control::Reset, tr("control.reset"), actions);

            let play_label = if viewer.interaction().is_auto_rotating() {
                tr("control.pause")
            } else {
                tr("control.play")
            };
            control_button(ui, viewer, Control::TogglePlay, play_label, actions);
            control_button(ui, viewer, Control::ToggleInfo, tr("control.info"), actions);

            let fs_label = if viewer.is_fullscreen() {
                tr("control.fullscreen_exit")
            } else {
                tr("control.fullscreen_enter")
            };
            control_button(ui, viewer, Control::ToggleFullscreen, fs_label, actions);

            ui.separator();
            if ui.button(tr("control.open_image")).clicked() {
                actions.push(UiAction::OpenImage);
            }
            ui.menu_button(tr("control.language"), |ui| {
                for (code, name) in i18n::LANGUAGES {
                    if ui.radio(current_lang == code, name).clicked() {
                        actions.push(UiAction::SetLanguage(code.to_string()));
                        ui.close_menu();
                    }
                }
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                control_button(ui, viewer, Control::Close, tr("control.close"), actions);
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let view = viewer.view();
            ui.label(tr_with(
                "status.view",
                &[
                    ("yaw", format!("{:.1}", view.normalized_yaw())),
                    ("pitch", format!("{:.1}", view.pitch())),
                    ("zoom", format!("{:.1}", view.zoom())),
                ],
            ));
            if viewer.interaction().is_auto_rotating() {
                ui.label("|");
                ui.label(egui::RichText::new(tr("status.auto_rotating")).color(egui::Color32::LIGHT_GREEN));
            }
            ui.label("|");
            ui.label(tr("hint.drag"));
        });
    });

    match viewer.display() {
        DisplayState::Loading => {
            egui::Area::new("loading")
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(tr("status.loading"));
                    });
                });
        }
        DisplayState::Unavailable { reason } => {
            egui::Area::new("unavailable")
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(
                            egui::RichText::new(tr_with("status.unavailable", &[("reason", reason.clone())]))
                                .color(egui::Color32::YELLOW)
                                .size(18.0),
                        );
                        ui.label(tr("status.unavailable_hint"));
                    });
                });
        }
        DisplayState::Ready(_) | DisplayState::Closed => {}
    }

    if let Some(frame) = frame {
        let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Background, egui::Id::new("hotspots")));
        for marker in &frame.hotspots {
            let center = egui::pos2(
                marker.center.x as f32 / pixels_per_point,
                marker.center.y as f32 / pixels_per_point,
            );
            let radius = marker.radius as f32 / pixels_per_point;
            let [r, g, b] = marker.category.color();
            let color = egui::Color32::from_rgb(r, g, b);
            painter.circle_filled(center, radius * 0.4, color);
            painter.circle_stroke(center, radius, egui::Stroke::new(2.0, color));
            painter.text(
                center + egui::vec2(0.0, radius + 4.0),
                egui::Align2::CENTER_TOP,
                format!("{} · {}", marker.label, tr(marker.category.label_key())),
                egui::FontId::proportional(13.0),
                egui::Color32::WHITE,
            );
        }
    }

    if viewer.is_info_visible() {
        egui::Window::new(format!("{} {}", props.item_type.icon(), props.item_name))
            .id(egui::Id::new("info_panel"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::LEFT_BOTTOM, [12.0, -12.0])
            .show(ctx, |ui| {
                let text = viewer
                    .visible_description()
                    .map(str::to_string)
                    .unwrap_or_else(|| tr("info.no_description"));
                ui.label(text);
            });
    }
}
