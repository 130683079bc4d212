//! Hanami - cherry blossom petals over a quiet pond
//! Petal animation on the central canvas plus a day-count readout

mod config;
mod countdown;
mod petals;
mod resize;

use config::{AppConfig, ColorScheme};
use countdown::CountdownClock;
use eframe::egui;
use petals::PetalField;
use resize::ResizeWatcher;
use std::time::{Duration, Instant};

const RESIZE_SETTLE: Duration = Duration::from_millis(300);

/// Main application state
struct HanamiApp {
    config: AppConfig,
    field: PetalField,
    clock: CountdownClock,
    resize: ResizeWatcher,
    last_update: Instant,
    last_dt: f32,

    // UI state
    animating: bool,
    first_frame: bool,
    show_settings: bool,
    settings_tab: SettingsTab,
    selected_preset: usize,
}

#[derive(Clone, Copy, PartialEq)]
enum SettingsTab {
    Petals,
    Colors,
    DayCount,
}

impl HanamiApp {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_unmultiplied(15, 10, 25, 245);
        visuals.panel_fill = egui::Color32::from_rgba_unmultiplied(22, 14, 32, 240);
        cc.egui_ctx.set_visuals(visuals);

        let config = AppConfig::default();
        let scheme = config.get_color_scheme();
        let mut rng = rand::thread_rng();
        let field = PetalField::new(1280.0, 720.0, &config.field, &scheme, &mut rng);

        Self {
            config,
            field,
            clock: CountdownClock::new(),
            resize: ResizeWatcher::new(RESIZE_SETTLE),
            last_update: Instant::now(),
            last_dt: 1.0 / 60.0,
            animating: true,
            first_frame: true,
            show_settings: false,
            settings_tab: SettingsTab::Petals,
            selected_preset: 0,
        }
    }

    /// Rebuild the petal population at the current canvas size.
    fn repopulate(&mut self) {
        let scheme = self.config.get_color_scheme();
        let mut rng = rand::thread_rng();
        let (width, height) = (self.field.width, self.field.height);
        self.field
            .reinitialize(width, height, &self.config.field, &scheme, &mut rng);
    }
}

impl eframe::App for HanamiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.last_dt = now.duration_since(self.last_update).as_secs_f32();
        self.last_update = now;

        self.render_top_bar(ctx);
        if self.show_settings {
            self.render_settings_panel(ctx);
        }
        self.render_canvas(ctx);

        // Continuous repaint keeps the frame loop running; the pause button
        // is the only thing that stops the simulation.
        ctx.request_repaint();
    }
}

impl HanamiApp {
    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("🌸 Hanami");
                ui.separator();

                if self.config.countdown.enabled {
                    match self.clock.refresh(self.config.countdown.target_date()) {
                        Some(diff) => {
                            ui.label(format!("Years: {}", diff.years));
                            ui.label(format!("Months: {}", diff.months));
                            ui.label(format!("Days: {}", diff.days));
                        }
                        None => {
                            ui.label("Years: -");
                            ui.label("Months: -");
                            ui.label("Days: -");
                        }
                    }
                    ui.separator();
                }

                if self.animating {
                    if ui.button("⏸ Pause").clicked() {
                        self.animating = false;
                    }
                } else if ui.button("▶ Play").clicked() {
                    self.animating = true;
                }

                ui.separator();
                ui.toggle_value(&mut self.show_settings, "⚙ Settings");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let fps = 1.0 / self.last_dt.max(0.001);
                    ui.label(format!("FPS: {:.0}", fps));
                    ui.label(format!("Petals: {}", self.field.petals.len()));
                });
            });
        });
    }

    fn render_settings_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("settings_panel")
            .min_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Settings");
                ui.separator();

                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.settings_tab, SettingsTab::Petals, "Petals");
                    ui.selectable_value(&mut self.settings_tab, SettingsTab::Colors, "Colors");
                    ui.selectable_value(
                        &mut self.settings_tab,
                        SettingsTab::DayCount,
                        "Day Count",
                    );
                });

                ui.separator();

                ui.horizontal(|ui| {
                    ui.label("Preset:");
                    let preset_names = AppConfig::preset_names();
                    egui::ComboBox::from_id_source("preset_combo")
                        .selected_text(
                            preset_names
                                .get(self.selected_preset)
                                .copied()
                                .unwrap_or("Default"),
                        )
                        .show_ui(ui, |ui| {
                            for (i, name) in preset_names.iter().enumerate() {
                                if ui
                                    .selectable_value(&mut self.selected_preset, i, *name)
                                    .changed()
                                {
                                    self.config.apply_preset(name);
                                    self.repopulate();
                                }
                            }
                        });
                });

                ui.separator();

                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.settings_tab {
                        SettingsTab::Petals => self.render_petal_settings(ui),
                        SettingsTab::Colors => self.render_color_settings(ui),
                        SettingsTab::DayCount => self.render_countdown_settings(ui),
                    }

                    ui.add_space(8.0);
                    ui.separator();
                    self.render_config_io(ui);
                });
            });
    }

    fn render_petal_settings(&mut self, ui: &mut egui::Ui) {
        ui.checkbox(&mut self.config.field.enabled, "Enable Petals");

        ui.add_space(8.0);
        ui.label("Initial Count (per 1000 px of width)");
        ui.add(egui::Slider::new(&mut self.config.field.initial_count, 1..=120));

        ui.label("Spawn Interval Scale");
        ui.add(egui::Slider::new(&mut self.config.field.spawn_scale, 1.0..=30.0));

        ui.add_space(8.0);
        if ui.button("Repopulate Now").clicked() {
            self.repopulate();
        }
        ui.label("(Count and pacing apply on repopulate or resize)");
    }

    fn render_color_settings(&mut self, ui: &mut egui::Ui) {
        ui.label("Color Scheme");
        let schemes = ColorScheme::all_schemes();
        let current = schemes
            .get(self.config.color_scheme_index)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        egui::ComboBox::from_id_source("scheme_combo")
            .selected_text(current)
            .show_ui(ui, |ui| {
                for (i, scheme) in schemes.iter().enumerate() {
                    if ui
                        .selectable_value(&mut self.config.color_scheme_index, i, &scheme.name)
                        .changed()
                    {
                        // Swatches are baked per petal, so recolor by rebuilding.
                        self.repopulate();
                    }
                }
            });
    }

    fn render_countdown_settings(&mut self, ui: &mut egui::Ui) {
        ui.checkbox(&mut self.config.countdown.enabled, "Show Day Count");

        ui.add_space(8.0);
        ui.label("Target Date (year / month / day)");
        ui.horizontal(|ui| {
            ui.add(
                egui::DragValue::new(&mut self.config.countdown.year).clamp_range(1900..=2200),
            );
            ui.add(egui::DragValue::new(&mut self.config.countdown.month).clamp_range(1..=12));
            ui.add(egui::DragValue::new(&mut self.config.countdown.day).clamp_range(1..=31));
        });

        if self.config.countdown.target_date().is_none() {
            ui.colored_label(egui::Color32::YELLOW, "⚠ Not a valid calendar date");
        }
    }

    fn render_config_io(&mut self, ui: &mut egui::Ui) {
        if ui.button("💾 Save Config").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("JSON", &["json"])
                .save_file()
            {
                if let Err(e) = self.config.save(&path.to_string_lossy()) {
                    eprintln!("Error saving config: {}", e);
                }
            }
        }

        if ui.button("📂 Load Config").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("JSON", &["json"])
                .pick_file()
            {
                match AppConfig::load(&path.to_string_lossy()) {
                    Ok(config) => {
                        self.config = config;
                        self.selected_preset = 0;
                        self.repopulate();
                    }
                    Err(e) => eprintln!("Error loading config: {}", e),
                }
            }
        }
    }

    fn render_canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (rect, _) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
                let scheme = self.config.get_color_scheme();
                let mut rng = rand::thread_rng();

                if self.first_frame {
                    self.first_frame = false;
                    self.field.reinitialize(
                        rect.width(),
                        rect.height(),
                        &self.config.field,
                        &scheme,
                        &mut rng,
                    );
                } else if self.resize.observe(
                    (rect.width(), rect.height()),
                    (self.field.width, self.field.height),
                    Instant::now(),
                ) {
                    self.field.reinitialize(
                        rect.width(),
                        rect.height(),
                        &self.config.field,
                        &scheme,
                        &mut rng,
                    );
                    println!(
                        "Canvas resized to {:.0}x{:.0}",
                        rect.width(),
                        rect.height()
                    );
                }

                let painter = ui.painter_at(rect);
                let bg = egui::Color32::from_rgb(
                    scheme.background[0],
                    scheme.background[1],
                    scheme.background[2],
                );
                painter.rect_filled(rect, 0.0, bg);

                if self.config.field.enabled {
                    if self.animating {
                        self.field.update(&scheme, &mut rng);
                    }
                    self.field.render(&painter, rect);
                }
            });
    }
}

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("Hanami")
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Hanami",
        options,
        Box::new(|cc| Box::new(HanamiApp::new(cc))),
    )
}
