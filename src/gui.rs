//! GUI rendering components for the TubeGrab downloader
//!
//! This module contains all the UI rendering methods, the modal windows and
//! the eframe entry point.

use eframe::egui;
use log::{info, warn};
use rfd::FileDialog;

use crate::app::PlaylistAnswer;
use crate::config::{APP_NAME, APP_VERSION};
use crate::data_structures::{Severity, TubeGrab};
use crate::helper_functions::{Utils, Validation};
use crate::logging::shutdown_logging;

// Dracula palette
const PURPLE: egui::Color32 = egui::Color32::from_rgb(189, 147, 249);
const GREEN: egui::Color32 = egui::Color32::from_rgb(80, 250, 123);
const RED: egui::Color32 = egui::Color32::from_rgb(255, 85, 85);
const ORANGE: egui::Color32 = egui::Color32::from_rgb(255, 184, 108);
const BAR_FILL: egui::Color32 = egui::Color32::from_rgb(124, 99, 160);

/// Apply the Dracula theme, or egui's light theme
pub fn configure_visuals(ctx: &egui::Context, dark_mode: bool) {
    if !dark_mode {
        let mut visuals = egui::Visuals::light();
        visuals.selection.bg_fill = PURPLE;
        visuals.widgets.active.bg_fill = PURPLE;
        ctx.set_visuals(visuals);
        return;
    }

    let mut visuals = egui::Visuals::dark();
    visuals.override_text_color = Some(egui::Color32::from_rgb(248, 248, 242)); // #f8f8f2
    visuals.widgets.active.bg_fill = PURPLE;
    visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(139, 233, 253); // #8be9fd
    visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(68, 71, 90); // #44475a
    visuals.selection.bg_fill = PURPLE;
    visuals.hyperlink_color = egui::Color32::from_rgb(139, 233, 253);
    visuals.warn_fg_color = ORANGE;
    visuals.error_fg_color = RED;
    visuals.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(68, 71, 90);
    visuals.widgets.active.fg_stroke.color = egui::Color32::from_rgb(248, 248, 242);
    visuals.widgets.hovered.fg_stroke.color = egui::Color32::from_rgb(40, 42, 54); // #282a36
    ctx.set_visuals(visuals);
}

/// Three-quarter arc rotating at a constant speed
fn draw_spinner(ui: &mut egui::Ui) {
    let time = ui.ctx().input(|i| i.time) as f32;
    let angle = (time * 2.0) % (2.0 * std::f32::consts::PI);
    let center = ui.cursor().min + egui::vec2(8.0, 8.0);
    let radius = 6.0;
    let segments = 16;
    let step = std::f32::consts::PI * 1.5 / segments as f32;
    let painter = ui.painter();
    for i in 0..segments {
        let a1 = angle + i as f32 * step;
        let a2 = a1 + step;
        let p1 = center + egui::vec2(radius * a1.cos(), radius * a1.sin());
        let p2 = center + egui::vec2(radius * a2.cos(), radius * a2.sin());
        painter.line_segment([p1, p2], egui::Stroke::new(2.0, PURPLE));
    }
    ui.add_space(20.0);
}

fn severity_color(severity: Severity) -> Option<egui::Color32> {
    match severity {
        Severity::Info => None,
        Severity::Success => Some(GREEN),
        Severity::Warning => Some(ORANGE),
        Severity::Error => Some(RED),
    }
}

impl TubeGrab {
    fn modal_open(&self) -> bool {
        self.playlist_prompt.is_some() || self.selection_dialog.is_some() || self.notice_dialog.is_some()
    }

    /// Render the application header with the theme toggle
    pub fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(format!("{} v{}", APP_NAME, APP_VERSION))
                    .color(PURPLE)
                    .heading(),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let icon = if self.dark_mode { "☀" } else { "🌙" };
                if ui.button(icon).on_hover_text("Toggle theme").clicked() {
                    self.toggle_theme();
                }
            });
        });
        ui.add_space(5.0);
    }

    /// Render the URL entry field
    pub fn render_url_input(&mut self, ui: &mut egui::Ui) {
        ui.label("Video or playlist URL:");
        let response = ui.add(
            egui::TextEdit::singleline(&mut self.url_input)
                .hint_text("Paste YouTube video or playlist link here...")
                .desired_width(f32::INFINITY),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) && !self.is_busy() {
            self.submit();
        }
    }

    /// Render destination folder field and picker
    pub fn render_folder_selection(&mut self, ui: &mut egui::Ui) {
        ui.label("Save to:");
        ui.horizontal(|ui| {
            let browse_width = 80.0;
            ui.add(
                egui::TextEdit::singleline(&mut self.download_folder)
                    .desired_width(ui.available_width() - browse_width - 8.0),
            );
            if ui.add_sized([browse_width, 20.0], egui::Button::new("Browse...")).clicked() {
                if let Some(folder) = FileDialog::new()
                    .set_title("Select folder to save downloads")
                    .pick_folder()
                {
                    let new_folder = folder.display().to_string();
                    if Validation::is_valid_folder(&new_folder) {
                        info!("Folder selected: {}", new_folder);
                        self.download_folder = new_folder;
                        self.save_current_settings();
                    } else {
                        warn!("Invalid folder selected: {}", new_folder);
                    }
                }
            }
        });
    }

    /// Render the submit control, disabled while anything is in flight
    pub fn render_download_button(&mut self, ui: &mut egui::Ui) {
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let button = egui::Button::new(egui::RichText::new("Download").strong()).min_size(egui::vec2(140.0, 28.0));
            if ui.add_enabled(!self.is_busy(), button).clicked() {
                self.submit();
            }
            if let Some(folder) = self.completed_folder().cloned() {
                if ui.button("Open Folder").clicked() {
                    if let Err(e) = Utils::open_folder(&folder) {
                        warn!("Failed to open {}: {}", folder.display(), e);
                    }
                }
            }
        });
    }

    /// Render progress bar
    pub fn render_progress_bar(&self, ui: &mut egui::Ui) {
        ui.add_space(10.0);
        let window_width = ui.ctx().screen_rect().width();
        let progress_bar = egui::ProgressBar::new(f32::from(self.progress_percent) / 100.0)
            .show_percentage()
            .fill(BAR_FILL)
            .desired_width(window_width - 18.0);
        ui.add(progress_bar);
    }

    /// Render status line with a spinner while busy
    pub fn render_status(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if self.probe_task.is_some() || self.download_task.is_some() {
                draw_spinner(ui);
            }
            let text = Utils::truncate_string(&self.status, 120);
            match severity_color(self.status_severity) {
                Some(color) => ui.colored_label(color, text),
                None => ui.label(text),
            };
        });
    }

    /// Playlist question with Yes/No/Cancel
    pub fn show_playlist_prompt(&mut self, ctx: &egui::Context) {
        let Some(prompt) = &self.playlist_prompt else {
            return;
        };
        let text = format!(
            "Detected playlist: {} ({} videos)\nDo you want to download the entire playlist?",
            prompt.title, prompt.entry_count
        );
        let mut answer = None;
        egui::Window::new("Playlist detected")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(text);
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    if ui.button("Yes").clicked() {
                        answer = Some(PlaylistAnswer::Yes);
                    }
                    if ui.button("No").clicked() {
                        answer = Some(PlaylistAnswer::No);
                    }
                    if ui.button("Cancel").clicked() {
                        answer = Some(PlaylistAnswer::Cancel);
                    }
                });
            });
        if let Some(answer) = answer {
            self.answer_playlist(answer);
        }
    }

    /// Quality and format window
    pub fn show_selection_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.selection_dialog.as_mut() else {
            return;
        };
        if let Some(outcome) = dialog.show(ctx, self.thumbnail.as_ref()) {
            self.finish_selection(outcome);
        }
    }

    /// Blocking acknowledgment for errors and successes
    pub fn show_notice_dialog(&mut self, ctx: &egui::Context) {
        let Some((severity, dialog)) = &self.notice_dialog else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(dialog.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_max_width(420.0);
                match severity_color(*severity) {
                    Some(color) => ui.colored_label(color, dialog.body.as_str()),
                    None => ui.label(dialog.body.as_str()),
                };
                ui.add_space(6.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.dismiss_notice();
        }
    }
}

impl eframe::App for TubeGrab {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.style().visuals.dark_mode != self.dark_mode {
            configure_visuals(ctx, self.dark_mode);
        }

        self.poll_tasks();
        self.poll_thumbnail(ctx);

        let modal_open = self.modal_open();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!modal_open, |ui| {
                self.render_header(ui);
                ui.separator();
                self.render_url_input(ui);
                ui.add_space(4.0);
                self.render_folder_selection(ui);
                self.render_download_button(ui);
                self.render_progress_bar(ui);
                self.render_status(ui);
            });
        });

        // At most one modal is open at a time, the notice sits on top
        if self.notice_dialog.is_some() {
            self.show_notice_dialog(ctx);
        } else if self.playlist_prompt.is_some() {
            self.show_playlist_prompt(ctx);
        } else {
            self.show_selection_dialog(ctx);
        }

        if self.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(1000));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save_current_settings();
        info!("Application closed by user");
        info!("---------------------------------------------------------------");
        shutdown_logging();
    }
}
