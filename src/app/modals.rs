//! Modal dialogs (alert, settings)

use super::App;
use crate::controller::BackendHealth;
use crate::theme;
use crate::ui::components::toolbar_button;
use crate::utils::find_executable;
use eframe::egui;
use egui_phosphor::regular as icons;
use std::path::PathBuf;
use tracing::warn;

impl App {
    // ========================================================================
    // ALERT
    // ========================================================================

    /// Blocking message raised by the controller (e.g. no speech engine)
    pub(crate) fn render_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.workspace.alert.clone() else {
            return;
        };
        let modal = egui::Modal::new(egui::Id::new("alert_modal"))
            .backdrop_color(egui::Color32::from_black_alpha(120))
            .frame(theme::modal_frame())
            .show(ctx, |ui| {
                ui.set_width(360.0);
                ui.add(
                    egui::Label::new(
                        egui::RichText::new(message)
                            .size(theme::FONT_BODY)
                            .color(theme::TEXT_PRIMARY),
                    )
                    .wrap(),
                );
                ui.add_space(theme::SPACING_LG);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    toolbar_button(ui, icons::CHECK, "OK", theme::BTN_ACCENT, true)
                })
                .inner
            });
        if modal.inner || modal.should_close() {
            self.workspace.alert = None;
        }
    }

    // ========================================================================
    // SETTINGS
    // ========================================================================

    pub(crate) fn render_settings(&mut self, ctx: &egui::Context) {
        if !self.show_settings {
            return;
        }
        let modal_response = egui::Modal::new(egui::Id::new("settings_modal"))
            .backdrop_color(egui::Color32::from_black_alpha(120))
            .frame(theme::modal_frame())
            .show(ctx, |ui| {
                ui.set_width(theme::SETTINGS_WIDTH);
                self.render_settings_title(ui);
                ui.add_space(4.0);
                ui.separator();
                ui.add_space(theme::SPACING_SM);

                self.render_backend_section(ui);
                section_break(ui);
                self.render_editor_section(ui);
                section_break(ui);
                self.render_download_section(ui);
                section_break(ui);
                self.render_voice_section(ui);
            });

        if modal_response.should_close() {
            self.show_settings = false;
        }
    }

    fn render_settings_title(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add(
                egui::Label::new(
                    egui::RichText::new("Settings")
                        .size(theme::FONT_HEADING)
                        .strong(),
                )
                .selectable(false),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let close_size = 24.0;
                let (rect, response) = ui.allocate_exact_size(
                    egui::vec2(close_size, close_size),
                    egui::Sense::click(),
                );
                let close_color = if response.hovered() {
                    ui.painter().rect_filled(rect, 4.0, theme::BG_SURFACE);
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                    theme::STATUS_ERROR
                } else {
                    theme::TEXT_DIM
                };
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    icons::X,
                    egui::FontId::proportional(16.0),
                    close_color,
                );
                if response.clicked() {
                    self.show_settings = false;
                }
            });
        });
    }

    fn render_backend_section(&mut self, ui: &mut egui::Ui) {
        section_title(ui, "Backend");
        let response = text_row(ui, "Origin", &mut self.origin_str, "http://127.0.0.1:8000");
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            self.apply_backend_origin();
        }
        ui.add_space(theme::SPACING_SM);
        ui.horizontal(|ui| {
            if toolbar_button(ui, icons::ARROWS_CLOCKWISE, "Apply & Check", theme::BTN_DEFAULT, true)
            {
                self.apply_backend_origin();
            }
            let (text, color) = match &self.workspace.health {
                BackendHealth::Unknown => ("Checking...".to_string(), theme::TEXT_DIM),
                BackendHealth::Online => ("Online".to_string(), theme::STATUS_SUCCESS),
                BackendHealth::Offline(reason) => (format!("Offline: {reason}"), theme::STATUS_ERROR),
            };
            ui.add(
                egui::Label::new(egui::RichText::new(text).size(theme::FONT_SMALL).color(color))
                    .truncate(),
            );
        });
    }

    fn render_editor_section(&mut self, ui: &mut egui::Ui) {
        section_title(ui, "Editor");
        if theme::settings_checkbox(
            ui,
            self.settings.comment_on_enter,
            "Comment each line when Enter is pressed",
        ) {
            self.settings.comment_on_enter = !self.settings.comment_on_enter;
            self.save_settings();
        }
    }

    fn render_download_section(&mut self, ui: &mut egui::Ui) {
        section_title(ui, "Download Folder");

        let path_changed = ui
            .horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;
                let browse_width = 28.0 + 4.0;
                let frame_padding = 12.0 + 2.0;
                let text_width = (ui.available_width() - browse_width - frame_padding).max(40.0);
                let te = theme::input_frame()
                    .show(ui, |ui| {
                        ui.add(
                            egui::TextEdit::singleline(&mut self.download_path_str)
                                .frame(false)
                                .desired_width(text_width)
                                .font(egui::FontId::proportional(theme::FONT_LABEL)),
                        )
                    })
                    .inner;

                let (rect, resp) =
                    ui.allocate_exact_size(egui::vec2(28.0, 28.0), egui::Sense::click());
                if resp.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                    ui.painter().rect_filled(rect, 4.0, theme::BG_SURFACE);
                }
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    icons::FOLDER_OPEN,
                    egui::FontId::proportional(16.0),
                    theme::TEXT_SECONDARY,
                );
                if resp.clicked() || te.double_clicked() {
                    let current = self.settings.download_path_or_default();
                    if let Some(path) = rfd::FileDialog::new().set_directory(&current).pick_folder()
                    {
                        self.apply_download_path(path);
                    }
                }
                te.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter))
            })
            .inner;

        if path_changed {
            let path = PathBuf::from(self.download_path_str.trim());
            self.apply_download_path(path);
        }

        ui.add_space(4.0);
        if toolbar_button(ui, icons::FOLDER_OPEN, "Open Folder", theme::BTN_DEFAULT, true) {
            let dir = self.settings.download_path_or_default();
            if let Err(e) = std::fs::create_dir_all(&dir).and_then(|_| open::that(&dir)) {
                warn!(error = %e, dir = %dir.display(), "Failed to open download folder");
            }
        }
    }

    fn render_voice_section(&mut self, ui: &mut egui::Ui) {
        section_title(ui, "Voice Engine");
        let mut apply = false;

        let found = |cmd: &str| find_executable(cmd).is_some();

        let ffmpeg_found = found(&self.settings.ffmpeg_cmd);
        apply |= text_row_with_state(ui, "ffmpeg", &mut self.settings.ffmpeg_cmd, "ffmpeg", ffmpeg_found)
            .lost_focus();
        apply |= optional_text_row(
            ui,
            "Input device",
            &mut self.settings.ffmpeg_device,
            "system default",
        )
        .lost_focus();

        let whisper_found = found(&self.settings.whisper_cmd);
        apply |= text_row_with_state(
            ui,
            "whisper",
            &mut self.settings.whisper_cmd,
            "whisper",
            whisper_found,
        )
        .lost_focus();
        apply |= text_row(ui, "Model", &mut self.settings.whisper_model, "small").lost_focus();
        apply |= optional_text_row(
            ui,
            "Model file (whisper.cpp)",
            &mut self.settings.whisper_model_path,
            "ggml-base.en.bin",
        )
        .lost_focus();
        apply |= text_row(ui, "Language", &mut self.settings.voice_lang, "en").lost_focus();

        ui.add_space(theme::SPACING_SM);
        ui.horizontal(|ui| {
            field_label(ui, "Record seconds");
            let response = ui.add(
                egui::DragValue::new(&mut self.settings.voice_seconds)
                    .range(1..=60)
                    .suffix(" s"),
            );
            apply |= response.drag_stopped() || response.lost_focus();
        });

        if apply {
            self.apply_voice_settings();
        }
    }
}

fn section_title(ui: &mut egui::Ui, title: &str) {
    ui.add(
        egui::Label::new(
            egui::RichText::new(title)
                .size(theme::FONT_LABEL)
                .color(theme::ACCENT),
        )
        .selectable(false),
    );
    ui.add_space(2.0);
}

fn section_break(ui: &mut egui::Ui) {
    ui.add_space(theme::SPACING_MD);
    ui.separator();
    ui.add_space(theme::SPACING_SM);
}

fn field_label(ui: &mut egui::Ui, label: &str) {
    ui.add(
        egui::Label::new(
            egui::RichText::new(label)
                .size(theme::FONT_SMALL)
                .color(theme::TEXT_MUTED),
        )
        .selectable(false),
    );
}

fn text_row(ui: &mut egui::Ui, label: &str, value: &mut String, hint: &str) -> egui::Response {
    field_label(ui, label);
    text_row_body(ui, value, hint)
}

/// Command field with a found / not found marker on the label row
fn text_row_with_state(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut String,
    hint: &str,
    found: bool,
) -> egui::Response {
    let (marker, color) = if found {
        (icons::CHECK, theme::STATUS_SUCCESS)
    } else {
        (icons::WARNING, theme::STATUS_WARNING)
    };
    ui.horizontal(|ui| {
        field_label(ui, label);
        ui.add(
            egui::Label::new(
                egui::RichText::new(marker)
                    .size(theme::FONT_SMALL)
                    .color(color),
            )
            .selectable(false),
        );
    });
    text_row_body(ui, value, hint)
}

fn text_row_body(ui: &mut egui::Ui, value: &mut String, hint: &str) -> egui::Response {
    theme::input_frame()
        .show(ui, |ui| {
            ui.add(
                egui::TextEdit::singleline(value)
                    .frame(false)
                    .hint_text(hint)
                    .desired_width(f32::INFINITY)
                    .font(egui::FontId::proportional(theme::FONT_LABEL)),
            )
        })
        .inner
}

/// Empty input maps to `None`
fn optional_text_row(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut Option<String>,
    hint: &str,
) -> egui::Response {
    let mut text = value.clone().unwrap_or_default();
    let response = text_row(ui, label, &mut text, hint);
    if response.changed() {
        *value = Some(text).filter(|t| !t.trim().is_empty());
    }
    response
}
