//! Main window: toolbar, editor/output split, status bar, toast

use super::App;
use crate::constants::{APP_NAME, TOAST_DURATION};
use crate::controller::{line_before_cursor, BackendHealth};
use crate::theme;
use crate::types::SkillLevel;
use crate::ui::components::{health_badge, phase_color, phase_icon, toolbar_button};
use eframe::egui;
use egui_phosphor::regular as icons;
use std::time::{Duration, Instant};
use tracing::debug;

const EDITOR_ID: &str = "code_editor";

impl App {
    // ========================================================================
    // TOOLBAR
    // ========================================================================

    pub(crate) fn render_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar")
            .exact_height(theme::TOOLBAR_HEIGHT)
            .show_separator_line(false)
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_ELEVATED)
                    .inner_margin(egui::Margin::symmetric(12, 10)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.spacing_mut().item_spacing.x = 6.0;

                    if toolbar_button(ui, icons::PLAY, "Run", theme::BTN_ACCENT, true) {
                        self.controller.run(&mut self.workspace);
                    }
                    if toolbar_button(ui, icons::BUG, "Debug", theme::BTN_DEFAULT, true) {
                        self.controller.debug(&mut self.workspace);
                    }
                    if toolbar_button(ui, icons::CHAT_TEXT, "Comment", theme::BTN_DEFAULT, true) {
                        self.controller.comment(&mut self.workspace);
                    }
                    if toolbar_button(ui, icons::BRAIN, "Analyze", theme::BTN_DEFAULT, true) {
                        self.controller.analyze(&mut self.workspace);
                    }

                    ui.add_space(theme::SPACING_MD);
                    ui.separator();
                    ui.add_space(theme::SPACING_MD);

                    if toolbar_button(ui, icons::ERASER, "Clear", theme::BTN_DEFAULT, true) {
                        self.controller.clear(&mut self.workspace);
                    }
                    let copy_label = self.workspace.copy_label.clone();
                    if toolbar_button(ui, icons::COPY, &copy_label, theme::BTN_DEFAULT, true) {
                        self.copy_output();
                    }
                    if toolbar_button(ui, icons::DOWNLOAD_SIMPLE, "Download", theme::BTN_DEFAULT, true)
                    {
                        self.download_output();
                    }

                    let voice_label = self.workspace.voice_label.clone();
                    let voice_fill = if self.controller.voice_phase().is_active() {
                        theme::BTN_DANGER
                    } else {
                        theme::BTN_DEFAULT
                    };
                    if toolbar_button(ui, icons::MICROPHONE, &voice_label, voice_fill, true) {
                        self.controller.toggle_voice(&mut self.workspace);
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if toolbar_button(ui, icons::GEAR_SIX, "", theme::BTN_DEFAULT, true) {
                            self.show_settings = !self.show_settings;
                        }
                        self.render_level_selector(ui);
                    });
                });
            });
    }

    fn render_level_selector(&mut self, ui: &mut egui::Ui) {
        let before = self.workspace.level;
        egui::ComboBox::from_id_salt("skill_level")
            .selected_text(before.label())
            .width(120.0)
            .show_ui(ui, |ui| {
                for level in SkillLevel::ALL {
                    ui.selectable_value(&mut self.workspace.level, level, level.label());
                }
            });
        ui.add(
            egui::Label::new(
                egui::RichText::new("Level")
                    .size(theme::FONT_LABEL)
                    .color(theme::TEXT_MUTED),
            )
            .selectable(false),
        );
        if self.workspace.level != before {
            debug!(level = self.workspace.level.as_str(), "Skill level changed");
            self.save_settings();
        }
    }

    // ========================================================================
    // STATUS BAR
    // ========================================================================

    pub(crate) fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(theme::STATUS_BAR_HEIGHT)
            .show_separator_line(false)
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_ELEVATED)
                    .inner_margin(egui::Margin::symmetric(12, 4)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    let status = &self.workspace.status;
                    let color = phase_color(status.phase);
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new(format!("{}  {}", phase_icon(status.phase), status.text))
                                .size(theme::FONT_LABEL)
                                .color(color),
                        )
                        .selectable(false),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let (label, color) = health_badge(&self.workspace.health);
                        let response = ui.add(
                            egui::Label::new(
                                egui::RichText::new(label)
                                    .size(theme::FONT_SMALL)
                                    .color(color),
                            )
                            .selectable(false),
                        );
                        if let BackendHealth::Offline(reason) =
                            &self.workspace.health
                        {
                            response.on_hover_text(reason);
                        }
                        ui.add(
                            egui::Label::new(
                                egui::RichText::new(&self.active_origin)
                                    .size(theme::FONT_SMALL)
                                    .color(theme::TEXT_DIM),
                            )
                            .selectable(false),
                        );
                    });
                });
            });
    }

    // ========================================================================
    // EDITOR + OUTPUT
    // ========================================================================

    pub(crate) fn render_workspace(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_BASE)
                    .inner_margin(egui::Margin::same(theme::SPACING_LG as i8)),
            )
            .show(ctx, |ui| {
                self.central_panel_rect = Some(ui.max_rect());
                ui.columns(2, |cols| {
                    self.render_editor(&mut cols[0]);
                    self.render_output(&mut cols[1]);
                });
            });
    }

    fn render_editor(&mut self, ui: &mut egui::Ui) {
        section_header(ui, icons::CODE, "Code");
        theme::section_frame().show(ui, |ui| {
            egui::ScrollArea::vertical()
                .id_salt("editor_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let output = egui::TextEdit::multiline(&mut self.workspace.editor)
                        .id(egui::Id::new(EDITOR_ID))
                        .code_editor()
                        .frame(false)
                        .hint_text(format!("Paste or type your code here, then ask {APP_NAME}..."))
                        .desired_width(f32::INFINITY)
                        .desired_rows(24)
                        .show(ui);

                    if self.settings.comment_on_enter
                        && output.response.changed()
                        && ui.input(|i| i.key_pressed(egui::Key::Enter))
                    {
                        let cursor = output.state.cursor.char_range().map(|r| r.primary.index);
                        if let Some((index, line)) =
                            cursor.and_then(|c| line_before_cursor(&self.workspace.editor, c))
                        {
                            self.controller.comment_line(&self.workspace, index, line);
                        }
                    }
                });
        });
    }

    fn render_output(&mut self, ui: &mut egui::Ui) {
        section_header(ui, icons::TERMINAL_WINDOW, "Output");
        theme::section_frame().show(ui, |ui| {
            egui::ScrollArea::vertical()
                .id_salt("output_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    // Read-only view; selection and copy still work
                    let mut text = self.workspace.output.as_str();
                    ui.add(
                        egui::TextEdit::multiline(&mut text)
                            .code_editor()
                            .frame(false)
                            .desired_width(f32::INFINITY)
                            .desired_rows(24),
                    );
                });
        });
    }

    // ========================================================================
    // TOAST
    // ========================================================================

    /// Download result pinned to the bottom-right of the workspace until it expires
    pub(crate) fn render_toast(&mut self, ctx: &egui::Context) {
        let (Some(msg), Some(start), Some(panel_rect)) = (
            self.toast_message.as_deref(),
            self.toast_start,
            self.central_panel_rect,
        ) else {
            return;
        };
        let Some(remaining) = toast_remaining(start, Instant::now()) else {
            self.toast_message = None;
            self.toast_start = None;
            return;
        };

        egui::Area::new(egui::Id::new("toast"))
            .fixed_pos(panel_rect.right_bottom() - egui::vec2(theme::SPACING_LG, theme::SPACING_LG))
            .pivot(egui::Align2::RIGHT_BOTTOM)
            .show(ctx, |ui| {
                theme::toast_frame().show(ui, |ui| {
                    ui.label(egui::RichText::new(msg).color(theme::TEXT_PRIMARY));
                });
            });
        ctx.request_repaint_after(remaining);
    }
}

/// Time the toast stays up, `None` once it has expired
fn toast_remaining(start: Instant, now: Instant) -> Option<Duration> {
    TOAST_DURATION
        .checked_sub(now.saturating_duration_since(start))
        .filter(|left| !left.is_zero())
}

fn section_header(ui: &mut egui::Ui, icon: &str, title: &str) {
    ui.add(
        egui::Label::new(
            egui::RichText::new(format!("{icon}  {title}"))
                .size(theme::FONT_HEADING)
                .color(theme::ACCENT),
        )
        .selectable(false),
    );
    ui.add_space(theme::SPACING_SM);
}
