//! Reusable UI components
//!
//! Small painted widgets and the pure helpers that pick their colours and icons.

use crate::controller::{BackendHealth, Phase};
use crate::theme;
use eframe::egui;
use egui_phosphor::regular as icons;

/// Colour of the status line for a given phase
pub fn phase_color(phase: Phase) -> egui::Color32 {
    match phase {
        Phase::Idle => theme::TEXT_MUTED,
        Phase::Busy => theme::ACCENT,
        Phase::Complete => theme::STATUS_SUCCESS,
        Phase::Error => theme::STATUS_ERROR,
        Phase::ConnectionFailed => theme::STATUS_WARNING,
    }
}

pub fn phase_icon(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => icons::CIRCLE,
        Phase::Busy => icons::SPINNER,
        Phase::Complete => icons::CHECK_CIRCLE,
        Phase::Error => icons::X_CIRCLE,
        Phase::ConnectionFailed => icons::WIFI_SLASH,
    }
}

/// Short label and colour for the backend badge in the status bar
pub fn health_badge(health: &BackendHealth) -> (&'static str, egui::Color32) {
    match health {
        BackendHealth::Unknown => ("Backend: checking", theme::TEXT_DIM),
        BackendHealth::Online => ("Backend: online", theme::STATUS_SUCCESS),
        BackendHealth::Offline(_) => ("Backend: offline", theme::STATUS_ERROR),
    }
}

/// Custom-painted toolbar button with an icon. Returns true if clicked.
pub fn toolbar_button(
    ui: &mut egui::Ui,
    icon: &str,
    label: &str,
    base: egui::Color32,
    enabled: bool,
) -> bool {
    let text = if label.is_empty() {
        icon.to_string()
    } else {
        format!("{icon}  {label}")
    };
    let font = egui::FontId::proportional(theme::FONT_LABEL);
    let text_w = ui.fonts(|f| {
        f.layout_no_wrap(text.clone(), font.clone(), theme::TEXT_PRIMARY)
            .rect
            .width()
    });
    let sense = if enabled {
        egui::Sense::click()
    } else {
        egui::Sense::hover()
    };
    let (rect, response) =
        ui.allocate_exact_size(egui::vec2(text_w + 24.0, theme::BUTTON_HEIGHT), sense);

    if enabled && response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }
    let (fill, draw_rect) = if enabled {
        theme::button_visual(&response, base, rect)
    } else {
        (theme::BG_SURFACE, rect)
    };
    let text_color = if enabled {
        egui::Color32::WHITE
    } else {
        theme::BTN_DISABLED_TEXT
    };
    ui.painter().rect_filled(draw_rect, theme::RADIUS_DEFAULT, fill);
    ui.painter().text(
        draw_rect.center(),
        egui::Align2::CENTER_CENTER,
        text,
        font,
        text_color,
    );
    enabled && response.clicked()
}
