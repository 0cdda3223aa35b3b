//! App module - window state around the controller

mod modals;
mod views;

use crate::api::Backend;
use crate::controller::{BackendHealth, Controller, Workspace};
use crate::settings::Settings;
use crate::theme;
use crate::voice::{WhisperConfig, WhisperRecognizer};
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub(crate) workspace: Workspace,
    pub(crate) controller: Controller,
    // Owns the worker threads; dropped after the controller
    _runtime: tokio::runtime::Runtime,
    pub(crate) clipboard: Option<arboard::Clipboard>,
    pub(crate) settings: Settings,
    pub(crate) data_dir: PathBuf,
    /// Origin the backend client was built from (env override included)
    pub(crate) active_origin: String,
    // Settings modal
    pub(crate) show_settings: bool,
    pub(crate) origin_str: String,
    pub(crate) download_path_str: String,
    // Central panel rect for toast positioning
    pub(crate) central_panel_rect: Option<egui::Rect>,
    // Toast notification
    pub(crate) toast_message: Option<String>,
    pub(crate) toast_start: Option<Instant>,
    // Window geometry
    pub(crate) window_pos: Option<egui::Pos2>,
    pub(crate) window_size: Option<egui::Vec2>,
    pub(crate) needs_center: bool,
}

// ============================================================================
// APP INITIALIZATION & HELPERS
// ============================================================================

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: Settings,
        data_dir: PathBuf,
    ) -> std::io::Result<Self> {
        // Force dark theme
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        // Phosphor icons on top of the default fonts
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        theme::apply_visuals(&cc.egui_ctx);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("companion-worker")
            .build()?;

        let origin = settings.effective_origin();
        let backend = Backend::new(&origin);
        info!(base_url = backend.base_url(), "Backend configured");

        let recognizer = WhisperRecognizer::new(WhisperConfig::from_settings(&settings));
        let controller = Controller::new(
            Arc::new(backend),
            Arc::new(recognizer),
            runtime.handle().clone(),
            cc.egui_ctx.clone(),
        );
        controller.check_health();

        let clipboard = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                warn!(error = %e, "Clipboard unavailable, copying will fail");
                None
            }
        };

        let download_path = settings.download_path_or_default();

        Ok(Self {
            workspace: Workspace::with_level(settings.skill_level),
            controller,
            _runtime: runtime,
            clipboard,
            active_origin: origin.clone(),
            origin_str: origin,
            download_path_str: download_path.to_string_lossy().to_string(),
            settings,
            data_dir,
            show_settings: false,
            central_panel_rect: None,
            toast_message: None,
            toast_start: None,
            window_pos: None,
            window_size: None,
            needs_center: false,
        })
    }

    pub fn save_settings(&mut self) {
        self.settings.window_x = self.window_pos.map(|p| p.x);
        self.settings.window_y = self.window_pos.map(|p| p.y);
        self.settings.window_w = self.window_size.map(|s| s.x);
        self.settings.window_h = self.window_size.map(|s| s.y);
        self.settings.skill_level = self.workspace.level;
        self.settings.save(&self.data_dir);
    }

    /// Rebuilds the backend client from the origin typed in settings and checks it again.
    pub(crate) fn apply_backend_origin(&mut self) {
        let origin = self.origin_str.trim().to_string();
        if origin.is_empty() {
            self.origin_str = self.settings.backend_origin.clone();
            return;
        }
        let backend = Backend::new(&origin);
        info!(base_url = backend.base_url(), "Backend origin changed");
        self.controller.set_assistant(Arc::new(backend));
        self.workspace.health = BackendHealth::Unknown;
        self.controller.check_health();

        self.settings.backend_origin = origin.clone();
        self.active_origin = origin.clone();
        self.origin_str = origin;
        self.save_settings();
    }

    pub(crate) fn apply_voice_settings(&mut self) {
        let recognizer = WhisperRecognizer::new(WhisperConfig::from_settings(&self.settings));
        self.controller
            .set_recognizer(Arc::new(recognizer), &mut self.workspace);
        self.save_settings();
    }

    pub(crate) fn apply_download_path(&mut self, path: PathBuf) {
        self.download_path_str = path.to_string_lossy().to_string();
        self.settings.download_path = Some(self.download_path_str.clone());
        self.save_settings();
    }

    pub(crate) fn copy_output(&mut self) {
        self.controller
            .copy_output(&mut self.workspace, &mut self.clipboard, Instant::now());
    }

    pub(crate) fn download_output(&mut self) {
        let dir = self.settings.download_path_or_default();
        match self.controller.download_output(&self.workspace, &dir) {
            Ok(path) => self.show_toast(format!("Saved to {}", path.display())),
            Err(e) => {
                error!(error = %e, dir = %dir.display(), "Failed to save output");
                self.show_toast(format!("Could not save output: {e}"));
            }
        }
    }

    pub(crate) fn show_toast(&mut self, message: impl Into<String>) {
        self.toast_message = Some(message.into());
        self.toast_start = Some(Instant::now());
    }
}
