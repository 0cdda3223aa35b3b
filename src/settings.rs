//! User settings stored as settings.json in the app data directory

use crate::constants::{BACKEND_ENV_VAR, DEFAULT_BACKEND_ORIGIN};
use crate::types::SkillLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Window geometry
    pub window_x: Option<f32>,
    pub window_y: Option<f32>,
    pub window_w: Option<f32>,
    pub window_h: Option<f32>,

    // Backend
    pub backend_origin: String,
    pub skill_level: SkillLevel,

    // Editor
    pub comment_on_enter: bool,

    // Paths
    pub download_path: Option<String>,

    // Voice engine
    pub ffmpeg_cmd: String,
    pub ffmpeg_device: Option<String>,
    pub whisper_cmd: String,
    pub whisper_model: String,
    pub whisper_model_path: Option<String>,
    pub voice_lang: String,
    pub voice_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_x: None,
            window_y: None,
            window_w: None,
            window_h: None,
            backend_origin: DEFAULT_BACKEND_ORIGIN.to_string(),
            skill_level: SkillLevel::Beginner,
            comment_on_enter: false,
            download_path: None,
            ffmpeg_cmd: "ffmpeg".to_string(),
            ffmpeg_device: None,
            whisper_cmd: "whisper".to_string(),
            whisper_model: "small".to_string(),
            whisper_model_path: None,
            voice_lang: "en".to_string(),
            voice_seconds: 5,
        }
    }
}

impl Settings {
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("settings.json");
        match std::fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(settings) => {
                    debug!(path = %path.display(), "Settings loaded");
                    settings
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse settings, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No settings file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) {
        let path = data_dir.join("settings.json");
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!(error = %e, "Failed to save settings");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize settings"),
        }
    }

    /// Origin for this run: `SMART_CODE_BACKEND` wins over the saved value.
    pub fn effective_origin(&self) -> String {
        match std::env::var(BACKEND_ENV_VAR) {
            Ok(origin) if !origin.trim().is_empty() => {
                info!(origin = %origin, "Backend origin overridden from environment");
                origin.trim().to_string()
            }
            _ => self.backend_origin.clone(),
        }
    }

    pub fn download_path_or_default(&self) -> PathBuf {
        self.download_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::download_dir()
                    .or_else(dirs::home_dir)
                    .unwrap_or_else(|| PathBuf::from("."))
            })
    }
}
