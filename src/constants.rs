//! Application constants and configuration

use std::time::Duration;

pub const APP_NAME: &str = "Smart Code Companion";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BACKEND_ORIGIN: &str = "http://127.0.0.1:8000";
pub const API_PREFIX: &str = "/api/v1";
pub const BACKEND_ENV_VAR: &str = "SMART_CODE_BACKEND";

pub const DOWNLOAD_FILE_NAME: &str = "smart-code-output.txt";

pub const COPY_FEEDBACK: Duration = Duration::from_millis(1500);
pub const VOICE_COUNTDOWN: Duration = Duration::from_secs(2);
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

// Shared messages
pub const EMPTY_CODE_WARNING: &str = "⚠ Please enter some code first!";
pub const NO_OUTPUT: &str = "(no output)";

// Button labels
pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied!";
pub const VOICE_LABEL: &str = "Start Voice Comment";
pub const VOICE_PREPARING_LABEL: &str = "Preparing...";
pub const VOICE_RECORDING_LABEL: &str = "🎤 Recording...";
