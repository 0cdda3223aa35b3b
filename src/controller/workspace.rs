//! View state shared by every handler

use crate::constants::{COPY_LABEL, NO_OUTPUT, VOICE_LABEL};
use crate::types::SkillLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Busy,
    Complete,
    Error,
    ConnectionFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub phase: Phase,
    pub text: String,
}

impl StatusLine {
    pub fn new(phase: Phase, text: impl Into<String>) -> Self {
        Self {
            phase,
            text: text.into(),
        }
    }

    pub fn idle() -> Self {
        Self::new(Phase::Idle, "Idle")
    }

    pub fn busy(text: impl Into<String>) -> Self {
        Self::new(Phase::Busy, text)
    }

    pub fn complete(text: impl Into<String>) -> Self {
        Self::new(Phase::Complete, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Phase::Error, text)
    }

    pub fn connection_failed() -> Self {
        Self::new(Phase::ConnectionFailed, "Connection Failed")
    }
}

/// Result of the startup health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendHealth {
    Unknown,
    Online,
    Offline(String),
}

/// Everything the window shows. Handlers mutate it; the shell only draws it.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub editor: String,
    pub output: String,
    pub status: StatusLine,
    pub level: SkillLevel,
    pub copy_label: String,
    pub voice_label: String,
    /// Blocking message the shell shows as a modal until dismissed
    pub alert: Option<String>,
    pub health: BackendHealth,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            editor: String::new(),
            output: NO_OUTPUT.to_string(),
            status: StatusLine::idle(),
            level: SkillLevel::default(),
            copy_label: COPY_LABEL.to_string(),
            voice_label: VOICE_LABEL.to_string(),
            alert: None,
            health: BackendHealth::Unknown,
        }
    }
}

impl Workspace {
    pub fn with_level(level: SkillLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub(crate) fn show(&mut self, output: impl Into<String>, status: StatusLine) {
        self.output = output.into();
        self.status = status;
    }
}
