//! UI controller - maps every button/key action onto the backend and applies replies
//!
//! Handlers take the view state (`Workspace`) explicitly. Network handlers spawn one request
//! on the tokio runtime and return immediately; replies come back over a channel and are
//! applied on the UI thread by `poll`. Each action category carries a monotonically
//! increasing token so an older reply can never overwrite a newer one.

mod clipboard;
mod lines;
mod render;
mod workspace;

pub use clipboard::ClipboardSink;
pub use lines::line_before_cursor;
pub use workspace::{BackendHealth, Phase, StatusLine, Workspace};

use crate::api::{ApiError, ApiResult, CodeAssistant};
use crate::constants::*;
use crate::types::*;
use crate::voice::{SpeechRecognizer, VoiceError, VoicePhase};
use eframe::egui;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// A finished background task, waiting to be applied on the UI thread.
pub enum Completion {
    Action {
        kind: ActionKind,
        token: u64,
        outcome: Outcome,
    },
    Voice {
        session: u64,
        event: VoiceEvent,
    },
    Health(ApiResult<HealthResponse>),
}

pub enum Outcome {
    Run(ApiResult<RunResponse>),
    Debug(ApiResult<DebugResponse>),
    Comment(ApiResult<CommentResponse>),
    CommentLine {
        index: usize,
        sent: String,
        result: ApiResult<CommentResponse>,
    },
}

pub enum VoiceEvent {
    Listening,
    Finished(Result<String, VoiceError>),
}

#[derive(Default)]
struct RequestTokens {
    next: u64,
    latest: HashMap<ActionKind, u64>,
}

impl RequestTokens {
    fn issue(&mut self, kind: ActionKind) -> u64 {
        self.next += 1;
        self.latest.insert(kind, self.next);
        self.next
    }

    fn is_latest(&self, kind: ActionKind, token: u64) -> bool {
        self.latest.get(&kind) == Some(&token)
    }
}

struct VoiceSession {
    id: u64,
    phase: VoicePhase,
    cancel: Option<CancellationToken>,
}

pub struct Controller {
    assistant: Arc<dyn CodeAssistant>,
    recognizer: Arc<dyn SpeechRecognizer>,
    runtime: tokio::runtime::Handle,
    ctx: egui::Context,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    tokens: RequestTokens,
    voice: VoiceSession,
    voice_countdown: Duration,
    copied_at: Option<Instant>,
}

impl Controller {
    pub fn new(
        assistant: Arc<dyn CodeAssistant>,
        recognizer: Arc<dyn SpeechRecognizer>,
        runtime: tokio::runtime::Handle,
        ctx: egui::Context,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            assistant,
            recognizer,
            runtime,
            ctx,
            tx,
            rx,
            tokens: RequestTokens::default(),
            voice: VoiceSession {
                id: 0,
                phase: VoicePhase::Idle,
                cancel: None,
            },
            voice_countdown: VOICE_COUNTDOWN,
            copied_at: None,
        }
    }

    pub fn set_assistant(&mut self, assistant: Arc<dyn CodeAssistant>) {
        self.assistant = assistant;
    }

    pub fn set_recognizer(&mut self, recognizer: Arc<dyn SpeechRecognizer>, ws: &mut Workspace) {
        if self.voice.phase.is_active() {
            self.cancel_voice(ws);
        }
        self.recognizer = recognizer;
    }

    pub fn voice_phase(&self) -> VoicePhase {
        self.voice.phase
    }

    // ------------------------------------------------------------------------
    // Network actions
    // ------------------------------------------------------------------------

    pub fn run(&mut self, ws: &mut Workspace) -> Option<u64> {
        let request = Self::validated_request(ws)?;
        render::run_pending(ws);
        let assistant = self.assistant.clone();
        Some(self.spawn_action(ActionKind::Run, async move {
            Outcome::Run(assistant.run_code(request).await)
        }))
    }

    pub fn debug(&mut self, ws: &mut Workspace) -> Option<u64> {
        let request = Self::validated_request(ws)?;
        render::debug_pending(ws);
        let assistant = self.assistant.clone();
        Some(self.spawn_action(ActionKind::Debug, async move {
            Outcome::Debug(assistant.debug(request).await)
        }))
    }

    /// Annotates the code; the reply replaces the editor.
    pub fn comment(&mut self, ws: &mut Workspace) -> Option<u64> {
        let request = Self::validated_request(ws)?;
        render::comment_pending(ws);
        Some(self.request_comment(ActionKind::Comment, request))
    }

    /// Same request as `comment`, but the reply is only shown in the output panel.
    pub fn analyze(&mut self, ws: &mut Workspace) -> Option<u64> {
        let request = Self::validated_request(ws)?;
        render::analyze_pending(ws);
        Some(self.request_comment(ActionKind::Analyze, request))
    }

    /// Comment a single line in place. `index` and `line` come from `line_before_cursor`.
    pub fn comment_line(&mut self, ws: &Workspace, index: usize, line: String) -> Option<u64> {
        if line.trim().is_empty() {
            return None;
        }
        let request = CodeRequest {
            code: line.clone(),
            level: ws.level,
        };
        let assistant = self.assistant.clone();
        Some(self.spawn_action(ActionKind::CommentLine, async move {
            Outcome::CommentLine {
                index,
                sent: line,
                result: assistant.comment_line(request).await,
            }
        }))
    }

    pub fn check_health(&self) {
        let assistant = self.assistant.clone();
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            let result = assistant.health().await;
            let _ = tx.send(Completion::Health(result));
            ctx.request_repaint();
        });
    }

    fn validated_request(ws: &mut Workspace) -> Option<CodeRequest> {
        let code = ws.editor.trim();
        if code.is_empty() {
            ws.output = EMPTY_CODE_WARNING.to_string();
            return None;
        }
        Some(CodeRequest {
            code: code.to_string(),
            level: ws.level,
        })
    }

    fn request_comment(&mut self, kind: ActionKind, request: CodeRequest) -> u64 {
        let assistant = self.assistant.clone();
        self.spawn_action(kind, async move {
            Outcome::Comment(assistant.comment(request).await)
        })
    }

    fn spawn_action<F>(&mut self, kind: ActionKind, request: F) -> u64
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let token = self.tokens.issue(kind);
        info!(action = ?kind, token, endpoint = kind.endpoint(), "Request issued");

        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            let outcome = request.await;
            let _ = tx.send(Completion::Action {
                kind,
                token,
                outcome,
            });
            ctx.request_repaint();
        });
        token
    }

    // ------------------------------------------------------------------------
    // Local actions
    // ------------------------------------------------------------------------

    pub fn clear(&mut self, ws: &mut Workspace) {
        ws.editor.clear();
        ws.show(NO_OUTPUT, StatusLine::idle());
    }

    pub fn copy_output(&mut self, ws: &mut Workspace, clipboard: &mut dyn ClipboardSink, now: Instant) {
        match clipboard.set_text(&ws.output) {
            Ok(()) => {
                ws.copy_label = COPIED_LABEL.to_string();
                self.copied_at = Some(now);
            }
            Err(e) => error!(error = %e, "Failed to copy text"),
        }
    }

    /// Restores timed labels. Returns how long until the next restore is due.
    pub fn tick(&mut self, ws: &mut Workspace, now: Instant) -> Option<Duration> {
        let at = self.copied_at?;
        let elapsed = now.saturating_duration_since(at);
        if elapsed >= COPY_FEEDBACK {
            ws.copy_label = COPY_LABEL.to_string();
            self.copied_at = None;
            None
        } else {
            Some(COPY_FEEDBACK - elapsed)
        }
    }

    /// Writes the output panel verbatim to `dir/smart-code-output.txt`.
    pub fn download_output(&self, ws: &Workspace, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(DOWNLOAD_FILE_NAME);
        std::fs::write(&path, ws.output.as_bytes())?;
        info!(path = %path.display(), bytes = ws.output.len(), "Output saved");
        Ok(path)
    }

    // ------------------------------------------------------------------------
    // Voice dictation
    // ------------------------------------------------------------------------

    /// Starts a dictation session, or cancels the one in progress.
    pub fn toggle_voice(&mut self, ws: &mut Workspace) {
        if self.voice.phase.is_active() {
            self.cancel_voice(ws);
            return;
        }

        if !self.recognizer.is_available() {
            warn!("Speech recognition unavailable");
            ws.alert = Some(
                "⚠ Speech recognition is not available. Install ffmpeg and whisper, \
                 or point Settings at them."
                    .to_string(),
            );
            return;
        }

        self.voice.id += 1;
        let session = self.voice.id;
        let cancel = CancellationToken::new();
        self.voice.cancel = Some(cancel.clone());
        self.voice.phase = VoicePhase::CountingDown;

        ws.output = format!(
            "🎤 Get ready, speaking starts in {} seconds...",
            VOICE_COUNTDOWN.as_secs()
        );
        ws.voice_label = VOICE_PREPARING_LABEL.to_string();
        info!(session, "Voice session started");

        let recognizer = self.recognizer.clone();
        let countdown = self.voice_countdown;
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(countdown) => {}
            }
            let _ = tx.send(Completion::Voice {
                session,
                event: VoiceEvent::Listening,
            });
            ctx.request_repaint();

            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = recognizer.recognize() => result,
            };
            let _ = tx.send(Completion::Voice {
                session,
                event: VoiceEvent::Finished(result),
            });
            ctx.request_repaint();
        });
    }

    pub fn cancel_voice(&mut self, ws: &mut Workspace) {
        if let Some(cancel) = self.voice.cancel.take() {
            cancel.cancel();
        }
        if self.voice.phase.is_active() {
            info!(session = self.voice.id, "Voice session cancelled");
            ws.output = "Voice comment cancelled.".to_string();
        }
        self.voice.phase = VoicePhase::Idle;
        ws.voice_label = VOICE_LABEL.to_string();
    }

    // ------------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------------

    /// Applies every completion that has arrived. Returns how many were applied.
    pub fn poll(&mut self, ws: &mut Workspace) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(ws, completion);
            applied += 1;
        }
        applied
    }

    pub fn apply(&mut self, ws: &mut Workspace, completion: Completion) {
        match completion {
            Completion::Action {
                kind,
                token,
                outcome,
            } => {
                // Line comments target distinct lines; replace_line guards each one
                let superseded =
                    kind != ActionKind::CommentLine && !self.tokens.is_latest(kind, token);
                if superseded {
                    debug!(action = ?kind, token, "Dropping stale response");
                    return;
                }
                self.apply_outcome(ws, kind, outcome);
            }
            Completion::Voice { session, event } => self.apply_voice(ws, session, event),
            Completion::Health(result) => {
                ws.health = match result {
                    Ok(resp) if resp.status == "ok" => BackendHealth::Online,
                    Ok(resp) => BackendHealth::Offline(resp.status),
                    Err(e) => {
                        warn!(error = %e, "Backend health check failed");
                        BackendHealth::Offline(e.to_string())
                    }
                };
            }
        }
    }

    fn apply_outcome(&mut self, ws: &mut Workspace, kind: ActionKind, outcome: Outcome) {
        match (kind, outcome) {
            (_, Outcome::Run(result)) => render::run_result(ws, result),
            (_, Outcome::Debug(result)) => render::debug_result(ws, result),
            (ActionKind::Analyze, Outcome::Comment(result)) => render::analyze_result(ws, result),
            (_, Outcome::Comment(result)) => render::comment_result(ws, result),
            (_, Outcome::CommentLine {
                index,
                sent,
                result,
            }) => match result {
                Ok(resp) => {
                    if !lines::replace_line(&mut ws.editor, index, &sent, &resp.comment) {
                        debug!(line = index, "Line changed before its comment arrived");
                    }
                }
                Err(e) => {
                    warn!(line = index, error = %e, "Line comment failed");
                    ws.status = match e {
                        ApiError::Http { .. } => StatusLine::error("Line comment failed"),
                        _ => StatusLine::connection_failed(),
                    };
                }
            },
        }
        debug!(action = ?kind, status = ?ws.status.phase, "Response applied");
    }

    fn apply_voice(&mut self, ws: &mut Workspace, session: u64, event: VoiceEvent) {
        if session != self.voice.id || !self.voice.phase.is_active() {
            debug!(session, "Ignoring event from finished voice session");
            return;
        }
        match event {
            VoiceEvent::Listening => {
                self.voice.phase = VoicePhase::Listening;
                ws.voice_label = VOICE_RECORDING_LABEL.to_string();
                ws.output = "Listening now! Speak clearly.".to_string();
            }
            VoiceEvent::Finished(Ok(transcript)) => {
                ws.editor
                    .push_str(&format!("\n# Voice Instruction: {}", transcript.trim()));
                ws.output = "✅ Voice comment added!".to_string();
                ws.voice_label = VOICE_LABEL.to_string();
                self.voice.phase = VoicePhase::Completed;
                self.voice.cancel = None;
                info!(session, "Voice comment added");
            }
            VoiceEvent::Finished(Err(e)) => {
                warn!(session, error = %e, "Speech recognition failed");
                ws.output = format!("⚠ Speech recognition failed: {e}");
                ws.voice_label = VOICE_LABEL.to_string();
                self.voice.phase = VoicePhase::Failed;
                self.voice.cancel = None;
            }
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Some(cancel) = self.voice.cancel.take() {
            cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests;
