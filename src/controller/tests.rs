use super::*;
use crate::api::ApiError;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;

#[derive(Clone)]
enum Reply {
    Run(RunResponse),
    Debug(DebugResponse),
    Comment(CommentResponse),
    Http(u16, serde_json::Value),
    Refused,
}

/// In-memory backend keyed by the submitted code.
#[derive(Default)]
struct FakeAssistant {
    replies: Mutex<HashMap<String, (Duration, Reply)>>,
    calls: Mutex<Vec<(ActionKind, CodeRequest)>>,
}

impl FakeAssistant {
    fn reply(self, code: &str, reply: Reply) -> Self {
        self.reply_after(code, Duration::ZERO, reply)
    }

    fn reply_after(self, code: &str, delay: Duration, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(code.to_string(), (delay, reply));
        self
    }

    fn calls(&self) -> Vec<(ActionKind, CodeRequest)> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, kind: ActionKind, request: CodeRequest) -> Reply {
        let entry = self.replies.lock().unwrap().get(&request.code).cloned();
        self.calls.lock().unwrap().push((kind, request));
        let (delay, reply) = entry.unwrap_or((Duration::ZERO, Reply::Refused));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}

fn failure<T>(reply: Reply) -> ApiResult<T> {
    match reply {
        Reply::Http(status, body) => Err(ApiError::Http { status, body }),
        Reply::Refused => Err(ApiError::Transport(
            "error sending request: connection refused".into(),
        )),
        _ => panic!("reply does not match the endpoint"),
    }
}

#[async_trait]
impl CodeAssistant for FakeAssistant {
    async fn run_code(&self, request: CodeRequest) -> ApiResult<RunResponse> {
        match self.answer(ActionKind::Run, request).await {
            Reply::Run(resp) => Ok(resp),
            other => failure(other),
        }
    }

    async fn debug(&self, request: CodeRequest) -> ApiResult<DebugResponse> {
        match self.answer(ActionKind::Debug, request).await {
            Reply::Debug(resp) => Ok(resp),
            other => failure(other),
        }
    }

    async fn comment(&self, request: CodeRequest) -> ApiResult<CommentResponse> {
        match self.answer(ActionKind::Comment, request).await {
            Reply::Comment(resp) => Ok(resp),
            other => failure(other),
        }
    }

    async fn comment_line(&self, request: CodeRequest) -> ApiResult<CommentResponse> {
        match self.answer(ActionKind::CommentLine, request).await {
            Reply::Comment(resp) => Ok(resp),
            other => failure(other),
        }
    }

    async fn health(&self) -> ApiResult<HealthResponse> {
        Ok(HealthResponse {
            status: "ok".into(),
        })
    }
}

struct FakeRecognizer {
    available: bool,
    transcript: Option<&'static str>,
}

#[async_trait]
impl SpeechRecognizer for FakeRecognizer {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn recognize(&self) -> Result<String, VoiceError> {
        match self.transcript {
            Some(text) => Ok(text.to_string()),
            None => Err(VoiceError::NoSpeech),
        }
    }
}

#[derive(Default)]
struct MemoryClipboard {
    text: Option<String>,
    fail: bool,
}

impl ClipboardSink for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), String> {
        if self.fail {
            return Err("denied".into());
        }
        self.text = Some(text.to_string());
        Ok(())
    }
}

struct Harness {
    // Keeps the worker threads alive for the controller's handle.
    _runtime: tokio::runtime::Runtime,
    controller: Controller,
    fake: Arc<FakeAssistant>,
    ws: Workspace,
}

impl Harness {
    fn new(fake: FakeAssistant) -> Self {
        Self::with_recognizer(
            fake,
            FakeRecognizer {
                available: true,
                transcript: Some("add error handling"),
            },
        )
    }

    fn with_recognizer(fake: FakeAssistant, recognizer: FakeRecognizer) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("test runtime");
        let fake = Arc::new(fake);
        let mut controller = Controller::new(
            fake.clone(),
            Arc::new(recognizer),
            runtime.handle().clone(),
            egui::Context::default(),
        );
        controller.voice_countdown = Duration::from_millis(10);
        Self {
            _runtime: runtime,
            controller,
            fake,
            ws: Workspace::default(),
        }
    }

    /// Waits for the next completion and applies it. False on timeout.
    fn settle_within(&mut self, timeout: Duration) -> bool {
        let handle = self.controller.runtime.clone();
        let rx = &mut self.controller.rx;
        let next = handle.block_on(async { tokio::time::timeout(timeout, rx.recv()).await });
        match next {
            Ok(Some(completion)) => {
                self.controller.apply(&mut self.ws, completion);
                true
            }
            _ => false,
        }
    }

    fn settle(&mut self) -> bool {
        self.settle_within(Duration::from_secs(5))
    }
}

fn run_ok(output: &str) -> Reply {
    Reply::Run(RunResponse {
        output: Some(output.to_string()),
        ..Default::default()
    })
}

fn comment_ok(comment: &str) -> Reply {
    Reply::Comment(CommentResponse {
        comment: comment.to_string(),
        functions: Vec::new(),
        voice_comment: None,
    })
}

// ----------------------------------------------------------------------------
// Validation
// ----------------------------------------------------------------------------

#[test]
fn blank_editor_never_reaches_the_backend() {
    let mut h = Harness::new(FakeAssistant::default());

    for code in ["", "   ", "\n\t \n"] {
        h.ws.editor = code.to_string();
        h.ws.output = "previous".into();
        assert!(h.controller.run(&mut h.ws).is_none());
        assert_eq!(h.ws.output, EMPTY_CODE_WARNING);

        h.ws.output = "previous".into();
        assert!(h.controller.debug(&mut h.ws).is_none());
        assert_eq!(h.ws.output, EMPTY_CODE_WARNING);

        h.ws.output = "previous".into();
        assert!(h.controller.comment(&mut h.ws).is_none());
        assert_eq!(h.ws.output, EMPTY_CODE_WARNING);

        h.ws.output = "previous".into();
        assert!(h.controller.analyze(&mut h.ws).is_none());
        assert_eq!(h.ws.output, EMPTY_CODE_WARNING);
    }

    assert!(!h.settle_within(Duration::from_millis(100)));
    assert!(h.fake.calls().is_empty());
}

#[test]
fn code_is_trimmed_and_sent_with_level() {
    let mut h = Harness::new(FakeAssistant::default().reply("print('X')", run_ok("X")));
    h.ws.editor = "\n  print('X')  \n".into();
    h.ws.level = SkillLevel::Advanced;

    h.controller.run(&mut h.ws).expect("request issued");
    assert!(h.settle());

    let calls = h.fake.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, ActionKind::Run);
    assert_eq!(
        calls[0].1,
        CodeRequest {
            code: "print('X')".into(),
            level: SkillLevel::Advanced,
        }
    );
}

// ----------------------------------------------------------------------------
// Run / Debug
// ----------------------------------------------------------------------------

#[test]
fn run_shows_pending_then_output() {
    let mut h = Harness::new(FakeAssistant::default().reply("print('X')", run_ok("X")));
    h.ws.editor = "print('X')".into();

    h.controller.run(&mut h.ws);
    assert_eq!(h.ws.output, "▶ Running code...");
    assert_eq!(h.ws.status, StatusLine::busy("Executing..."));

    assert!(h.settle());
    assert_eq!(h.ws.output, "X");
    assert_eq!(h.ws.status.phase, Phase::Complete);
    assert_eq!(h.ws.status.text, "Complete");
}

#[test]
fn run_application_error_marks_status_error() {
    let mut h = Harness::new(FakeAssistant::default().reply(
        "boom",
        Reply::Run(RunResponse {
            error: Some("E".into()),
            ..Default::default()
        }),
    ));
    h.ws.editor = "boom".into();

    h.controller.run(&mut h.ws);
    assert!(h.settle());
    assert!(h.ws.output.contains('E'));
    assert_eq!(h.ws.status.phase, Phase::Error);
    assert_eq!(h.ws.status.text, "Error");
}

#[test]
fn connection_refused_on_every_endpoint() {
    let mut h = Harness::new(FakeAssistant::default());
    h.ws.editor = "x = 1".into();

    let actions: [fn(&mut Controller, &mut Workspace) -> Option<u64>; 4] = [
        Controller::run,
        Controller::debug,
        Controller::comment,
        Controller::analyze,
    ];
    for action in actions {
        action(&mut h.controller, &mut h.ws);
        assert!(h.settle());
        assert_eq!(h.ws.status.phase, Phase::ConnectionFailed);
        assert_eq!(h.ws.status.text, "Connection Failed");
        assert!(h.ws.output.contains("connection refused"), "{}", h.ws.output);
        assert_eq!(h.ws.editor, "x = 1");
    }
}

#[test]
fn debug_http_error_shows_backend_body() {
    let mut h = Harness::new(
        FakeAssistant::default().reply("x", Reply::Http(500, json!({"detail": "AI provider error"}))),
    );
    h.ws.editor = "x".into();

    h.controller.debug(&mut h.ws);
    assert_eq!(h.ws.status.text, "Debugging...");
    assert!(h.settle());
    assert_eq!(h.ws.status.text, "Debug error");
    assert!(h.ws.output.contains("AI provider error"));
}

#[test]
fn debug_success_shows_fixed_code() {
    let mut h = Harness::new(FakeAssistant::default().reply(
        "print(x)",
        Reply::Debug(DebugResponse {
            fixed_code: Some("x = 0\nprint(x)".into()),
            error: Some("name 'x' is not defined".into()),
            explanation: Some("x is used before assignment".into()),
            suggestion: None,
        }),
    ));
    h.ws.editor = "print(x)".into();

    h.controller.debug(&mut h.ws);
    assert!(h.settle());
    assert_eq!(h.ws.status.phase, Phase::Complete);
    assert!(h.ws.output.starts_with("🐞 Fixed Code:\nx = 0\nprint(x)"));
    assert!(h.ws.output.contains("Explanation:\nx is used before assignment"));
    assert!(!h.ws.output.contains("Suggestion"));
}

// ----------------------------------------------------------------------------
// Comment / Analyze
// ----------------------------------------------------------------------------

#[test]
fn comment_replaces_editor_exactly() {
    let mut h = Harness::new(FakeAssistant::default().reply("x = 1", comment_ok("// annotated")));
    h.ws.editor = "x = 1".into();

    h.controller.comment(&mut h.ws);
    assert_eq!(h.ws.output, "💡 Generating comments...");
    assert!(h.settle());
    assert_eq!(h.ws.editor, "// annotated");
    assert_eq!(h.ws.output, "✅ Code explained in comments!");
    assert_eq!(h.ws.status.phase, Phase::Complete);
}

#[test]
fn analyze_leaves_editor_untouched() {
    let mut h = Harness::new(FakeAssistant::default().reply("x = 1", comment_ok("// annotated")));
    h.ws.editor = "x = 1".into();

    h.controller.analyze(&mut h.ws);
    assert_eq!(h.ws.status.text, "Analyzing...");
    assert!(h.settle());
    assert_eq!(h.ws.editor, "x = 1");
    assert!(h.ws.output.contains("// annotated"));
    assert_eq!(h.ws.status.text, "Analysis Complete");
}

#[test]
fn analyze_and_comment_hit_the_same_endpoint() {
    let mut h = Harness::new(FakeAssistant::default().reply("x = 1", comment_ok("// annotated")));
    h.ws.editor = "x = 1".into();

    h.controller.analyze(&mut h.ws);
    assert!(h.settle());
    h.controller.comment(&mut h.ws);
    assert!(h.settle());

    let calls = h.fake.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(kind, req)| *kind == ActionKind::Comment && req.code == "x = 1"));
}

// ----------------------------------------------------------------------------
// Stale responses
// ----------------------------------------------------------------------------

#[test]
fn older_run_reply_never_overwrites_newer() {
    let fake = FakeAssistant::default()
        .reply_after("slow", Duration::from_millis(300), run_ok("first"))
        .reply("fast", run_ok("second"));
    let mut h = Harness::new(fake);

    h.ws.editor = "slow".into();
    let first = h.controller.run(&mut h.ws).unwrap();
    h.ws.editor = "fast".into();
    let second = h.controller.run(&mut h.ws).unwrap();
    assert!(second > first);

    assert!(h.settle());
    assert_eq!(h.ws.output, "second");
    assert!(h.settle());
    assert_eq!(h.ws.output, "second");
}

#[test]
fn clear_does_not_discard_inflight_run() {
    let fake = FakeAssistant::default()
        .reply_after("code", Duration::from_millis(100), run_ok("ran"));
    let mut h = Harness::new(fake);
    h.ws.editor = "code".into();

    h.controller.run(&mut h.ws);
    h.controller.clear(&mut h.ws);
    assert!(h.settle());
    assert_eq!(h.ws.output, "ran");
}

// ----------------------------------------------------------------------------
// Per-line comments
// ----------------------------------------------------------------------------

#[test]
fn enter_comments_the_completed_line_in_place() {
    let fake = FakeAssistant::default().reply("print(x)", comment_ok("print(x)  # shows x"));
    let mut h = Harness::new(fake);
    h.ws.editor = "x = 1\nprint(x)\n".into();

    let cursor = h.ws.editor.chars().count();
    let (index, line) = line_before_cursor(&h.ws.editor, cursor).unwrap();
    h.controller.comment_line(&h.ws, index, line).expect("request issued");
    assert!(h.settle());

    assert_eq!(h.ws.editor, "x = 1\nprint(x)  # shows x\n");
    assert_eq!(h.fake.calls()[0].0, ActionKind::CommentLine);
}

#[test]
fn back_to_back_line_comments_both_land() {
    let fake = FakeAssistant::default()
        .reply_after("a = 1", Duration::from_millis(150), comment_ok("a = 1  # one"))
        .reply("b = 2", comment_ok("b = 2  # two"));
    let mut h = Harness::new(fake);
    h.ws.editor = "a = 1\nb = 2\n".into();

    h.controller.comment_line(&h.ws, 0, "a = 1".into()).expect("request issued");
    h.controller.comment_line(&h.ws, 1, "b = 2".into()).expect("request issued");
    assert!(h.settle());
    assert!(h.settle());

    assert_eq!(h.ws.editor, "a = 1  # one\nb = 2  # two\n");
}

#[test]
fn line_comment_skips_a_line_edited_meanwhile() {
    let fake = FakeAssistant::default().reply_after(
        "x = 1",
        Duration::from_millis(50),
        comment_ok("x = 1  # sets x"),
    );
    let mut h = Harness::new(fake);
    h.ws.editor = "x = 1\n".into();

    h.controller.comment_line(&h.ws, 0, "x = 1".into()).expect("request issued");
    h.ws.editor = "x = 2\n".into();
    assert!(h.settle());

    assert_eq!(h.ws.editor, "x = 2\n");
}

#[test]
fn blank_lines_are_not_commented() {
    let mut h = Harness::new(FakeAssistant::default());
    assert!(h.controller.comment_line(&h.ws, 0, "   ".into()).is_none());
    assert!(!h.settle_within(Duration::from_millis(50)));
}

#[test]
fn failed_line_comment_keeps_editor() {
    let mut h = Harness::new(FakeAssistant::default());
    h.ws.editor = "x = 1\n".into();
    h.controller.comment_line(&h.ws, 0, "x = 1".into()).expect("request issued");
    assert!(h.settle());
    assert_eq!(h.ws.editor, "x = 1\n");
    assert_eq!(h.ws.status.phase, Phase::ConnectionFailed);
}

// ----------------------------------------------------------------------------
// Local actions
// ----------------------------------------------------------------------------

#[test]
fn clear_resets_everything() {
    let mut h = Harness::new(FakeAssistant::default());
    h.ws.editor = "x = 1".into();
    h.ws.output = "something".into();
    h.ws.status = StatusLine::error("Error");

    h.controller.clear(&mut h.ws);
    assert_eq!(h.ws.editor, "");
    assert_eq!(h.ws.output, NO_OUTPUT);
    assert_eq!(h.ws.status.text, "Idle");
    assert_eq!(h.ws.status.phase, Phase::Idle);
}

#[test]
fn copy_swaps_label_then_restores() {
    let mut h = Harness::new(FakeAssistant::default());
    h.ws.output = "result text".into();
    let mut clipboard = MemoryClipboard::default();
    let start = Instant::now();

    h.controller.copy_output(&mut h.ws, &mut clipboard, start);
    assert_eq!(clipboard.text.as_deref(), Some("result text"));
    assert_eq!(h.ws.copy_label, COPIED_LABEL);

    let remaining = h
        .controller
        .tick(&mut h.ws, start + Duration::from_millis(1000))
        .expect("still showing feedback");
    assert_eq!(remaining, Duration::from_millis(500));
    assert_eq!(h.ws.copy_label, COPIED_LABEL);

    assert!(h.controller.tick(&mut h.ws, start + COPY_FEEDBACK).is_none());
    assert_eq!(h.ws.copy_label, COPY_LABEL);
}

#[test]
fn copy_twice_still_restores_original_label() {
    let mut h = Harness::new(FakeAssistant::default());
    let mut clipboard = MemoryClipboard::default();
    let start = Instant::now();

    h.controller.copy_output(&mut h.ws, &mut clipboard, start);
    h.controller
        .copy_output(&mut h.ws, &mut clipboard, start + Duration::from_millis(200));
    h.controller
        .tick(&mut h.ws, start + Duration::from_millis(1700));
    assert_eq!(h.ws.copy_label, COPY_LABEL);
}

#[test]
fn copy_failure_changes_nothing_visible() {
    let mut h = Harness::new(FakeAssistant::default());
    h.ws.output = "result".into();
    let mut clipboard = MemoryClipboard {
        text: None,
        fail: true,
    };

    h.controller.copy_output(&mut h.ws, &mut clipboard, Instant::now());
    assert_eq!(h.ws.copy_label, COPY_LABEL);
    assert_eq!(h.ws.output, "result");
    assert!(h.controller.tick(&mut h.ws, Instant::now()).is_none());
}

#[test]
fn missing_clipboard_is_a_logged_failure() {
    let mut h = Harness::new(FakeAssistant::default());
    let mut clipboard: Option<MemoryClipboard> = None;
    h.controller.copy_output(&mut h.ws, &mut clipboard, Instant::now());
    assert_eq!(h.ws.copy_label, COPY_LABEL);
}

#[test]
fn download_writes_output_verbatim() {
    let h = Harness::new(FakeAssistant::default());
    let dir = tempfile::tempdir().unwrap();
    let mut ws = Workspace::default();
    ws.output = "line 1\nline 2 ✅\n".into();

    let path = h.controller.download_output(&ws, dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), DOWNLOAD_FILE_NAME);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "line 1\nline 2 ✅\n");

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn download_creates_missing_folder() {
    let h = Harness::new(FakeAssistant::default());
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("exports").join("today");
    let path = h
        .controller
        .download_output(&Workspace::default(), &nested)
        .unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), NO_OUTPUT);
}

// ----------------------------------------------------------------------------
// Voice
// ----------------------------------------------------------------------------

#[test]
fn voice_without_engine_raises_alert() {
    let mut h = Harness::with_recognizer(
        FakeAssistant::default(),
        FakeRecognizer {
            available: false,
            transcript: None,
        },
    );
    h.ws.output = "unchanged".into();

    h.controller.toggle_voice(&mut h.ws);
    assert!(h.ws.alert.as_deref().unwrap().contains("not available"));
    assert_eq!(h.ws.output, "unchanged");
    assert_eq!(h.controller.voice_phase(), VoicePhase::Idle);
    assert!(!h.settle_within(Duration::from_millis(50)));
}

#[test]
fn voice_appends_instruction_line() {
    let mut h = Harness::new(FakeAssistant::default());
    h.ws.editor = "def f():\n    pass".into();

    h.controller.toggle_voice(&mut h.ws);
    assert_eq!(h.controller.voice_phase(), VoicePhase::CountingDown);
    assert_eq!(h.ws.voice_label, VOICE_PREPARING_LABEL);
    assert!(h.ws.output.contains("2 seconds"));

    assert!(h.settle());
    assert_eq!(h.controller.voice_phase(), VoicePhase::Listening);
    assert_eq!(h.ws.voice_label, VOICE_RECORDING_LABEL);
    assert_eq!(h.ws.output, "Listening now! Speak clearly.");

    assert!(h.settle());
    assert_eq!(h.controller.voice_phase(), VoicePhase::Completed);
    assert_eq!(
        h.ws.editor,
        "def f():\n    pass\n# Voice Instruction: add error handling"
    );
    assert_eq!(h.ws.output, "✅ Voice comment added!");
    assert_eq!(h.ws.voice_label, VOICE_LABEL);
}

#[test]
fn voice_failure_reports_engine_error() {
    let mut h = Harness::with_recognizer(
        FakeAssistant::default(),
        FakeRecognizer {
            available: true,
            transcript: None,
        },
    );
    h.ws.editor = "x = 1".into();

    h.controller.toggle_voice(&mut h.ws);
    assert!(h.settle());
    assert!(h.settle());
    assert_eq!(h.controller.voice_phase(), VoicePhase::Failed);
    assert_eq!(h.ws.output, "⚠ Speech recognition failed: no-speech");
    assert_eq!(h.ws.voice_label, VOICE_LABEL);
    assert_eq!(h.ws.editor, "x = 1");
}

#[test]
fn reclick_during_countdown_cancels_session() {
    let mut h = Harness::new(FakeAssistant::default());
    h.controller.voice_countdown = Duration::from_millis(200);
    h.ws.editor = "x = 1".into();

    h.controller.toggle_voice(&mut h.ws);
    h.controller.toggle_voice(&mut h.ws);
    assert_eq!(h.controller.voice_phase(), VoicePhase::Idle);
    assert_eq!(h.ws.voice_label, VOICE_LABEL);

    assert!(!h.settle_within(Duration::from_millis(400)));
    assert_eq!(h.ws.editor, "x = 1");
}

#[test]
fn events_from_an_old_session_are_ignored() {
    let mut h = Harness::new(FakeAssistant::default());
    h.controller.voice_countdown = Duration::from_secs(60);

    h.controller.toggle_voice(&mut h.ws);
    let old = h.controller.voice.id;
    h.controller.cancel_voice(&mut h.ws);
    h.controller.toggle_voice(&mut h.ws);

    h.controller.apply(
        &mut h.ws,
        Completion::Voice {
            session: old,
            event: VoiceEvent::Finished(Ok("stale".into())),
        },
    );
    assert!(!h.ws.editor.contains("stale"));
    assert_eq!(h.controller.voice_phase(), VoicePhase::CountingDown);
}

// ----------------------------------------------------------------------------
// Health
// ----------------------------------------------------------------------------

#[test]
fn health_check_marks_backend_online() {
    let mut h = Harness::new(FakeAssistant::default());
    assert_eq!(h.ws.health, BackendHealth::Unknown);
    h.controller.check_health();
    assert!(h.settle());
    assert_eq!(h.ws.health, BackendHealth::Online);
}
