//! Turns endpoint outcomes into output/status/editor updates

use super::workspace::{StatusLine, Workspace};
use crate::api::{ApiError, ApiResult};
use crate::constants::NO_OUTPUT;
use crate::types::{CommentResponse, DebugResponse, RunResponse};

/// Pretty JSON of an error body, the way the backend sent it.
pub fn error_body(body: &serde_json::Value) -> String {
    serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
}

pub fn run_pending(ws: &mut Workspace) {
    ws.show("▶ Running code...", StatusLine::busy("Executing..."));
}

pub fn run_result(ws: &mut Workspace, result: ApiResult<RunResponse>) {
    match result {
        Ok(RunResponse {
            error: Some(error), ..
        }) if !error.is_empty() => ws.show(format!("❌ Error:\n{error}"), StatusLine::error("Error")),
        Ok(resp) => {
            let output = resp
                .output
                .filter(|o| !o.is_empty())
                .unwrap_or_else(|| NO_OUTPUT.to_string());
            ws.show(output, StatusLine::complete("Complete"));
        }
        Err(ApiError::Http { body, .. }) => ws.show(
            format!("Error from backend:\n{}", error_body(&body)),
            StatusLine::error("Error"),
        ),
        Err(e) => ws.show(
            format!("Failed to connect. Error: {e}"),
            StatusLine::connection_failed(),
        ),
    }
}

pub fn debug_pending(ws: &mut Workspace) {
    ws.show(
        "Sending code to the debugger...",
        StatusLine::busy("Debugging..."),
    );
}

pub fn debug_result(ws: &mut Workspace, result: ApiResult<DebugResponse>) {
    match result {
        Ok(resp) => {
            let fixed = resp.fixed_code.unwrap_or_default();
            let output = match resp.error.filter(|e| !e.is_empty()) {
                Some(error) => {
                    let explanation = resp.explanation.unwrap_or_default();
                    let mut text = format!(
                        "🐞 Fixed Code:\n{fixed}\n\nError:\n{error}\n\nExplanation:\n{explanation}"
                    );
                    if let Some(suggestion) = resp.suggestion.filter(|s| !s.is_empty()) {
                        text.push_str(&format!("\n\nSuggestion:\n{suggestion}"));
                    }
                    text
                }
                None => format!("🐞 Fixed Code:\n{fixed}\n(No errors detected)"),
            };
            ws.show(output, StatusLine::complete("Debug complete"));
        }
        Err(ApiError::Http { body, .. }) => ws.show(
            format!("Error from backend:\n{}", error_body(&body)),
            StatusLine::error("Debug error"),
        ),
        Err(e) => ws.show(
            format!("Failed to connect to the backend. Error: {e}"),
            StatusLine::connection_failed(),
        ),
    }
}

pub fn comment_pending(ws: &mut Workspace) {
    ws.show("💡 Generating comments...", StatusLine::busy("Commenting..."));
}

/// Comment mode: the annotated code replaces the editor.
pub fn comment_result(ws: &mut Workspace, result: ApiResult<CommentResponse>) {
    match result {
        Ok(resp) => {
            ws.editor = resp.comment;
            ws.show(
                "✅ Code explained in comments!",
                StatusLine::complete("Complete"),
            );
        }
        Err(ApiError::Http { body, .. }) => ws.show(
            format!("❌ Error from backend:\n{}", error_body(&body)),
            StatusLine::error("Error"),
        ),
        Err(e) => ws.show(
            format!("⚠ Failed to connect to backend. Error: {e}"),
            StatusLine::connection_failed(),
        ),
    }
}

pub fn analyze_pending(ws: &mut Workspace) {
    ws.show("🧠 Analyzing...", StatusLine::busy("Analyzing..."));
}

/// Analyze mode: same response as Comment, shown read-only.
pub fn analyze_result(ws: &mut Workspace, result: ApiResult<CommentResponse>) {
    match result {
        Ok(resp) => {
            let mut text = format!("💡 Comments:\n\n{}", resp.comment);
            if !resp.functions.is_empty() {
                text.push_str("\n\nFunctions:");
                for f in &resp.functions {
                    text.push_str(&format!("\n- {}: {}", f.name, f.comment));
                }
            }
            ws.show(text, StatusLine::complete("Analysis Complete"));
        }
        Err(ApiError::Http { body, .. }) => ws.show(
            format!("Error from backend:\n{}", error_body(&body)),
            StatusLine::error("Analysis Error"),
        ),
        Err(e) => ws.show(
            format!("Failed to connect to the backend. Is it running?\nError: {e}"),
            StatusLine::connection_failed(),
        ),
    }
}
