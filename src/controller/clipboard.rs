//! Clipboard seam for the Copy action

pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), String>;
}

impl ClipboardSink for arboard::Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), String> {
        arboard::Clipboard::set_text(self, text.to_owned()).map_err(|e| e.to_string())
    }
}

/// Clipboard init can fail on headless sessions; copying then reports an error.
impl<C: ClipboardSink> ClipboardSink for Option<C> {
    fn set_text(&mut self, text: &str) -> Result<(), String> {
        match self {
            Some(clipboard) => clipboard.set_text(text),
            None => Err("clipboard unavailable".to_string()),
        }
    }
}
