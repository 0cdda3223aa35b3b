//! Line lookup for the comment-on-Enter handler. Cursor positions are char indices,
//! matching egui's `CCursor`.

/// Line that was just completed by pressing Enter.
///
/// After Enter the cursor sits at the start of a fresh line, so the completed line is the
/// one before the cursor's line. Returns `(line_index, text)`.
pub fn line_before_cursor(text: &str, cursor: usize) -> Option<(usize, String)> {
    let byte = char_to_byte(text, cursor);
    let cursor_line = text[..byte].matches('\n').count();
    if cursor_line == 0 {
        return None;
    }
    let index = cursor_line - 1;
    text.split('\n')
        .nth(index)
        .map(|line| (index, line.trim_end_matches('\r').to_string()))
}

/// Replace line `index` with `replacement` if it still reads `expected`.
/// Returns false (and leaves `text` alone) when the line moved or was edited.
pub fn replace_line(text: &mut String, index: usize, expected: &str, replacement: &str) -> bool {
    let mut lines: Vec<&str> = text.split('\n').collect();
    match lines.get(index) {
        Some(line) if line.trim_end_matches('\r') == expected => {}
        _ => return false,
    }
    lines[index] = replacement;
    *text = lines.join("\n");
    true
}

fn char_to_byte(text: &str, cursor: usize) -> usize {
    text.char_indices()
        .nth(cursor)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}
