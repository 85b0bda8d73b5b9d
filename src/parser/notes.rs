use crate::model::{truncate_chars, MAX_NOTES_CHARS};

/// Body text with table rows and alignment rows removed, flattened to one line.
pub fn extract(body: &str) -> Option<String> {
    let kept: Vec<&str> = body
        .lines()
        .filter(|line| {
            let l = line.trim();
            !l.starts_with('|') && !l.starts_with(":-")
        })
        .collect();

    let joined = kept.join(" ");
    let note = truncate_chars(joined.trim(), MAX_NOTES_CHARS);
    if note.is_empty() {
        None
    } else {
        Some(note)
    }
}
