//! Plain-text rendering of notes for the terminal.

use crate::models::{parse_timestamp, Note};

const PREVIEW_WIDTH: usize = 48;

/// Render a list of notes, one per line.
///
/// Example output:
/// ```text
/// #12  Groceries       2024-03-01 10:00  milk, eggs, bread
/// #7   Reading list    2024-02-11 08:30  The Rust Programming…
/// ```
pub fn render_list(notes: &[Note]) -> String {
    if notes.is_empty() {
        return "No notes.\n".to_string();
    }

    let id_width = notes
        .iter()
        .map(|n| n.id.to_string().len() + 1)
        .max()
        .unwrap_or(2);
    let title_width = notes
        .iter()
        .map(|n| n.title.chars().count())
        .max()
        .unwrap_or(0)
        .min(32);

    let mut output = String::new();
    for note in notes {
        let id = format!("#{}", note.id);
        output.push_str(&format!(
            "{:<id_width$}  {:<title_width$}  {}  {}\n",
            id,
            truncate(&note.title, title_width),
            short_time(&note.updated_at),
            preview(&note.content),
        ));
    }
    output
}

/// Render one note in full.
pub fn render_note(note: &Note) -> String {
    format!(
        "#{} {}\ncreated {}  updated {}\n\n{}\n",
        note.id,
        note.title,
        short_time(&note.created_at),
        short_time(&note.updated_at),
        note.content
    )
}

/// `YYYY-MM-DD HH:MM` in UTC, or the raw string if it doesn't parse.
fn short_time(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// First line of the content, cut to the preview width.
fn preview(content: &str) -> String {
    let first = content.lines().next().unwrap_or("");
    truncate(first, PREVIEW_WIDTH)
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
