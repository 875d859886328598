use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A note owned by a user.
///
/// Timestamps are kept exactly as the server sent them so that a record
/// round-trips unchanged; use [`Note::created_instant`] and
/// [`Note::updated_instant`] when ordering by time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub user_id: i64,
}

impl Note {
    pub fn created_instant(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    pub fn updated_instant(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.updated_at)
    }

    /// Case-insensitive substring match over title and content.
    ///
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.content.to_lowercase().contains(needle)
    }
}

/// Body for `POST /notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteInput {
    pub title: String,
    pub content: String,
}

/// Body for `PUT /notes/{id}`. The server replaces both fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNoteInput {
    pub title: String,
    pub content: String,
}

/// Parse an API timestamp.
///
/// Accepts RFC 3339 and offset-less ISO 8601 (read as UTC), which is what
/// the server emits for freshly created rows.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_naive_timestamps() {
        let with_zone = parse_timestamp("2024-03-01T10:00:00Z").unwrap();
        let naive = parse_timestamp("2024-03-01T10:00:00.0000000").unwrap();
        assert_eq!(with_zone, naive);

        let offset = parse_timestamp("2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(offset, with_zone);
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn deserializes_camel_case() {
        let note: Note = serde_json::from_str(
            r#"{"id":7,"title":"T","content":"C","createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-02T00:00:00Z","userId":3}"#,
        )
        .unwrap();
        assert_eq!(note.id, 7);
        assert_eq!(note.user_id, 3);
        assert_eq!(note.updated_at, "2024-01-02T00:00:00Z");
    }
}
