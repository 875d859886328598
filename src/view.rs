//! Filtered and sorted projection of a note collection.
//!
//! The view is a pure function of `(notes, query)`: it borrows the backing
//! collection, never reorders it, and returns the same output for the same
//! input. Callers recompute it whenever the notes or the query change.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::Note;

/// Field the view is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Title,
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::CreatedAt => "created",
            Self::UpdatedAt => "updated",
        }
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "created" | "createdAt" => Ok(Self::CreatedAt),
            "updated" | "updatedAt" => Ok(Self::UpdatedAt),
            other => Err(format!("unknown sort field: {}", other)),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything besides the notes themselves that determines the view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub search: String,
    pub sort_by: SortBy,
    pub order: SortOrder,
}

/// Filter `notes` by `query.search` and sort the survivors.
///
/// The sort is stable. Descending order reverses the comparator rather than
/// the output, so notes with equal keys keep their backing order in both
/// directions.
pub fn derive_view<'a>(notes: &'a [Note], query: &ViewQuery) -> Vec<&'a Note> {
    let needle = query.search.to_lowercase();
    let mut view: Vec<&Note> = if needle.is_empty() {
        notes.iter().collect()
    } else {
        notes.iter().filter(|n| n.matches(&needle)).collect()
    };

    view.sort_by(|a, b| {
        let ordering = compare(a, b, query.sort_by);
        match query.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    view
}

/// Ascending comparison of two notes on one field.
pub fn compare(a: &Note, b: &Note, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Title => compare_titles(&a.title, &b.title),
        // Unparseable timestamps sort before every real instant.
        SortBy::CreatedAt => a.created_instant().cmp(&b.created_instant()),
        SortBy::UpdatedAt => a.updated_instant().cmp(&b.updated_instant()),
    }
}

/// Collation in three levels, like a root-locale collator:
/// base letters first, then accents, then case with lowercase first.
/// So "apple" < "Apple" < "Éclair" < "orange".
fn compare_titles(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| with_accents(a).cmp(&with_accents(b)))
        .then_with(|| b.cmp(a))
}

/// Decomposed, combining marks dropped, lowercased.
fn base_letters(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Decomposed and lowercased, marks kept; an unaccented letter sorts first.
fn with_accents(s: &str) -> String {
    s.nfd().flat_map(char::to_lowercase).collect()
}
