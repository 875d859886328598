use std::sync::{Arc, Mutex};

use super::ActionStatus;
use crate::api::{ApiClient, ApiError};
use crate::models::{CreateNoteInput, Note, UpdateNoteInput};
use crate::view::{derive_view, SortBy, SortOrder, ViewQuery};

#[derive(Default)]
struct NotesState {
    /// Backing collection, newest insertions first.
    notes: Vec<Note>,
    query: ViewQuery,
    status: ActionStatus,
}

/// The signed-in user's notes plus the search/sort settings of the view.
///
/// Local state changes only after the server confirms an action.
#[derive(Clone)]
pub struct NotesStore {
    api: ApiClient,
    state: Arc<Mutex<NotesState>>,
}

impl NotesStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(NotesState::default())),
        }
    }

    /// Replace the local collection with everything the server has.
    pub async fn fetch_all(&self) -> Result<(), ApiError> {
        self.begin();
        let result = self.api.list_notes(None).await;
        self.finish(result, "Failed to fetch notes", |state, notes| {
            state.notes = notes;
        })
    }

    /// Replace the local collection with the server's matches for `term`.
    pub async fn fetch_search(&self, term: &str) -> Result<(), ApiError> {
        self.begin();
        let result = self.api.list_notes(Some(term)).await;
        self.finish(result, "Failed to fetch notes", |state, notes| {
            state.notes = notes;
        })
    }

    /// Load a single note and upsert it locally.
    pub async fn fetch_one(&self, id: i64) -> Result<Note, ApiError> {
        self.begin();
        let result = self.api.get_note(id).await;
        self.finish(result, "Failed to fetch note", |state, note: Note| {
            upsert(&mut state.notes, note.clone());
            note
        })
    }

    /// Create a note; the server's record goes to the front of the collection.
    pub async fn create(&self, input: &CreateNoteInput) -> Result<Note, ApiError> {
        self.begin();
        let result = self.api.create_note(input).await;
        self.finish(result, "Failed to create note", |state, note: Note| {
            state.notes.insert(0, note.clone());
            note
        })
    }

    /// Update a note and swap in the server's canonical record.
    ///
    /// If the note is not held locally (e.g. the collection was never
    /// fetched) the returned record is inserted at the front instead.
    pub async fn update(&self, id: i64, input: &UpdateNoteInput) -> Result<Note, ApiError> {
        self.begin();
        let result = self.api.update_note(id, input).await;
        self.finish(result, "Failed to update note", |state, note: Note| {
            match state.notes.iter().position(|n| n.id == id) {
                Some(index) => state.notes[index] = note.clone(),
                None => {
                    tracing::debug!(id, "updated note was not loaded locally, inserting");
                    state.notes.insert(0, note.clone());
                }
            }
            note
        })
    }

    pub async fn remove(&self, id: i64) -> Result<(), ApiError> {
        self.begin();
        let result = self.api.delete_note(id).await;
        self.finish(result, "Failed to delete note", |state, ()| {
            state.notes.retain(|n| n.id != id);
        })
    }

    // ============================================================
    // View settings
    // ============================================================

    pub fn set_search_term(&self, term: impl Into<String>) {
        self.lock().query.search = term.into();
    }

    pub fn set_sorting(&self, sort_by: SortBy, order: SortOrder) {
        let mut state = self.lock();
        state.query.sort_by = sort_by;
        state.query.order = order;
    }

    pub fn query(&self) -> ViewQuery {
        self.lock().query.clone()
    }

    /// Recompute the filtered and sorted view from the current state.
    pub fn view(&self) -> Vec<Note> {
        let state = self.lock();
        derive_view(&state.notes, &state.query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// The backing collection in insertion order.
    pub fn notes(&self) -> Vec<Note> {
        self.lock().notes.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().status.loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().status.error.clone()
    }

    pub fn clear_error(&self) {
        self.lock().status.error = None;
    }

    fn begin(&self) {
        self.lock().status.begin();
    }

    /// Apply a successful response to the state, or record `message`.
    /// Loading is cleared either way.
    fn finish<T, R>(
        &self,
        result: Result<T, ApiError>,
        message: &str,
        apply: impl FnOnce(&mut NotesState, T) -> R,
    ) -> Result<R, ApiError> {
        let mut state = self.lock();
        match result {
            Ok(value) => {
                let out = apply(&mut *state, value);
                state.status.finish(None);
                Ok(out)
            }
            Err(e) => {
                tracing::warn!("{}: {}", message, e);
                state.status.finish(Some(message.to_string()));
                Err(e)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NotesState> {
        self.state.lock().expect("notes state lock poisoned")
    }
}

fn upsert(notes: &mut Vec<Note>, note: Note) {
    match notes.iter_mut().find(|n| n.id == note.id) {
        Some(existing) => *existing = note,
        None => notes.insert(0, note),
    }
}
