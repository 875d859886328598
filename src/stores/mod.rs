//! Client-side state containers.
//!
//! Stores are cheap to clone; clones share state. Each action locks the
//! state only around its own reads and writes, never across the network
//! call, so overlapping actions interleave and the last response to land
//! wins.

mod auth;
mod notes;

pub use auth::*;
pub use notes::*;

/// Progress of the most recent action on a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ActionStatus {
    loading: bool,
    error: Option<String>,
}

impl ActionStatus {
    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn finish(&mut self, error: Option<String>) {
        self.loading = false;
        self.error = error;
    }
}
