//! Wire models for the notes API.
//!
//! # Core Concepts
//!
//! - [`User`]: The account that owns notes. Read-only on the client.
//! - [`Note`]: A titled piece of text. Identifiers and timestamps are always
//!   assigned by the server; the client never invents them.
//! - [`AuthResponse`]: What login and registration return, a bearer token
//!   paired with the user it belongs to.
//!
//! All types serialize as camelCase to match the API.

mod note;
mod user;

pub use note::*;
pub use user::*;
