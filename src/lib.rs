//! Client for a personal notes service.
//!
//! The pieces, leaves first:
//! - [`storage`]: durable key-value store the session is persisted in
//! - [`session`]: the shared [`session::SessionContext`]
//! - [`api`]: HTTP adapter that injects the bearer token and reacts to 401s
//! - [`stores`]: auth and notes state with loading/error tracking
//! - [`view`]: pure filter + sort over a note collection
//! - [`router`]: route guard keyed on session state

pub mod api;
pub mod config;
pub mod models;
pub mod render;
pub mod router;
pub mod session;
pub mod storage;
pub mod stores;
pub mod view;
