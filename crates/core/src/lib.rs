//! Toonhub domain core.
//!
//! Pure domain logic shared by the db, events, and api crates: id and
//! timestamp aliases, the [`CoreError`](error::CoreError) taxonomy, the job
//! lifecycle state machine, the chat message vocabulary, and the blob-store
//! collaborator interface.

pub mod chat;
pub mod error;
pub mod jobs;
pub mod roles;
pub mod storage;
pub mod types;
