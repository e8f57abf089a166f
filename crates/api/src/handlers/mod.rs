//! HTTP handler functions, grouped by resource.

pub mod chat;
pub mod devices;
pub mod jobs;
