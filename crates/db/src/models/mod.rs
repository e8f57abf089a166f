//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - Any joined read models and create DTOs the handlers need

pub mod chat;
pub mod comic;
pub mod device;
pub mod employee;
pub mod job;
pub mod user;
