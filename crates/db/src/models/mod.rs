//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts where the entity is writable
//!
//! API-facing serialization is camelCase to match the documented wire
//! format for clients.

pub mod notification;
pub mod patient;
pub mod user;
