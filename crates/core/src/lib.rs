//! Nephra domain logic.
//!
//! Pure types and rules shared across the workspace: error taxonomy, role
//! capabilities, lab parameter names, the critical-value evaluator, and the
//! alert recipient resolver. Nothing in this crate performs I/O — callers
//! fetch state from the database and pass it in.

pub mod error;
pub mod lab_params;
pub mod labs;
pub mod recipients;
pub mod roles;
pub mod types;
