//! Nephra event bus.
//!
//! The write path for clinical records (investigations, sessions) publishes
//! a message here after its own transaction commits; the alert dispatcher
//! subscribes. This keeps the alerting pipeline's failure domain fully
//! separate from the triggering write — a dispatch failure can never unwind
//! a committed record.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ClinicalEvent`] — the canonical event envelope.

pub mod bus;

pub use bus::{ClinicalEvent, EventBus};

/// A monthly investigation record (lab panel) was persisted.
///
/// Payload: `{ "patientId": ..., "panel": { ... } }`.
pub const EVENT_INVESTIGATION_RECORDED: &str = "investigation.recorded";

/// A dialysis session record was persisted.
pub const EVENT_SESSION_RECORDED: &str = "session.recorded";
