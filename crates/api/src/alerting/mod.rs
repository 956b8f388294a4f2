//! Clinical alerting pipeline.
//!
//! The [`LabAlertDispatcher`] consumes record-persisted events from the bus
//! and writes durable notifications, fully decoupled from the triggering
//! write's request path.

pub mod dispatcher;

pub use dispatcher::{build_notifications, DispatchError, LabAlertDispatcher};
