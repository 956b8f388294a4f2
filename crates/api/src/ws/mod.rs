//! Real-time channel layer.
//!
//! A connection-authenticated publish/subscribe fabric with per-user and
//! per-role topics. Delivery is at-most-once and transient by design: the
//! durable backlog lives in the notification store.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::{role_topic, user_topic, WsManager};
