use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

use nephra_core::types::{DbId, Timestamp};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Name of a user's private topic.
pub fn user_topic(user_id: DbId) -> String {
    format!("user:{user_id}")
}

/// Name of a role's shared topic.
pub fn role_topic(role: &str) -> String {
    format!("role:{role}")
}

/// Metadata for a single authenticated WebSocket connection.
pub struct WsConnection {
    /// Authenticated user ID. Connections are only registered after the
    /// bearer credential has been verified.
    pub user_id: DbId,
    /// The user's role name at connect time.
    pub role: String,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// Topics this connection is subscribed to.
    pub topics: HashSet<String>,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Manages all active WebSocket connections and their topic subscriptions.
///
/// Thread-safe via interior `RwLock`; constructed once at process start,
/// wrapped in `Arc`, and passed to every component that publishes.
///
/// Delivery is at-most-once: sends to closed channels are silently skipped
/// (the connection is cleaned up on its next receive-loop iteration), and a
/// dropped connection loses all its subscriptions. Anything that must
/// survive a disconnect belongs in the notification store.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register an authenticated connection.
    ///
    /// The connection is auto-subscribed to its per-user and per-role
    /// topics. Returns the receiver half of the message channel so the
    /// caller can forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        user_id: DbId,
        role: &str,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut topics = HashSet::new();
        topics.insert(user_topic(user_id));
        topics.insert(role_topic(role));

        let conn = WsConnection {
            user_id,
            role: role.to_string(),
            sender: tx,
            topics,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID, dropping all its subscriptions.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Subscribe a connection to an additional named topic.
    ///
    /// Returns `false` if the connection is unknown.
    pub async fn join_topic(&self, conn_id: &str, topic: &str) -> bool {
        let mut conns = self.connections.write().await;
        match conns.get_mut(conn_id) {
            Some(conn) => {
                conn.topics.insert(topic.to_string());
                true
            }
            None => false,
        }
    }

    /// Unsubscribe a connection from a named topic.
    ///
    /// Returns `false` if the connection is unknown or was not subscribed.
    pub async fn leave_topic(&self, conn_id: &str, topic: &str) -> bool {
        let mut conns = self.connections.write().await;
        match conns.get_mut(conn_id) {
            Some(conn) => conn.topics.remove(topic),
            None => false,
        }
    }

    /// Whether a connection is currently subscribed to a topic.
    pub async fn is_subscribed(&self, conn_id: &str, topic: &str) -> bool {
        self.connections
            .read()
            .await
            .get(conn_id)
            .is_some_and(|conn| conn.topics.contains(topic))
    }

    /// Send a message to all connections belonging to a specific user.
    ///
    /// Returns the number of connections the message was sent to.
    pub async fn send_to_user(&self, user_id: DbId, message: Message) -> usize {
        self.send_to_topics(&[user_topic(user_id)], None, message)
            .await
    }

    /// Send a message to every connection subscribed to a topic.
    pub async fn send_to_topic(&self, topic: &str, message: Message) -> usize {
        self.send_to_topics(&[topic.to_string()], None, message)
            .await
    }

    /// Send a message to every connection subscribed to any of `topics`,
    /// optionally excluding one connection (the sender of a relayed event).
    ///
    /// A connection subscribed to several of the topics still receives the
    /// message once.
    pub async fn send_to_topics(
        &self,
        topics: &[String],
        except_conn_id: Option<&str>,
        message: Message,
    ) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for (conn_id, conn) in conns.iter() {
            if except_conn_id == Some(conn_id.as_str()) {
                continue;
            }
            if topics.iter().any(|topic| conn.topics.contains(topic)) {
                let _ = conn.sender.send(message.clone());
                count += 1;
            }
        }
        count
    }

    /// Broadcast a message to all connected clients.
    pub async fn broadcast(&self, message: Message) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(message.clone());
        }
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
