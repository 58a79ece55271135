//! Session event channel.
//!
//! The device session reports lifecycle transitions and asynchronous
//! transport failures through a broadcast event channel. Subscribing is
//! optional: a caller that never listens simply sees nothing, and sending
//! with no receivers is a no-op. This keeps errors on the notification
//! path observable without tearing the session down.

use core::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Which notification stream an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamRole {
    /// The status notification stream.
    Status,
    /// The product-info notification stream.
    ProductInfo,
}

impl StreamRole {
    /// Stable lowercase name for logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamRole::Status => "status",
            StreamRole::ProductInfo => "product-info",
        }
    }
}

impl fmt::Display for StreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Events emitted by a device session.
///
/// All events are serializable for logging and IPC.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SessionEvent {
    /// Initialization completed; the auth code is fixed for the session.
    Initialized {
        /// The derived authentication byte.
        auth_code: u8,
    },
    /// A notification stream started forwarding frames.
    StreamStarted { role: StreamRole },
    /// A notification stream was stopped by the caller.
    StreamStopped { role: StreamRole },
    /// The transport ended a notification stream on its own.
    StreamEnded { role: StreamRole },
    /// A transport failure occurred on a stream's subscribe or unsubscribe
    /// path. The session continues in a degraded state.
    StreamError {
        role: StreamRole,
        /// Rendered transport error.
        error: String,
    },
    /// The session was disposed.
    Disposed,
}

/// Sender for session events.
pub type EventSender = broadcast::Sender<SessionEvent>;

/// Receiver for session events.
pub type EventReceiver = broadcast::Receiver<SessionEvent>;

/// Event dispatcher fanning session events out to any number of receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: SessionEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}
