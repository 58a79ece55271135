//! Multi-subscriber frame channels with an explicit lifecycle.
//!
//! Notification frames fan out to any number of subscribers through a
//! [`FrameChannel`]. The channel has a well-defined open/closed state:
//! closing is idempotent, sending into a closed channel is a no-op, and
//! subscribing to a closed channel yields nothing. There is no
//! backpressure; a slow subscriber may observe lagged frames per tokio
//! broadcast semantics.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

use crate::transport::Frame;

/// Default broadcast capacity for frame channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Receiver half for a [`FrameChannel`] subscription.
pub type FrameReceiver = broadcast::Receiver<Frame>;

/// A cloneable multi-subscriber channel of notification frames.
///
/// Clones share the same underlying channel and lifecycle state.
#[derive(Debug, Clone)]
pub struct FrameChannel {
    inner: Arc<ChannelInner>,
}

#[derive(Debug)]
struct ChannelInner {
    sender: broadcast::Sender<Frame>,
    closed: AtomicBool,
}

impl FrameChannel {
    /// Create an open channel with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(ChannelInner {
                sender,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Subscribe to frames; `None` once the channel is closed.
    pub fn subscribe(&self) -> Option<FrameReceiver> {
        if self.is_closed() {
            return None;
        }
        Some(self.inner.sender.subscribe())
    }

    /// Broadcast a frame to every subscriber.
    ///
    /// Returns whether the frame was delivered to at least one subscriber.
    /// Sending into a closed channel is a valid no-op.
    pub fn send(&self, frame: Frame) -> bool {
        if self.is_closed() {
            return false;
        }
        self.inner.sender.send(frame).is_ok()
    }

    /// Close the channel. Idempotent; existing receivers drain whatever is
    /// already buffered and then end.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }

    /// Whether the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Number of active subscribers.
    pub fn receiver_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }
}

impl Default for FrameChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_receive() {
        let channel = FrameChannel::default();
        let mut rx = channel.subscribe().unwrap();

        assert!(channel.send(vec![1, 2, 3]));
        assert_eq!(rx.recv().await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_fan_out_to_multiple_subscribers() {
        let channel = FrameChannel::default();
        let mut rx1 = channel.subscribe().unwrap();
        let mut rx2 = channel.subscribe().unwrap();
        assert_eq!(channel.receiver_count(), 2);

        channel.send(vec![0xAA]);
        assert_eq!(rx1.recv().await.unwrap(), vec![0xAA]);
        assert_eq!(rx2.recv().await.unwrap(), vec![0xAA]);
    }

    #[test]
    fn test_send_without_subscribers_is_not_delivered() {
        let channel = FrameChannel::default();
        assert!(!channel.send(vec![1]));
    }

    #[test]
    fn test_close_is_idempotent() {
        let channel = FrameChannel::default();
        channel.close();
        channel.close();
        assert!(channel.is_closed());
    }

    #[test]
    fn test_send_after_close_is_noop() {
        let channel = FrameChannel::default();
        let _rx = channel.subscribe().unwrap();
        channel.close();
        assert!(!channel.send(vec![1]));
    }

    #[test]
    fn test_subscribe_after_close_yields_none() {
        let channel = FrameChannel::default();
        channel.close();
        assert!(channel.subscribe().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_lifecycle() {
        let channel = FrameChannel::default();
        let clone = channel.clone();
        let mut rx = channel.subscribe().unwrap();

        assert!(clone.send(vec![7]));
        assert_eq!(rx.recv().await.unwrap(), vec![7]);

        clone.close();
        assert!(channel.is_closed());
    }
}
