//! Mock transport implementation for testing.
//!
//! This module provides a mock transport that can be used for unit testing
//! without requiring actual BLE hardware. The [`MockTransport`] implements
//! the [`Transport`] trait, allowing it to drive a
//! [`DeviceSession`](crate::session::DeviceSession) in tests.
//!
//! # Features
//!
//! - **Notification injection**: push frames into any characteristic
//! - **Failure injection**: fail discovery, subscribe, write, or read
//! - **Call accounting**: subscribe/unsubscribe counters and recorded writes

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use neuroflex_types::uuids::{COMMAND, CONTROLLER_SERVICE, PRODUCT_INFO, STATUS};

use crate::error::{Error, Result};
use crate::transport::{Frame, FrameStream, ServiceInfo, Transport};

/// Broadcast capacity for injected notifications.
const NOTIFIER_CAPACITY: usize = 32;

/// A mock transport for testing.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use neuroflex_core::{DeviceSession, MockTransport};
///
/// #[tokio::main]
/// async fn main() {
///     let transport = Arc::new(MockTransport::controller());
///     let mut session = DeviceSession::new();
///     session.initialize(Arc::clone(&transport), b"NFA1").await.unwrap();
///
///     let mut frames = session.subscribe_status().unwrap();
///     transport.push_notification(neuroflex_types::uuids::STATUS, vec![0x01, 0x7F]);
///     assert_eq!(frames.recv().await.unwrap(), vec![0x01, 0x7F]);
/// }
/// ```
pub struct MockTransport {
    address: String,
    services: Vec<ServiceInfo>,
    notifiers: Mutex<HashMap<Uuid, broadcast::Sender<Frame>>>,
    read_responses: Mutex<HashMap<Uuid, Frame>>,
    writes: Mutex<Vec<(Uuid, Frame)>>,
    subscribe_counts: Mutex<HashMap<Uuid, u32>>,
    unsubscribe_counts: Mutex<HashMap<Uuid, u32>>,
    fail_discovery: AtomicBool,
    fail_subscribe: AtomicBool,
    fail_write: AtomicBool,
    fail_read: AtomicBool,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("address", &self.address)
            .field("services", &self.services.len())
            .finish()
    }
}

impl MockTransport {
    /// Create a mock transport exposing the given services.
    pub fn new(services: Vec<ServiceInfo>) -> Self {
        Self {
            address: format!("MOCK-{:06X}", rand::random::<u32>() % 0xFFFFFF),
            services,
            notifiers: Mutex::new(HashMap::new()),
            read_responses: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            subscribe_counts: Mutex::new(HashMap::new()),
            unsubscribe_counts: Mutex::new(HashMap::new()),
            fail_discovery: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
            fail_write: AtomicBool::new(false),
            fail_read: AtomicBool::new(false),
        }
    }

    /// Create a mock transport with the standard controller service layout.
    pub fn controller() -> Self {
        Self::new(vec![ServiceInfo {
            uuid: CONTROLLER_SERVICE,
            characteristics: vec![COMMAND, STATUS, PRODUCT_INFO],
        }])
    }

    /// Create a mock transport exposing no services at all.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Get the mock device address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Push a notification frame into a characteristic.
    ///
    /// Returns whether at least one active subscription received it.
    pub fn push_notification(&self, characteristic: Uuid, frame: Frame) -> bool {
        self.notifier(characteristic).send(frame).is_ok()
    }

    /// End the notification stream of a characteristic, as the transport
    /// would on a broken link.
    pub fn end_notifications(&self, characteristic: Uuid) {
        self.notifiers.lock().unwrap().remove(&characteristic);
    }

    /// Set the canned response for one-shot reads of a characteristic.
    pub fn set_read_response(&self, characteristic: Uuid, frame: Frame) {
        self.read_responses
            .lock()
            .unwrap()
            .insert(characteristic, frame);
    }

    /// All frames written so far, in order.
    pub fn written_frames(&self) -> Vec<(Uuid, Frame)> {
        self.writes.lock().unwrap().clone()
    }

    /// Number of subscribe calls for a characteristic.
    pub fn subscribe_count(&self, characteristic: Uuid) -> u32 {
        *self
            .subscribe_counts
            .lock()
            .unwrap()
            .get(&characteristic)
            .unwrap_or(&0)
    }

    /// Number of unsubscribe calls for a characteristic.
    pub fn unsubscribe_count(&self, characteristic: Uuid) -> u32 {
        *self
            .unsubscribe_counts
            .lock()
            .unwrap()
            .get(&characteristic)
            .unwrap_or(&0)
    }

    /// Make service discovery fail.
    pub fn fail_discovery(&self, fail: bool) {
        self.fail_discovery.store(fail, Ordering::Relaxed);
    }

    /// Make subscribe calls fail.
    pub fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::Relaxed);
    }

    /// Make write calls fail.
    pub fn fail_write(&self, fail: bool) {
        self.fail_write.store(fail, Ordering::Relaxed);
    }

    /// Make read calls fail.
    pub fn fail_read(&self, fail: bool) {
        self.fail_read.store(fail, Ordering::Relaxed);
    }

    fn notifier(&self, characteristic: Uuid) -> broadcast::Sender<Frame> {
        self.notifiers
            .lock()
            .unwrap()
            .entry(characteristic)
            .or_insert_with(|| broadcast::channel(NOTIFIER_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn discover_services(&self) -> Result<Vec<ServiceInfo>> {
        if self.fail_discovery.load(Ordering::Relaxed) {
            return Err(Error::transport("mock discovery failure"));
        }
        Ok(self.services.clone())
    }

    async fn subscribe(&self, characteristic: Uuid) -> Result<FrameStream> {
        if self.fail_subscribe.load(Ordering::Relaxed) {
            return Err(Error::transport("mock subscribe failure"));
        }
        *self
            .subscribe_counts
            .lock()
            .unwrap()
            .entry(characteristic)
            .or_insert(0) += 1;

        let receiver = self.notifier(characteristic).subscribe();
        Ok(Box::pin(futures::stream::unfold(
            receiver,
            |mut receiver| async move {
                loop {
                    match receiver.recv().await {
                        Ok(frame) => return Some((frame, receiver)),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            },
        )))
    }

    async fn unsubscribe(&self, characteristic: Uuid) -> Result<()> {
        *self
            .unsubscribe_counts
            .lock()
            .unwrap()
            .entry(characteristic)
            .or_insert(0) += 1;
        Ok(())
    }

    async fn write(&self, characteristic: Uuid, payload: &[u8]) -> Result<()> {
        if self.fail_write.load(Ordering::Relaxed) {
            return Err(Error::transport("mock write failure"));
        }
        self.writes
            .lock()
            .unwrap()
            .push((characteristic, payload.to_vec()));
        Ok(())
    }

    async fn read(&self, characteristic: Uuid) -> Result<Frame> {
        if self.fail_read.load(Ordering::Relaxed) {
            return Err(Error::transport("mock read failure"));
        }
        self.read_responses
            .lock()
            .unwrap()
            .get(&characteristic)
            .cloned()
            .ok_or_else(|| Error::transport(format!("no read response for {}", characteristic)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_subscribe_receives_pushed_frames() {
        let transport = MockTransport::controller();
        let mut stream = transport.subscribe(STATUS).await.unwrap();

        transport.push_notification(STATUS, vec![1, 2]);
        assert_eq!(stream.next().await.unwrap(), vec![1, 2]);
        assert_eq!(transport.subscribe_count(STATUS), 1);
    }

    #[tokio::test]
    async fn test_end_notifications_ends_stream() {
        let transport = MockTransport::controller();
        let mut stream = transport.subscribe(STATUS).await.unwrap();

        transport.end_notifications(STATUS);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_write_is_recorded() {
        let transport = MockTransport::controller();
        transport.write(COMMAND, &[0x30, 0x42]).await.unwrap();

        assert_eq!(
            transport.written_frames(),
            vec![(COMMAND, vec![0x30, 0x42])]
        );
    }

    #[tokio::test]
    async fn test_read_returns_canned_response() {
        let transport = MockTransport::controller();
        transport.set_read_response(PRODUCT_INFO, vec![9; 13]);

        assert_eq!(transport.read(PRODUCT_INFO).await.unwrap(), vec![9; 13]);
        assert!(transport.read(STATUS).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let transport = MockTransport::controller();
        transport.fail_discovery(true);
        transport.fail_write(true);

        assert!(transport.discover_services().await.is_err());
        assert!(transport.write(COMMAND, &[0]).await.is_err());

        transport.fail_discovery(false);
        assert_eq!(transport.discover_services().await.unwrap().len(), 1);
    }
}
