//! Transport abstraction over the underlying wireless link.
//!
//! The device session consumes the Bluetooth stack exclusively through the
//! [`Transport`] trait: service discovery, notification subscription, and
//! characteristic reads/writes. This keeps the session testable against
//! [`MockTransport`](crate::mock::MockTransport) and leaves adapter state,
//! scanning, connecting, and permission acquisition to the embedding
//! application.

use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;
use uuid::Uuid;

use crate::error::Result;

/// A raw byte frame received from or written to a characteristic.
pub type Frame = Vec<u8>;

/// An asynchronous stream of notification frames.
///
/// Items are infallible; transport failures surface from the
/// [`Transport`] methods themselves, and an ended stream is reported
/// through the session event channel.
pub type FrameStream = Pin<Box<dyn Stream<Item = Frame> + Send>>;

/// A discovered GATT service and the characteristics it exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Service UUID.
    pub uuid: Uuid,
    /// UUIDs of the characteristics exposed by this service.
    pub characteristics: Vec<Uuid>,
}

impl ServiceInfo {
    /// Whether this service exposes the given characteristic.
    pub fn has_characteristic(&self, uuid: Uuid) -> bool {
        self.characteristics.contains(&uuid)
    }
}

/// Capability required from the wireless transport.
///
/// Implemented for real hardware by [`BleTransport`](crate::ble::BleTransport)
/// and for tests by [`MockTransport`](crate::mock::MockTransport).
/// Timeouts are the transport implementation's responsibility; no method
/// here is expected to block unboundedly.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Discover the services and characteristics exposed by the device.
    async fn discover_services(&self) -> Result<Vec<ServiceInfo>>;

    /// Enable notifications on a characteristic and return the stream of
    /// received frames.
    async fn subscribe(&self, characteristic: Uuid) -> Result<FrameStream>;

    /// Disable notifications on a characteristic.
    async fn unsubscribe(&self, characteristic: Uuid) -> Result<()>;

    /// Write a payload to a characteristic.
    async fn write(&self, characteristic: Uuid, payload: &[u8]) -> Result<()>;

    /// Read the current value of a characteristic.
    async fn read(&self, characteristic: Uuid) -> Result<Frame>;
}
