//! btleplug-backed transport implementation.
//!
//! [`BleTransport`] adapts a connected [`btleplug`] peripheral to the
//! [`Transport`] capability consumed by the device session. Adapter state,
//! scanning, connecting, and permission acquisition stay with the
//! embedding application; this type expects an already-connected
//! peripheral and only handles discovery, notifications, reads, and
//! writes. Every BLE call is bounded by a timeout so no session operation
//! can hang indefinitely.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::{Adapter, Peripheral};
use futures::StreamExt;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::transport::{Frame, FrameStream, ServiceInfo, Transport};

/// Default timeout for service discovery.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for BLE characteristic read operations.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for BLE characteristic write operations.
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout configuration for BLE operations.
///
/// Increase the timeouts in challenging RF environments (concrete walls,
/// electromagnetic interference).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Timeout for service discovery.
    pub discovery_timeout: Duration,
    /// Timeout for characteristic reads.
    pub read_timeout: Duration,
    /// Timeout for characteristic writes.
    pub write_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the discovery timeout.
    #[must_use]
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Set the read timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout.
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

/// Transport over a connected BLE peripheral.
pub struct BleTransport {
    /// The BLE adapter used for the connection.
    ///
    /// Stored to keep the adapter alive for the lifetime of the peripheral
    /// connection; the peripheral may hold internal references to it.
    #[allow(dead_code)]
    adapter: Adapter,
    /// The underlying BLE peripheral.
    peripheral: Peripheral,
    /// Cache of discovered characteristics by UUID for O(1) lookup.
    characteristics: RwLock<HashMap<Uuid, Characteristic>>,
    config: TransportConfig,
}

impl std::fmt::Debug for BleTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BleTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BleTransport {
    /// Wrap a connected peripheral with default timeouts.
    pub fn new(adapter: Adapter, peripheral: Peripheral) -> Self {
        Self::with_config(adapter, peripheral, TransportConfig::default())
    }

    /// Wrap a connected peripheral with a custom timeout configuration.
    pub fn with_config(adapter: Adapter, peripheral: Peripheral, config: TransportConfig) -> Self {
        Self {
            adapter,
            peripheral,
            characteristics: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// The active timeout configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Find a characteristic by UUID using the cached lookup table.
    ///
    /// Falls back to rebuilding the cache from the peripheral's services
    /// if the cache is empty (discovery not run through this transport).
    async fn find_characteristic(&self, uuid: Uuid) -> Result<Characteristic> {
        {
            let cache = self.characteristics.read().await;
            if let Some(characteristic) = cache.get(&uuid) {
                return Ok(characteristic.clone());
            }
            if !cache.is_empty() {
                return Err(Error::characteristic_not_found(
                    uuid.to_string(),
                    self.peripheral.services().len(),
                ));
            }
        }

        warn!(
            "Characteristics cache empty, rebuilding from peripheral services for {}",
            uuid
        );
        let services = self.peripheral.services();
        let service_count = services.len();
        let mut cache = self.characteristics.write().await;
        for service in &services {
            for characteristic in &service.characteristics {
                cache.insert(characteristic.uuid, characteristic.clone());
            }
        }
        cache
            .get(&uuid)
            .cloned()
            .ok_or_else(|| Error::characteristic_not_found(uuid.to_string(), service_count))
    }
}

#[async_trait]
impl Transport for BleTransport {
    async fn discover_services(&self) -> Result<Vec<ServiceInfo>> {
        debug!("Discovering services...");
        timeout(
            self.config.discovery_timeout,
            self.peripheral.discover_services(),
        )
        .await
        .map_err(|_| Error::timeout("discover services", self.config.discovery_timeout))??;

        let services = self.peripheral.services();
        debug!("Found {} services", services.len());

        let mut cache = self.characteristics.write().await;
        cache.clear();
        let mut infos = Vec::with_capacity(services.len());
        for service in &services {
            debug!("  Service: {}", service.uuid);
            let mut characteristics = Vec::new();
            for characteristic in &service.characteristics {
                debug!("    Characteristic: {}", characteristic.uuid);
                cache.insert(characteristic.uuid, characteristic.clone());
                characteristics.push(characteristic.uuid);
            }
            infos.push(ServiceInfo {
                uuid: service.uuid,
                characteristics,
            });
        }
        Ok(infos)
    }

    async fn subscribe(&self, characteristic: Uuid) -> Result<FrameStream> {
        let target = self.find_characteristic(characteristic).await?;
        self.peripheral.subscribe(&target).await?;

        let notifications = self.peripheral.notifications().await?;
        let uuid = target.uuid;
        Ok(Box::pin(notifications.filter_map(move |notification| {
            futures::future::ready((notification.uuid == uuid).then_some(notification.value))
        })))
    }

    async fn unsubscribe(&self, characteristic: Uuid) -> Result<()> {
        let target = self.find_characteristic(characteristic).await?;
        self.peripheral.unsubscribe(&target).await?;
        Ok(())
    }

    async fn write(&self, characteristic: Uuid, payload: &[u8]) -> Result<()> {
        let target = self.find_characteristic(characteristic).await?;
        // Commands are fire-and-forget; no response round-trip
        timeout(
            self.config.write_timeout,
            self.peripheral
                .write(&target, payload, WriteType::WithoutResponse),
        )
        .await
        .map_err(|_| {
            Error::timeout(
                format!("write characteristic {}", characteristic),
                self.config.write_timeout,
            )
        })??;
        Ok(())
    }

    async fn read(&self, characteristic: Uuid) -> Result<Frame> {
        let target = self.find_characteristic(characteristic).await?;
        let data = timeout(self.config.read_timeout, self.peripheral.read(&target))
            .await
            .map_err(|_| {
                Error::timeout(
                    format!("read characteristic {}", characteristic),
                    self.config.read_timeout,
                )
            })??;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_config_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.discovery_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.write_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_transport_config_builder() {
        let config = TransportConfig::new()
            .discovery_timeout(Duration::from_secs(20))
            .read_timeout(Duration::from_secs(5))
            .write_timeout(Duration::from_secs(3));

        assert_eq!(config.discovery_timeout, Duration::from_secs(20));
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.write_timeout, Duration::from_secs(3));
    }
}
