//! Core session library for NeuroFlex therapy controllers.
//!
//! This crate ties the binary protocol layer from `neuroflex-types` to a
//! live controller over an abstract wireless transport: it derives the
//! per-connection authentication code, discovers the controller's
//! characteristics, fans notification frames out to any number of
//! subscribers, and encodes/writes command frames.
//!
//! # Features
//!
//! - **Device session**: explicit Uninitialized → Ready → Disposed
//!   lifecycle with idempotent stream toggling
//! - **Transport abstraction**: btleplug-backed [`BleTransport`] for
//!   hardware, [`MockTransport`] for tests
//! - **Independent notification streams**: status and product-info frames
//!   on separate multi-subscriber broadcast channels
//! - **Command issuance**: fire-and-forget frames carrying the session
//!   auth code
//! - **Pad-life accounting**: bounded wear tracking with replacement
//!   warnings
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use neuroflex_core::{BleTransport, DeviceSession};
//! use neuroflex_types::DeviceStatus;
//!
//! # async fn example(transport: BleTransport, manufacturer_data: &[u8]) -> neuroflex_core::Result<()> {
//! let mut session = DeviceSession::new();
//! session.initialize(Arc::new(transport), manufacturer_data).await?;
//!
//! // Decode status frames as they arrive
//! let mut frames = session.subscribe_status().expect("session is open");
//! tokio::spawn(async move {
//!     while let Ok(frame) = frames.recv().await {
//!         let status = DeviceStatus::from_frame(&frame);
//!         println!("battery: {}%", status.battery_level);
//!     }
//! });
//!
//! // Issue commands; each frame carries the session auth code
//! session.start_treatment(1800).await?;
//!
//! session.dispose().await;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod ble;
pub mod channel;
pub mod error;
pub mod events;
pub mod mock;
pub mod padlife;
pub mod session;
pub mod transport;

// Re-export the protocol layer for convenience
pub use neuroflex_types::{
    Command, ControllerStatus, DeviceStatus, ProductInfo, SheetStatus, SkinContact, StimLevels,
    uuids,
};

// Core exports
pub use auth::{FALLBACK_AUTH_CODE, calculate_auth_code};
pub use ble::{BleTransport, TransportConfig};
pub use channel::{FrameChannel, FrameReceiver};
pub use error::{Error, Result};
pub use events::{EventDispatcher, EventReceiver, SessionEvent, StreamRole};
pub use mock::MockTransport;
pub use padlife::{PadLife, PadLifeConfig, PadLifeSummary};
pub use session::{DeviceSession, SessionState};
pub use transport::{Frame, FrameStream, ServiceInfo, Transport};
