//! Device session lifecycle and orchestration.
//!
//! A [`DeviceSession`] ties together characteristic discovery, the
//! per-connection auth code, and the two independent notification streams
//! of a NeuroFlex controller. The session moves through three states:
//!
//! ```text
//! Uninitialized --initialize--> Ready --dispose--> Disposed (terminal)
//! ```
//!
//! From Ready, the status and product-info streams toggle independently
//! and idempotently. Lifecycle methods take `&mut self`: a session has one
//! logical owner, and concurrent lifecycle calls are serialized by the
//! borrow checker rather than by internal locking.
//!
//! A failed initialization leaves the session partially initialized
//! (whatever was discovered stays set, nothing is rolled back), so callers
//! should check characteristic availability before issuing commands.

use core::fmt;
use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use neuroflex_types::uuids::{COMMAND, CONTROLLER_SERVICE, PRODUCT_INFO, STATUS};
use neuroflex_types::{Command, ProductInfo};

use crate::auth::calculate_auth_code;
use crate::channel::{FrameChannel, FrameReceiver};
use crate::error::{Error, Result};
use crate::events::{EventDispatcher, EventReceiver, SessionEvent, StreamRole};
use crate::transport::{Frame, FrameStream, ServiceInfo, Transport};

/// Lifecycle state of a [`DeviceSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Created but not yet initialized against a transport.
    Uninitialized,
    /// Initialized; commands and streams are available.
    Ready,
    /// Disposed. Terminal.
    Disposed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "Uninitialized"),
            SessionState::Ready => write!(f, "Ready"),
            SessionState::Disposed => write!(f, "Disposed"),
        }
    }
}

/// Characteristic references discovered during initialization.
///
/// Any of these may be unset after a partial initialization.
#[derive(Debug, Clone, Copy, Default)]
struct SessionCharacteristics {
    command: Option<Uuid>,
    status: Option<Uuid>,
    product_info: Option<Uuid>,
}

/// Handle for a spawned frame-forwarding task.
struct StreamHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl StreamHandle {
    fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    fn cancel(self) {
        self.token.cancel();
    }
}

/// A session with one NeuroFlex controller over an abstract transport.
///
/// The session owns the per-connection auth code: every command issued
/// within one session lifetime carries the same auth byte, until the
/// session is re-initialized or disposed.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use neuroflex_core::{BleTransport, DeviceSession};
///
/// # async fn example(transport: BleTransport, manufacturer_data: &[u8]) -> neuroflex_core::Result<()> {
/// let mut session = DeviceSession::new();
/// session.initialize(Arc::new(transport), manufacturer_data).await?;
///
/// let mut frames = session.subscribe_status().expect("session is open");
/// session.start_treatment(1800).await?;
/// # Ok(())
/// # }
/// ```
pub struct DeviceSession<T: Transport> {
    transport: Option<Arc<T>>,
    state: SessionState,
    auth_code: Option<u8>,
    characteristics: SessionCharacteristics,
    status_channel: FrameChannel,
    product_info_channel: FrameChannel,
    events: EventDispatcher,
    status_stream: Option<StreamHandle>,
    product_info_stream: Option<StreamHandle>,
}

impl<T: Transport> fmt::Debug for DeviceSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("state", &self.state)
            .field("auth_code", &self.auth_code)
            .field("characteristics", &self.characteristics)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Default for DeviceSession<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> DeviceSession<T> {
    /// Create an uninitialized session.
    pub fn new() -> Self {
        Self {
            transport: None,
            state: SessionState::Uninitialized,
            auth_code: None,
            characteristics: SessionCharacteristics::default(),
            status_channel: FrameChannel::default(),
            product_info_channel: FrameChannel::default(),
            events: EventDispatcher::default(),
            status_stream: None,
            product_info_stream: None,
        }
    }

    /// Initialize the session against a transport.
    ///
    /// Computes and stores the auth code from the advertised manufacturer
    /// data, discovers services, locates the command/status/product-info
    /// characteristics, and starts both notification streams.
    ///
    /// On a discovery failure the error is returned and the session is
    /// left partially initialized (transport and auth code retained,
    /// characteristic references possibly unset) rather than rolled
    /// back. Stream-start failures after a successful discovery are
    /// reported through the event channel and do not fail initialization.
    ///
    /// Re-initializing a Ready session recomputes the auth code; calling
    /// on a Disposed session returns [`Error::NotReady`].
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn initialize(&mut self, transport: Arc<T>, manufacturer_data: &[u8]) -> Result<()> {
        if self.state == SessionState::Disposed {
            return Err(Error::not_ready(self.state));
        }
        if self.state == SessionState::Ready {
            // Re-initialization: tear the old streams down before they are
            // resubscribed against the new discovery results
            self.stop_stream(StreamRole::Status).await;
            self.stop_stream(StreamRole::ProductInfo).await;
        }

        let auth_code = calculate_auth_code(manufacturer_data);
        self.transport = Some(Arc::clone(&transport));
        self.auth_code = Some(auth_code);
        debug!("Session auth code: 0x{:02X}", auth_code);

        info!("Discovering controller services...");
        let services = transport.discover_services().await.inspect_err(|e| {
            warn!("Service discovery failed: {}", e);
        })?;
        debug!("Found {} services", services.len());

        self.characteristics = locate_characteristics(&services);
        self.state = SessionState::Ready;
        self.events.send(SessionEvent::Initialized { auth_code });

        // A stream that fails to start degrades the session; it does not
        // undo the initialization.
        for role in [StreamRole::Status, StreamRole::ProductInfo] {
            if let Err(e) = self.start_stream(role).await {
                warn!("Failed to start {} stream: {}", role, e);
                self.events.send(SessionEvent::StreamError {
                    role,
                    error: e.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session is Ready.
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// The auth code derived during initialization, if any.
    pub fn auth_code(&self) -> Option<u8> {
        self.auth_code
    }

    /// Whether the command characteristic was discovered.
    pub fn command_available(&self) -> bool {
        self.characteristics.command.is_some()
    }

    /// Whether the status characteristic was discovered.
    pub fn status_available(&self) -> bool {
        self.characteristics.status.is_some()
    }

    /// Whether the product-info characteristic was discovered.
    pub fn product_info_available(&self) -> bool {
        self.characteristics.product_info.is_some()
    }

    /// Subscribe to decoded-frame broadcasts of the status stream.
    ///
    /// Returns `None` once the session is disposed.
    pub fn subscribe_status(&self) -> Option<FrameReceiver> {
        self.status_channel.subscribe()
    }

    /// Subscribe to frame broadcasts of the product-info stream.
    ///
    /// Returns `None` once the session is disposed.
    pub fn subscribe_product_info(&self) -> Option<FrameReceiver> {
        self.product_info_channel.subscribe()
    }

    /// Subscribe to session events.
    pub fn subscribe_events(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Start forwarding status notifications.
    ///
    /// Idempotent: re-issues the transport-level subscription, and is
    /// otherwise a no-op while the stream is already active.
    pub async fn start_status_stream(&mut self) -> Result<()> {
        self.start_stream(StreamRole::Status).await
    }

    /// Start forwarding product-info notifications. Idempotent.
    pub async fn start_product_info_stream(&mut self) -> Result<()> {
        self.start_stream(StreamRole::ProductInfo).await
    }

    /// Stop the status stream and disable transport notifications.
    ///
    /// Safe to call multiple times or when the stream was never started;
    /// a stopped stream produces no further transport calls. Unsubscribe
    /// failures are reported through the event channel.
    pub async fn stop_status_stream(&mut self) {
        self.stop_stream(StreamRole::Status).await;
    }

    /// Stop the product-info stream. Same semantics as
    /// [`stop_status_stream`](Self::stop_status_stream).
    pub async fn stop_product_info_stream(&mut self) {
        self.stop_stream(StreamRole::ProductInfo).await;
    }

    /// Encode a command with the session auth code and write it to the
    /// command characteristic.
    ///
    /// Fire-and-forget: writes are not queued, serialized, or retried.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn send_command(&self, command: &Command) -> Result<()> {
        if self.state != SessionState::Ready {
            return Err(Error::not_ready(self.state));
        }
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| Error::not_ready(self.state))?;
        let characteristic = self
            .characteristics
            .command
            .ok_or_else(|| Error::characteristic_unavailable("command"))?;
        let auth_code = self
            .auth_code
            .ok_or_else(|| Error::not_ready(self.state))?;

        let frame = command.encode(auth_code);
        debug!("Writing command frame: {:02X?}", frame);
        transport.write(characteristic, &frame).await
    }

    /// Start a treatment of the given duration in seconds.
    pub async fn start_treatment(&self, duration_seconds: u16) -> Result<()> {
        self.send_command(&Command::StartTreatment { duration_seconds })
            .await
    }

    /// Adjust the stimulation levels by signed deltas.
    pub async fn change_level(&self, knee_delta: i8, thigh_delta: i8) -> Result<()> {
        self.send_command(&Command::ChangeLevel {
            knee_delta,
            thigh_delta,
        })
        .await
    }

    /// Leave level-adjust mode.
    pub async fn exit_adjust(&self) -> Result<()> {
        self.send_command(&Command::ExitAdjust).await
    }

    /// Pause the running treatment.
    pub async fn pause_treatment(&self) -> Result<()> {
        self.send_command(&Command::PauseTreatment).await
    }

    /// Resume a paused treatment.
    pub async fn resume_treatment(&self) -> Result<()> {
        self.send_command(&Command::ResumeTreatment).await
    }

    /// Reset both stimulation levels to zero.
    pub async fn zero_levels(&self) -> Result<()> {
        self.send_command(&Command::ZeroLevels).await
    }

    /// Stop the treatment.
    pub async fn stop_treatment(&self) -> Result<()> {
        self.send_command(&Command::Stop).await
    }

    /// One-shot read of the raw product-info frame.
    ///
    /// Does not require the product-info stream to be active.
    pub async fn read_product_info_raw(&self) -> Result<Frame> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| Error::not_ready(self.state))?;
        let characteristic = self
            .characteristics
            .product_info
            .ok_or_else(|| Error::characteristic_unavailable("product-info"))?;
        transport.read(characteristic).await
    }

    /// One-shot read of the decoded firmware version.
    pub async fn read_product_info(&self) -> Result<ProductInfo> {
        let frame = self.read_product_info_raw().await?;
        Ok(ProductInfo::from_frame(&frame))
    }

    /// Dispose the session.
    ///
    /// Stops both streams, closes both frame channels, and clears the
    /// characteristic references, auth code, and transport reference.
    /// Safe to call repeatedly and from any state; always ends Disposed.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn dispose(&mut self) {
        if self.state == SessionState::Disposed {
            return;
        }
        info!("Disposing session");

        self.stop_stream(StreamRole::Status).await;
        self.stop_stream(StreamRole::ProductInfo).await;
        self.status_channel.close();
        self.product_info_channel.close();

        self.characteristics = SessionCharacteristics::default();
        self.auth_code = None;
        self.transport = None;
        self.state = SessionState::Disposed;
        self.events.send(SessionEvent::Disposed);
    }

    fn characteristic_for(&self, role: StreamRole) -> Option<Uuid> {
        match role {
            StreamRole::Status => self.characteristics.status,
            StreamRole::ProductInfo => self.characteristics.product_info,
        }
    }

    fn channel_for(&self, role: StreamRole) -> &FrameChannel {
        match role {
            StreamRole::Status => &self.status_channel,
            StreamRole::ProductInfo => &self.product_info_channel,
        }
    }

    async fn start_stream(&mut self, role: StreamRole) -> Result<()> {
        let transport = self
            .transport
            .clone()
            .ok_or_else(|| Error::not_ready(self.state))?;
        let characteristic = self
            .characteristic_for(role)
            .ok_or_else(|| Error::characteristic_unavailable(role.as_str()))?;

        // The transport-level subscription is refreshed unconditionally
        let stream = transport.subscribe(characteristic).await?;

        let channel = self.channel_for(role).clone();
        let events = self.events.clone();
        let slot = match role {
            StreamRole::Status => &mut self.status_stream,
            StreamRole::ProductInfo => &mut self.product_info_stream,
        };
        if slot.as_ref().is_some_and(StreamHandle::is_active) {
            debug!("{} stream already active", role);
            return Ok(());
        }

        let token = CancellationToken::new();
        let task_token = token.clone();
        let task = tokio::spawn(async move {
            forward_frames(stream, channel, events, role, task_token).await;
        });
        *slot = Some(StreamHandle { token, task });

        self.events.send(SessionEvent::StreamStarted { role });
        Ok(())
    }

    async fn stop_stream(&mut self, role: StreamRole) {
        let slot = match role {
            StreamRole::Status => &mut self.status_stream,
            StreamRole::ProductInfo => &mut self.product_info_stream,
        };
        let Some(handle) = slot.take() else {
            debug!("{} stream already stopped", role);
            return;
        };
        handle.cancel();

        if let (Some(transport), Some(characteristic)) =
            (self.transport.as_ref(), self.characteristic_for(role))
            && let Err(e) = transport.unsubscribe(characteristic).await
        {
            warn!("Failed to disable {} notifications: {}", role, e);
            self.events.send(SessionEvent::StreamError {
                role,
                error: e.to_string(),
            });
        }

        self.events.send(SessionEvent::StreamStopped { role });
    }
}

impl<T: Transport> Drop for DeviceSession<T> {
    fn drop(&mut self) {
        // Cancels the forwarding tasks if dispose() was never called; the
        // transport-level unsubscribe cannot run here without an executor.
        if let Some(handle) = self.status_stream.take() {
            handle.cancel();
        }
        if let Some(handle) = self.product_info_stream.take() {
            handle.cancel();
        }
    }
}

/// Pick the three fixed characteristics out of the discovered services.
///
/// The controller service is searched first; any other service carrying
/// one of the UUIDs is accepted as a fallback. Missing characteristics
/// are logged and left unset.
fn locate_characteristics(services: &[ServiceInfo]) -> SessionCharacteristics {
    let mut found = SessionCharacteristics::default();

    let ordered = services
        .iter()
        .filter(|s| s.uuid == CONTROLLER_SERVICE)
        .chain(services.iter().filter(|s| s.uuid != CONTROLLER_SERVICE));
    for service in ordered {
        for &uuid in &service.characteristics {
            if uuid == COMMAND {
                found.command.get_or_insert(uuid);
            } else if uuid == STATUS {
                found.status.get_or_insert(uuid);
            } else if uuid == PRODUCT_INFO {
                found.product_info.get_or_insert(uuid);
            }
        }
    }

    for (role, slot) in [
        ("command", found.command),
        ("status", found.status),
        ("product-info", found.product_info),
    ] {
        if slot.is_none() {
            warn!("{} characteristic not present on this controller", role);
        }
    }

    found
}

/// Forward every non-empty frame from a transport stream into the
/// session's broadcast channel until cancelled or the stream ends.
async fn forward_frames(
    mut stream: FrameStream,
    channel: FrameChannel,
    events: EventDispatcher,
    role: StreamRole,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("{} stream cancelled", role);
                break;
            }
            frame = stream.next() => match frame {
                Some(frame) if !frame.is_empty() => {
                    channel.send(frame);
                }
                Some(_) => debug!("Dropping empty {} frame", role),
                None => {
                    debug!("{} notification stream ended", role);
                    events.send(SessionEvent::StreamEnded { role });
                    break;
                }
            }
        }
    }
}
