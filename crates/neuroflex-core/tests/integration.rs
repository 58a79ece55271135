//! Integration tests for neuroflex-core
//!
//! These tests drive a full device session against the mock transport:
//! discovery, auth derivation, both notification streams, command
//! issuance, and disposal. No BLE hardware is required.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use neuroflex_core::uuids::{COMMAND, PRODUCT_INFO, STATUS};
use neuroflex_core::{DeviceSession, MockTransport, PadLife, SessionState};
use neuroflex_types::{Command, ControllerStatus, DeviceStatus, SheetStatus};

/// Advertised manufacturer data: vendor prefix + controller identifier.
const ADVERTISEMENT: &[u8] = b"NF0A1B2C";

/// Install a test subscriber so session tracing shows up under
/// `cargo test -- --nocapture` with RUST_LOG set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn connect() -> (DeviceSession<MockTransport>, Arc<MockTransport>) {
    init_tracing();
    let transport = Arc::new(MockTransport::controller());
    let mut session = DeviceSession::new();
    session
        .initialize(Arc::clone(&transport), ADVERTISEMENT)
        .await
        .expect("initialization against the mock transport failed");
    (session, transport)
}

#[tokio::test]
async fn full_session_lifecycle() {
    let (mut session, transport) = connect().await;
    assert_eq!(session.state(), SessionState::Ready);

    // Status notifications decode into typed values
    let mut frames = session.subscribe_status().unwrap();
    transport.push_notification(
        STATUS,
        vec![0x11, 0x50, 36, 0x81, 0, 0, 40, 35, 0x08, 0x07],
    );
    let frame = timeout(Duration::from_secs(1), frames.recv())
        .await
        .unwrap()
        .unwrap();
    let status = DeviceStatus::from_frame(&frame);
    assert!(status.treatment_active);
    assert_eq!(status.controller_status, ControllerStatus::Stim);
    assert_eq!(status.battery_level, 63);
    assert_eq!(status.sheet_status, Some(SheetStatus::Left));
    assert_eq!(status.stim_index, Some(1800));

    // Commands carry the session auth code in byte 1
    session.start_treatment(1800).await.unwrap();
    session.stop_treatment().await.unwrap();
    let writes = transport.written_frames();
    assert_eq!(writes.len(), 2);
    let auth = session.auth_code().unwrap();
    assert!(writes.iter().all(|(uuid, frame)| {
        *uuid == COMMAND && frame[1] == auth
    }));
    assert_eq!(writes[0].1[0], Command::StartTreatment { duration_seconds: 0 }.opcode());

    session.dispose().await;
    assert_eq!(session.state(), SessionState::Disposed);
    assert!(session.subscribe_status().is_none());
}

#[tokio::test]
async fn status_frames_fan_out_to_every_subscriber() {
    let (session, transport) = connect().await;

    let mut first = session.subscribe_status().unwrap();
    let mut second = session.subscribe_status().unwrap();

    transport.push_notification(STATUS, vec![0x01, 0x7F]);

    for rx in [&mut first, &mut second] {
        let frame = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frame, vec![0x01, 0x7F]);
    }
}

#[tokio::test]
async fn product_info_round_trip() {
    let (mut session, transport) = connect().await;

    // One-shot read works with the notification stream stopped
    session.stop_product_info_stream().await;

    let mut frame = vec![0u8; 13];
    frame[9] = 2;
    frame[10] = 1;
    frame[11] = 0;
    frame[12] = 14;
    transport.set_read_response(PRODUCT_INFO, frame.clone());

    let info = session.read_product_info().await.unwrap();
    assert_eq!(info.version, "02.01.00.14");

    // The notification path delivers the same frames
    session.start_product_info_stream().await.unwrap();
    let mut rx = session.subscribe_product_info().unwrap();
    transport.push_notification(PRODUCT_INFO, frame);
    let notified = timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        neuroflex_types::ProductInfo::from_frame(&notified).version,
        "02.01.00.14"
    );
}

#[tokio::test]
async fn stream_toggling_is_idempotent_end_to_end() {
    let (mut session, transport) = connect().await;

    session.start_status_stream().await.unwrap();
    session.stop_status_stream().await;
    session.stop_status_stream().await;
    session.start_status_stream().await.unwrap();

    // One unsubscribe from the stop pair, never a duplicate
    assert_eq!(transport.unsubscribe_count(STATUS), 1);

    let mut rx = session.subscribe_status().unwrap();
    transport.push_notification(STATUS, vec![0x42]);
    let frame = timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frame, vec![0x42]);
}

#[tokio::test]
async fn pad_wear_accumulates_over_treatments() {
    let (session, _transport) = connect().await;

    // A treatment runs, then the elapsed duration is folded into the
    // externally persisted usage value
    session.start_treatment(1800).await.unwrap();

    let padlife = PadLife::default();
    let mut usage_seconds = 27_500u32;
    usage_seconds = padlife.update_usage(usage_seconds, 1800).unwrap();
    assert_eq!(usage_seconds, 28_800);
    assert_eq!(padlife.remaining_percentage(usage_seconds), 0);
    assert!(padlife.threshold_reached(usage_seconds));
}
