//! End-to-end tap flow through the exported `AccessKit` object.

mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use accesskit_core::storage::MemoryBlobStore;
use accesskit_core::{
    AccessDenialReason, AccessKitError, AccessResultObserver, AttemptRecord, SessionState,
    StateObserver,
};
use common::{credential_json, credentials_body, test_kit};

#[derive(Default)]
struct Recorder {
    states: Mutex<Vec<SessionState>>,
    results: Mutex<Vec<AttemptRecord>>,
}

impl StateObserver for Recorder {
    fn on_state_change(&self, state: SessionState) {
        self.states.lock().unwrap().push(state);
    }
}

impl AccessResultObserver for Recorder {
    fn on_access_result(&self, result: AttemptRecord) {
        self.results.lock().unwrap().push(result);
    }
}

#[tokio::test]
async fn test_granted_tap_is_logged_and_mirrored() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/v1/access/credentials")
        .match_header("authorization", "Bearer resident-token")
        .with_status(200)
        .with_body(credentials_body(&[credential_json(
            "cred-1",
            "active",
            "2026-01-01T00:00:00Z",
        )]))
        .create_async()
        .await;
    let log_upload = server
        .mock("POST", "/api/v1/access/log")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "credentialId": "cred-1",
            "accessPointId": "main-1",
            "granted": true
        })))
        .with_status(201)
        .expect(1)
        .create_async()
        .await;

    let t = test_kit(&server.url(), Arc::new(MemoryBlobStore::new()));
    assert_eq!(
        t.kit.initialize("resident-token".to_string()).await,
        SessionState::Ready
    );
    assert_eq!(t.kit.fetch_credentials().await.len(), 1);

    let recorder = Arc::new(Recorder::default());
    let _states = t.kit.on_state_change(Arc::clone(&recorder) as Arc<dyn StateObserver>);
    let _results = t
        .kit
        .on_access_result(Arc::clone(&recorder) as Arc<dyn AccessResultObserver>);

    let armed = t.kit.start_access_session(None).await.unwrap();
    assert_eq!(armed.id, "cred-1");
    assert_eq!(t.kit.active_credential_id().as_deref(), Some("cred-1"));

    let result = t
        .kit
        .handle_tap("main-1".to_string(), "Lobby reader".to_string())
        .await;
    assert!(result.granted);
    assert_eq!(result.access_point_name, "Main Entrance");
    assert_eq!(result.message, "Access granted: Main Entrance");

    assert_eq!(t.kit.state(), SessionState::Ready);
    assert_eq!(t.kit.credential("cred-1".to_string()).unwrap().usage_count, 1);
    assert_eq!(*t.radio.transmitted.lock().unwrap(), vec!["sealed-cred-1"]);

    let log = t.kit.recent_access_attempts(10);
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].attempt, result);

    assert_eq!(
        *recorder.states.lock().unwrap(),
        vec![
            SessionState::Reading,
            SessionState::Transmitting,
            SessionState::Ready
        ]
    );
    assert_eq!(*recorder.results.lock().unwrap(), vec![result]);

    // the upload runs in the background after the tap
    for _ in 0..50 {
        if t.kit.pending_log_uploads() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(t.kit.pending_log_uploads(), 0);
    log_upload.assert_async().await;
}

#[tokio::test]
async fn test_time_restricted_reader_outside_window() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/v1/access/credentials")
        .with_status(200)
        .with_body(credentials_body(&[credential_json(
            "cred-1",
            "active",
            "2026-01-01T00:00:00Z",
        )]))
        .create_async()
        .await;
    server
        .mock("POST", "/api/v1/access/log")
        .with_status(201)
        .create_async()
        .await;

    let t = test_kit(&server.url(), Arc::new(MemoryBlobStore::new()));
    t.kit.initialize("token".to_string()).await;
    t.kit.fetch_credentials().await;

    // the gym opens 06:00-09:00 on weekdays, the clock says 10:00 on a Monday
    t.kit
        .start_access_session(Some("cred-1".to_string()))
        .await
        .unwrap();
    let result = t
        .kit
        .handle_tap("gym".to_string(), "Gym".to_string())
        .await;

    assert!(!result.granted);
    assert_eq!(result.denial_reason, Some(AccessDenialReason::TimeRestriction));
    assert!(t.radio.transmitted.lock().unwrap().is_empty());
    assert_eq!(t.kit.credential("cred-1".to_string()).unwrap().usage_count, 0);
    assert_eq!(
        t.haptics.patterns.lock().unwrap().last().unwrap(),
        &vec![0, 200, 100, 200]
    );
}

#[tokio::test]
async fn test_session_requires_enabled_radio() {
    let t = test_kit("https://access.example.com", Arc::new(MemoryBlobStore::new()));
    t.radio.disabled.store(true, Ordering::SeqCst);

    assert_eq!(t.kit.initialize("token".to_string()).await, SessionState::Disabled);
    assert!(matches!(
        t.kit.start_access_session(None).await,
        Err(AccessKitError::NotReady {
            state: SessionState::Disabled
        })
    ));

    // the user switches NFC on
    t.radio.disabled.store(false, Ordering::SeqCst);
    assert_eq!(
        t.kit.refresh_hardware_state().await.unwrap(),
        SessionState::Ready
    );
}

#[tokio::test]
async fn test_rejected_transmission_and_stop() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/v1/access/credentials")
        .with_status(200)
        .with_body(credentials_body(&[credential_json(
            "cred-1",
            "active",
            "2026-01-01T00:00:00Z",
        )]))
        .create_async()
        .await;
    server
        .mock("POST", "/api/v1/access/log")
        .with_status(201)
        .create_async()
        .await;

    let t = test_kit(&server.url(), Arc::new(MemoryBlobStore::new()));
    t.kit.initialize("token".to_string()).await;
    t.kit.fetch_credentials().await;
    t.radio.reject_transmissions.store(true, Ordering::SeqCst);

    t.kit.start_access_session(None).await.unwrap();
    let result = t
        .kit
        .handle_tap("main-1".to_string(), "Main Entrance".to_string())
        .await;
    assert_eq!(result.denial_reason, Some(AccessDenialReason::HardwareError));
    assert_eq!(t.kit.credential("cred-1".to_string()).unwrap().usage_count, 0);

    t.kit.start_access_session(None).await.unwrap();
    t.kit.stop_access_session().await;
    assert_eq!(t.kit.state(), SessionState::Ready);
    assert_eq!(t.kit.active_credential_id(), None);
    assert_eq!(t.radio.sessions_stopped.load(Ordering::SeqCst), 1);

    let late = t
        .kit
        .handle_tap("main-1".to_string(), "Main Entrance".to_string())
        .await;
    assert_eq!(late.denial_reason, Some(AccessDenialReason::InvalidCredential));
}
