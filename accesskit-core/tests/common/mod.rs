//! Common test utilities shared across integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use accesskit_core::clock::{Clock, FixedClock};
use accesskit_core::hardware::{HardwareError, Haptics, NfcHardware};
use accesskit_core::storage::{BlobStore, MemoryBlobStore};
use accesskit_core::{AccessKit, AccessKitConfig};
use chrono::{DateTime, FixedOffset, TimeZone};

/// Monday 2025-06-02, 10:00 at +02:00.
pub fn monday_morning() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 6, 2, 10, 0, 0)
        .unwrap()
}

/// Radio that accepts every transmission unless told otherwise.
#[derive(Default)]
pub struct SimulatedRadio {
    pub disabled: AtomicBool,
    pub reject_transmissions: AtomicBool,
    pub sessions_started: AtomicUsize,
    pub sessions_stopped: AtomicUsize,
    pub transmitted: Mutex<Vec<String>>,
}

impl NfcHardware for SimulatedRadio {
    fn is_supported(&self) -> Result<bool, HardwareError> {
        Ok(true)
    }

    fn is_enabled(&self) -> Result<bool, HardwareError> {
        Ok(!self.disabled.load(Ordering::SeqCst))
    }

    fn start_session(&self) -> Result<(), HardwareError> {
        self.sessions_started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop_session(&self) -> Result<(), HardwareError> {
        self.sessions_stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn transmit_credential(&self, encrypted_data: String) -> Result<bool, HardwareError> {
        self.transmitted.lock().unwrap().push(encrypted_data);
        Ok(!self.reject_transmissions.load(Ordering::SeqCst))
    }
}

#[derive(Default)]
pub struct RecordingHaptics {
    pub patterns: Mutex<Vec<Vec<u64>>>,
}

impl Haptics for RecordingHaptics {
    fn vibrate(&self, pattern_ms: Vec<u64>) {
        self.patterns.lock().unwrap().push(pattern_ms);
    }
}

pub struct TestKit {
    pub kit: AccessKit,
    pub radio: Arc<SimulatedRadio>,
    pub haptics: Arc<RecordingHaptics>,
    pub blob_store: Arc<MemoryBlobStore>,
}

/// Builds an `AccessKit` against `base_url` with a simulated radio and a pinned clock.
pub fn test_kit(base_url: &str, blob_store: Arc<MemoryBlobStore>) -> TestKit {
    let mut config = AccessKitConfig::new(base_url);
    config.max_retries = 0;

    let radio = Arc::new(SimulatedRadio::default());
    let haptics = Arc::new(RecordingHaptics::default());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(monday_morning()));

    let kit = AccessKit::with_clock(
        &config,
        Arc::clone(&blob_store) as Arc<dyn BlobStore>,
        Some(Arc::clone(&radio) as Arc<dyn NfcHardware>),
        Some(Arc::clone(&haptics) as Arc<dyn Haptics>),
        None,
        clock,
    )
    .unwrap();

    TestKit {
        kit,
        radio,
        haptics,
        blob_store,
    }
}

/// A credential as served by the access API.
pub fn credential_json(id: &str, status: &str, valid_until: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "buildingId": "b-1",
        "buildingName": "Riverside Towers",
        "userId": "u-1",
        "accessLevel": "resident",
        "accessPoints": [
            {
                "id": "main-1",
                "name": "Main Entrance",
                "type": "main_entrance"
            },
            {
                "id": "gym",
                "name": "Gym",
                "type": "amenity",
                "floor": 2,
                "timeRestrictions": [
                    { "days": [1, 2, 3, 4, 5], "startTime": "06:00", "endTime": "09:00" }
                ]
            }
        ],
        "validFrom": "2025-01-01T00:00:00Z",
        "validUntil": valid_until,
        "status": status,
        "usageCount": 0,
        "encryptedData": format!("sealed-{id}")
    })
}

pub fn credentials_body(credentials: &[serde_json::Value]) -> String {
    serde_json::json!({ "credentials": credentials }).to_string()
}
