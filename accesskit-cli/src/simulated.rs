//! Stand-ins for the phone's NFC radio and vibration motor.

use std::sync::atomic::{AtomicBool, Ordering};

use accesskit_core::hardware::{HardwareError, Haptics, NfcHardware};

/// Radio that is always present and on. A reader "accepts" the payload unless
/// configured to reject it.
#[derive(Debug, Default)]
pub struct SimulatedRadio {
    reject: bool,
    armed: AtomicBool,
}

impl SimulatedRadio {
    pub const fn new(reject: bool) -> Self {
        Self {
            reject,
            armed: AtomicBool::new(false),
        }
    }
}

impl NfcHardware for SimulatedRadio {
    fn is_supported(&self) -> Result<bool, HardwareError> {
        Ok(true)
    }

    fn is_enabled(&self) -> Result<bool, HardwareError> {
        Ok(true)
    }

    fn start_session(&self) -> Result<(), HardwareError> {
        self.armed.store(true, Ordering::SeqCst);
        tracing::debug!("simulated radio armed");
        Ok(())
    }

    fn stop_session(&self) -> Result<(), HardwareError> {
        self.armed.store(false, Ordering::SeqCst);
        tracing::debug!("simulated radio disarmed");
        Ok(())
    }

    fn transmit_credential(&self, encrypted_data: String) -> Result<bool, HardwareError> {
        if !self.armed.load(Ordering::SeqCst) {
            return Err(HardwareError::Radio("radio is not armed".to_string()));
        }
        tracing::debug!(bytes = encrypted_data.len(), reject = self.reject, "simulated transmission");
        Ok(!self.reject)
    }
}

/// Prints haptic patterns instead of vibrating.
#[derive(Debug, Default)]
pub struct TraceHaptics;

impl Haptics for TraceHaptics {
    fn vibrate(&self, pattern_ms: Vec<u64>) {
        tracing::debug!(?pattern_ms, "haptic feedback");
    }
}
