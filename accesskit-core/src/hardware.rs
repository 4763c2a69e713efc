//! Native NFC radio and haptics contracts.
//!
//! Both are implemented by the host platform. The radio contract mirrors the native
//! module: capability probes, arming and disarming a session, and transmitting the
//! opaque credential payload to a reader. Timeouts are the radio's responsibility.

use thiserror::Error;

/// Errors raised by the native radio.
#[derive(Debug, Error, uniffi::Error)]
pub enum HardwareError {
    /// The radio is missing or turned off.
    #[error("nfc unavailable: {0}")]
    Unavailable(String),

    /// The radio rejected or failed an operation.
    #[error("nfc radio error: {0}")]
    Radio(String),

    /// Unexpected `UniFFI` callback error.
    #[error("unexpected uniffi callback error: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl From<uniffi::UnexpectedUniFFICallbackError> for HardwareError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(error.reason)
    }
}

/// Native NFC radio.
#[uniffi::export(with_foreign)]
pub trait NfcHardware: Send + Sync {
    /// Whether the device has an NFC radio at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the capability cannot be queried.
    fn is_supported(&self) -> Result<bool, HardwareError>;

    /// Whether the radio is switched on.
    ///
    /// # Errors
    ///
    /// Returns an error if the radio state cannot be queried.
    fn is_enabled(&self) -> Result<bool, HardwareError>;

    /// Arms the radio to wait for a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the radio cannot be armed.
    fn start_session(&self) -> Result<(), HardwareError>;

    /// Disarms the radio.
    ///
    /// # Errors
    ///
    /// Returns an error if the radio cannot be disarmed.
    fn stop_session(&self) -> Result<(), HardwareError>;

    /// Sends the opaque payload to the reader in range. `false` means the reader
    /// did not accept it.
    ///
    /// # Errors
    ///
    /// Returns an error if the transmission fails.
    fn transmit_credential(&self, encrypted_data: String) -> Result<bool, HardwareError>;
}

/// Native vibration motor.
#[uniffi::export(with_foreign)]
pub trait Haptics: Send + Sync {
    /// Plays a pattern of alternating wait/vibrate durations in milliseconds,
    /// starting with a vibration for single-element patterns.
    fn vibrate(&self, pattern_ms: Vec<u64>);
}

/// Short pulse when a session is armed.
pub const SESSION_START_PATTERN: &[u64] = &[50];
/// Single pulse on a granted tap.
pub const GRANTED_PATTERN: &[u64] = &[100];
/// Longer double pulse on a denied tap.
pub const DENIED_PATTERN: &[u64] = &[0, 200, 100, 200];

/// Haptics for devices without a vibration motor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn vibrate(&self, _pattern_ms: Vec<u64>) {}
}
