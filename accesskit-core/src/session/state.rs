use strum::Display;

/// Lifecycle of the NFC tap session.
///
/// ```text
/// unsupported -> disabled -> ready <-> reading <-> transmitting -> ready
/// ```
///
/// `error` is entered on a hardware fault and left on the next successful probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, uniffi::Enum)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// No radio, or the radio lacks NFC.
    #[default]
    Unsupported,
    /// The radio exists but is switched off.
    Disabled,
    /// Idle and able to start a session.
    Ready,
    /// Armed and waiting for a reader.
    Reading,
    /// Sending the credential payload to a reader.
    Transmitting,
    /// The radio reported a fault.
    Error,
}

impl SessionState {
    /// Whether a session is armed.
    #[must_use]
    pub const fn is_session_active(self) -> bool {
        matches!(self, Self::Reading | Self::Transmitting)
    }
}
