//! Error types returned by the SDK.

use thiserror::Error;

use crate::hardware::HardwareError;
use crate::session::SessionState;
use crate::storage::StorageError;

/// Error outputs from `AccessKit`.
///
/// Access decisions are never reported through this type: denials travel in
/// [`crate::AccessAttemptResult`]. These errors cover misuse of the session API,
/// transport failures and platform faults.
#[derive(Debug, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum AccessKitError {
    /// The presented input is not valid for the requested operation
    #[error("invalid_input: {attribute}: {reason}")]
    InvalidInput {
        /// The offending parameter.
        attribute: String,
        /// Why it was rejected.
        reason: String,
    },
    /// A session was requested while the controller is not `ready`
    #[error("not_ready: session controller is {state}")]
    NotReady {
        /// The state the controller was in.
        state: SessionState,
    },
    /// No credential was given and the active set does not contain exactly one
    #[error("ambiguous_credential: {candidates} active credentials, pass a credential id")]
    AmbiguousCredential {
        /// Number of active credentials found.
        candidates: usize,
    },
    /// The requested credential is not in the local cache
    #[error("credential_not_found: {id}")]
    CredentialNotFound {
        /// The id that was looked up.
        id: String,
    },
    /// Network connection error with details
    #[error("network_error: {url} (status: {status:?}): {error}")]
    NetworkError {
        /// Request URL.
        url: String,
        /// HTTP status, if a response arrived.
        status: Option<u16>,
        /// Failure description.
        error: String,
    },
    /// Unexpected error serializing information
    #[error("serialization_error: {error}")]
    SerializationError {
        /// Failure description.
        error: String,
    },
    /// The NFC radio failed
    #[error(transparent)]
    Hardware(#[from] HardwareError),
    /// Local persistence failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<reqwest::Error> for AccessKitError {
    fn from(error: reqwest::Error) -> Self {
        Self::NetworkError {
            url: error
                .url()
                .map_or_else(|| "<unknown>".to_string(), ToString::to_string),
            status: error.status().map(|status| status.as_u16()),
            error: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for AccessKitError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerializationError {
            error: error.to_string(),
        }
    }
}
