use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::Credential;

/// Why an access attempt was rejected.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    uniffi::Enum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccessDenialReason {
    /// The credential is past its validity or marked expired.
    CredentialExpired,
    /// The credential is suspended.
    CredentialSuspended,
    /// The credential is revoked.
    CredentialRevoked,
    /// The reader is not among the credential's access points.
    AccessPointNotAllowed,
    /// No time window of the reader matches the tap time.
    TimeRestriction,
    /// The building is locked down.
    BuildingLockdown,
    /// No usable credential.
    InvalidCredential,
    /// A network failure prevented the decision.
    NetworkError,
    /// The radio failed to transmit the payload.
    HardwareError,
}

impl AccessDenialReason {
    /// User-facing message for this reason.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::CredentialExpired => "Your access credential has expired",
            Self::CredentialSuspended => "Your access credential is suspended",
            Self::CredentialRevoked => "Your access credential has been revoked",
            Self::AccessPointNotAllowed => "You do not have access to this entry point",
            Self::TimeRestriction => "Access is not permitted at this time",
            Self::BuildingLockdown => "The building is currently in lockdown",
            Self::InvalidCredential => "Invalid access credential",
            Self::NetworkError => "Network error while verifying access",
            Self::HardwareError => "Failed to communicate with the reader",
        }
    }
}

/// Verdict for a single tap. Produced once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessAttemptResult {
    /// Whether the door may open.
    pub granted: bool,
    /// When the tap was evaluated.
    pub timestamp: DateTime<Utc>,
    /// Reader that was tapped.
    pub access_point_id: String,
    /// Reader name, or `"Unknown"` when the credential does not know the reader.
    pub access_point_name: String,
    /// Set on every denial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denial_reason: Option<AccessDenialReason>,
    /// Human readable outcome.
    pub message: String,
}

impl AccessAttemptResult {
    /// A granted verdict for the named reader.
    #[must_use]
    pub fn granted(
        access_point_id: impl Into<String>,
        access_point_name: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let access_point_name = access_point_name.into();
        Self {
            granted: true,
            timestamp,
            access_point_id: access_point_id.into(),
            message: format!("Access granted: {access_point_name}"),
            access_point_name,
            denial_reason: None,
        }
    }

    /// A denied verdict carrying the reason's standard message.
    #[must_use]
    pub fn denied(
        access_point_id: impl Into<String>,
        access_point_name: impl Into<String>,
        reason: AccessDenialReason,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::denied_with_message(
            access_point_id,
            access_point_name,
            reason,
            reason.message(),
            timestamp,
        )
    }

    /// A denied verdict with a custom message.
    #[must_use]
    pub fn denied_with_message(
        access_point_id: impl Into<String>,
        access_point_name: impl Into<String>,
        reason: AccessDenialReason,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            granted: false,
            timestamp,
            access_point_id: access_point_id.into(),
            access_point_name: access_point_name.into(),
            denial_reason: Some(reason),
            message: message.into(),
        }
    }

    /// Replaces a grant with a `hardware_error` denial for the same reader and time.
    #[must_use]
    pub(crate) fn into_hardware_failure(self) -> Self {
        Self::denied(
            self.access_point_id,
            self.access_point_name,
            AccessDenialReason::HardwareError,
            self.timestamp,
        )
    }
}

/// Persisted audit record of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogEntry {
    /// Unique entry id.
    pub id: String,
    /// Credential used for the attempt.
    pub credential_id: String,
    /// Building of that credential.
    pub building_id: String,
    /// The verdict.
    #[serde(flatten)]
    pub attempt: AccessAttemptResult,
}

impl AccessLogEntry {
    /// Builds an entry with a fresh id from an attempt made with `credential`.
    #[must_use]
    pub fn new(credential: &Credential, attempt: AccessAttemptResult) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            credential_id: credential.id.clone(),
            building_id: credential.building_id.clone(),
            attempt,
        }
    }
}
