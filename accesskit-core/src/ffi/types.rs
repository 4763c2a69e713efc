//! FFI-safe mirrors of the data model.
//!
//! Timestamps cross the boundary as Unix seconds. The internal types in
//! [`crate::types`] keep `chrono` values and the server's JSON shape; these
//! records are what Swift and Kotlin see.

use chrono::{DateTime, Utc};

use crate::error::AccessKitError;
use crate::session::TapEvent;
use crate::types::{
    AccessAttemptResult, AccessDenialReason, AccessLevel, AccessLogEntry, AccessPoint,
    Credential, CredentialStatus, GuestAccessInvitation, InvitationStatus, NewGuestInvitation,
};

fn unix_seconds(timestamp: DateTime<Utc>) -> u64 {
    u64::try_from(timestamp.timestamp()).unwrap_or(0)
}

fn from_unix_seconds(attribute: &str, seconds: u64) -> Result<DateTime<Utc>, AccessKitError> {
    i64::try_from(seconds)
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .ok_or_else(|| AccessKitError::InvalidInput {
            attribute: attribute.to_string(),
            reason: format!("{seconds} is not a representable unix timestamp"),
        })
}

// =============================================================================
// Credential
// =============================================================================

/// A cached credential. The opaque payload stays inside the SDK.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct CredentialRecord {
    /// Credential identifier.
    pub id: String,
    /// Building this credential belongs to.
    pub building_id: String,
    /// Building display name.
    pub building_name: String,
    /// Holder of the credential.
    pub user_id: String,
    /// Holder's role.
    pub access_level: AccessLevel,
    /// Readers this credential can open.
    pub access_points: Vec<AccessPoint>,
    /// Start of validity (Unix seconds).
    pub valid_from: u64,
    /// End of validity (Unix seconds).
    pub valid_until: u64,
    /// Server-reported status.
    pub status: CredentialStatus,
    /// Last successful use (Unix seconds).
    pub last_used: Option<u64>,
    /// Number of successful uses on this device.
    pub usage_count: u64,
    /// Whether the credential carries a payload for the radio or the wallet.
    pub has_payload: bool,
}

impl From<&Credential> for CredentialRecord {
    fn from(credential: &Credential) -> Self {
        Self {
            id: credential.id.clone(),
            building_id: credential.building_id.clone(),
            building_name: credential.building_name.clone(),
            user_id: credential.user_id.clone(),
            access_level: credential.access_level,
            access_points: credential.access_points.clone(),
            valid_from: unix_seconds(credential.valid_from),
            valid_until: unix_seconds(credential.valid_until),
            status: credential.status,
            last_used: credential.last_used.map(unix_seconds),
            usage_count: credential.usage_count,
            has_payload: credential.has_payload(),
        }
    }
}

impl From<Credential> for CredentialRecord {
    fn from(credential: Credential) -> Self {
        Self::from(&credential)
    }
}

// =============================================================================
// Access attempts
// =============================================================================

/// Verdict for a single tap.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct AttemptRecord {
    /// Whether the door may open.
    pub granted: bool,
    /// When the tap was evaluated (Unix seconds).
    pub timestamp: u64,
    /// Reader that was tapped.
    pub access_point_id: String,
    /// Reader name, `"Unknown"` for readers the credential does not know.
    pub access_point_name: String,
    /// Set on every denial.
    pub denial_reason: Option<AccessDenialReason>,
    /// Human readable outcome.
    pub message: String,
}

impl From<AccessAttemptResult> for AttemptRecord {
    fn from(result: AccessAttemptResult) -> Self {
        Self {
            granted: result.granted,
            timestamp: unix_seconds(result.timestamp),
            access_point_id: result.access_point_id,
            access_point_name: result.access_point_name,
            denial_reason: result.denial_reason,
            message: result.message,
        }
    }
}

/// One entry of the local access log.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct AccessLogRecord {
    /// Entry id.
    pub id: String,
    /// Credential used.
    pub credential_id: String,
    /// Building of that credential.
    pub building_id: String,
    /// The recorded verdict.
    pub attempt: AttemptRecord,
}

impl From<AccessLogEntry> for AccessLogRecord {
    fn from(entry: AccessLogEntry) -> Self {
        Self {
            id: entry.id,
            credential_id: entry.credential_id,
            building_id: entry.building_id,
            attempt: entry.attempt.into(),
        }
    }
}

/// A reader detected during a session.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct TapRecord {
    /// Reader that was tapped.
    pub access_point_id: String,
    /// Reader name as reported by the radio.
    pub access_point_name: String,
    /// Credential armed for the session.
    pub credential_id: String,
    /// When the tap was received (Unix seconds).
    pub timestamp: u64,
}

impl From<&TapEvent> for TapRecord {
    fn from(event: &TapEvent) -> Self {
        Self {
            access_point_id: event.access_point_id.clone(),
            access_point_name: event.access_point_name.clone(),
            credential_id: event.credential_id.clone(),
            timestamp: unix_seconds(event.timestamp),
        }
    }
}

// =============================================================================
// Guest invitations
// =============================================================================

/// A guest invitation as stored on the server.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct InvitationRecord {
    /// Invitation id.
    pub id: String,
    /// User who issued the invitation.
    pub inviter_id: String,
    /// Display name of the inviter.
    pub inviter_name: String,
    /// Guest display name.
    pub guest_name: String,
    /// Guest e-mail.
    pub guest_email: Option<String>,
    /// Guest phone number.
    pub guest_phone: Option<String>,
    /// Building the guest may enter.
    pub building_id: String,
    /// Readers granted to the guest.
    pub access_point_ids: Vec<String>,
    /// Start of validity (Unix seconds).
    pub valid_from: u64,
    /// End of validity (Unix seconds).
    pub valid_until: u64,
    /// Entry limit, unlimited when absent.
    pub max_entries: Option<u32>,
    /// Entries used so far.
    pub entry_count: u32,
    /// Invitation status.
    pub status: InvitationStatus,
    /// Link the guest opens to claim access.
    pub claim_link: String,
    /// Creation time (Unix seconds).
    pub created_at: u64,
}

impl From<GuestAccessInvitation> for InvitationRecord {
    fn from(invitation: GuestAccessInvitation) -> Self {
        Self {
            id: invitation.id,
            inviter_id: invitation.inviter_id,
            inviter_name: invitation.inviter_name,
            guest_name: invitation.guest_name,
            guest_email: invitation.guest_email,
            guest_phone: invitation.guest_phone,
            building_id: invitation.building_id,
            access_point_ids: invitation.access_point_ids,
            valid_from: unix_seconds(invitation.valid_from),
            valid_until: unix_seconds(invitation.valid_until),
            max_entries: invitation.max_entries,
            entry_count: invitation.entry_count,
            status: invitation.status,
            claim_link: invitation.claim_link,
            created_at: unix_seconds(invitation.created_at),
        }
    }
}

/// Parameters for a new guest invitation.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct NewInvitationRecord {
    /// Building the guest may enter.
    pub building_id: String,
    /// Guest display name.
    pub guest_name: String,
    /// Guest e-mail.
    pub guest_email: Option<String>,
    /// Guest phone number.
    pub guest_phone: Option<String>,
    /// Readers to grant.
    pub access_point_ids: Vec<String>,
    /// Start of validity (Unix seconds).
    pub valid_from: u64,
    /// End of validity (Unix seconds).
    pub valid_until: u64,
    /// Entry limit.
    pub max_entries: Option<u32>,
}

impl TryFrom<NewInvitationRecord> for NewGuestInvitation {
    type Error = AccessKitError;

    fn try_from(record: NewInvitationRecord) -> Result<Self, Self::Error> {
        let valid_from = from_unix_seconds("valid_from", record.valid_from)?;
        let valid_until = from_unix_seconds("valid_until", record.valid_until)?;
        if valid_until <= valid_from {
            return Err(AccessKitError::InvalidInput {
                attribute: "valid_until".to_string(),
                reason: "must be after valid_from".to_string(),
            });
        }
        if record.guest_name.trim().is_empty() {
            return Err(AccessKitError::InvalidInput {
                attribute: "guest_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            building_id: record.building_id,
            guest_name: record.guest_name,
            guest_email: record.guest_email,
            guest_phone: record.guest_phone,
            access_point_ids: record.access_point_ids,
            valid_from,
            valid_until,
            max_entries: record.max_entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn new_invitation(valid_from: u64, valid_until: u64) -> NewInvitationRecord {
        NewInvitationRecord {
            building_id: "b-1".to_string(),
            guest_name: "Bob".to_string(),
            guest_email: None,
            guest_phone: None,
            access_point_ids: vec!["main-1".to_string()],
            valid_from,
            valid_until,
            max_entries: None,
        }
    }

    #[test]
    fn test_credential_record_timestamps() {
        let credential = Credential {
            id: "c-1".to_string(),
            building_id: "b-1".to_string(),
            building_name: "Riverside".to_string(),
            user_id: "u-1".to_string(),
            access_level: AccessLevel::Tenant,
            access_points: vec![],
            valid_from: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            valid_until: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            status: CredentialStatus::Active,
            last_used: None,
            usage_count: 4,
            encrypted_data: String::new(),
        };

        let record = CredentialRecord::from(&credential);
        assert_eq!(record.valid_from, 1_735_689_600);
        assert_eq!(record.valid_until, 1_767_225_600);
        assert_eq!(record.last_used, None);
        assert!(!record.has_payload);
    }

    #[test]
    fn test_new_invitation_validation() {
        let ok = NewGuestInvitation::try_from(new_invitation(1_750_000_000, 1_750_003_600)).unwrap();
        assert_eq!(ok.valid_from.timestamp(), 1_750_000_000);

        assert!(matches!(
            NewGuestInvitation::try_from(new_invitation(1_750_003_600, 1_750_000_000)),
            Err(AccessKitError::InvalidInput { .. })
        ));
        assert!(matches!(
            NewGuestInvitation::try_from(new_invitation(0, u64::MAX)),
            Err(AccessKitError::InvalidInput { .. })
        ));
    }
}
