use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Server-side state of a guest invitation.
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
pub enum InvitationStatus {
    /// Sent, not yet claimed.
    Pending,
    /// Claimed by the guest.
    Accepted,
    /// Validity window passed.
    Expired,
    /// Withdrawn by the inviter.
    Cancelled,
}

/// Temporary building access granted by a resident to a guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestAccessInvitation {
    /// Invitation id.
    pub id: String,
    /// User who issued the invitation.
    pub inviter_id: String,
    /// Display name of the inviter.
    #[serde(default)]
    pub inviter_name: String,
    /// Guest display name.
    pub guest_name: String,
    /// Guest e-mail, if given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_email: Option<String>,
    /// Guest phone number, if given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_phone: Option<String>,
    /// Building the guest may enter.
    pub building_id: String,
    /// Readers granted to the guest.
    #[serde(default)]
    pub access_point_ids: Vec<String>,
    /// Start of validity.
    pub valid_from: DateTime<Utc>,
    /// End of validity.
    pub valid_until: DateTime<Utc>,
    /// Entry limit, unlimited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<u32>,
    /// Entries used so far.
    #[serde(default)]
    pub entry_count: u32,
    /// Invitation status.
    pub status: InvitationStatus,
    /// Link the guest opens to claim access.
    #[serde(default)]
    pub claim_link: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Request body for creating an invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGuestInvitation {
    /// Building the guest may enter.
    pub building_id: String,
    /// Guest display name.
    pub guest_name: String,
    /// Guest e-mail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_email: Option<String>,
    /// Guest phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_phone: Option<String>,
    /// Readers to grant.
    pub access_point_ids: Vec<String>,
    /// Start of validity.
    pub valid_from: DateTime<Utc>,
    /// End of validity.
    pub valid_until: DateTime<Utc>,
    /// Entry limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<u32>,
}
