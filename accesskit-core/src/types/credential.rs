use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Role of the credential holder within the building.
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
pub enum AccessLevel {
    /// Unit owner.
    Owner,
    /// Resident living in the unit.
    Resident,
    /// Tenant renting the unit.
    Tenant,
    /// Temporary guest.
    Guest,
    /// Service staff (cleaning, maintenance).
    Service,
    /// Courier or delivery personnel.
    Delivery,
    /// Emergency responders.
    Emergency,
    /// A role this client does not know about.
    #[serde(other)]
    Other,
}

/// Lifecycle status of a credential as last reported by the server.
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
pub enum CredentialStatus {
    /// Usable for access.
    Active,
    /// Temporarily disabled by building management.
    Suspended,
    /// Validity window has passed.
    Expired,
    /// Permanently withdrawn.
    Revoked,
    /// Issued but not yet activated by the holder.
    PendingActivation,
    /// A status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Kind of physical reader.
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
pub enum AccessPointType {
    /// Main building entrance.
    MainEntrance,
    /// Parking barrier.
    ParkingGate,
    /// Elevator call panel.
    Elevator,
    /// Door to a specific floor.
    FloorDoor,
    /// Shared amenity (gym, pool, lounge).
    Amenity,
    /// Garage door.
    Garage,
    /// Mail or parcel room.
    Mailroom,
    /// Emergency exit.
    EmergencyExit,
    /// A reader type this client does not know about.
    #[serde(other)]
    Other,
}

/// Recurring weekly window during which an access point may be used.
///
/// Times are local wall-clock `HH:MM` and the window is assumed to start and end
/// on the same day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct TimeRestriction {
    /// Weekdays the window applies to, `0` = Sunday through `6` = Saturday.
    pub days: Vec<u8>,
    /// Inclusive start, `HH:MM`.
    pub start_time: String,
    /// Inclusive end, `HH:MM`.
    pub end_time: String,
}

impl TimeRestriction {
    /// Returns `true` when `weekday` is listed and `minute_of_day` falls inside the
    /// window, both bounds inclusive.
    ///
    /// A restriction with an unparseable start or end never matches.
    #[must_use]
    pub fn allows(&self, weekday: u8, minute_of_day: u32) -> bool {
        let (Some(start), Some(end)) = (
            parse_minutes(&self.start_time),
            parse_minutes(&self.end_time),
        ) else {
            return false;
        };

        self.days.contains(&weekday) && (start..=end).contains(&minute_of_day)
    }
}

/// Parses `HH:MM` into minutes since midnight.
fn parse_minutes(value: &str) -> Option<u32> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// A physical reader a credential may unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct AccessPoint {
    /// Reader identifier, as reported by the reader on tap.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Reader kind.
    #[serde(rename = "type")]
    pub kind: AccessPointType,
    /// Optional zone label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Optional floor number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    /// Windows during which the reader may be used. Empty means always.
    #[serde(default)]
    pub time_restrictions: Vec<TimeRestriction>,
}

/// A per-user, per-building access grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
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
    /// Readers this credential can open, in server order.
    #[serde(default)]
    pub access_points: Vec<AccessPoint>,
    /// Start of validity.
    pub valid_from: DateTime<Utc>,
    /// End of validity.
    pub valid_until: DateTime<Utc>,
    /// Server-reported status. May be stale while offline.
    pub status: CredentialStatus,
    /// Last successful use on this device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
    /// Number of successful uses on this device.
    #[serde(default)]
    pub usage_count: u64,
    /// Opaque payload transmitted to the reader.
    #[serde(default)]
    pub encrypted_data: String,
}

impl Credential {
    /// Active status and not yet past `valid_until`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == CredentialStatus::Active && self.valid_until > now
    }

    /// Active credential whose validity ends within `threshold` of `now`.
    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.status == CredentialStatus::Active && self.valid_until - now <= threshold
    }

    /// Looks up one of this credential's access points by id.
    #[must_use]
    pub fn access_point(&self, access_point_id: &str) -> Option<&AccessPoint> {
        self.access_points
            .iter()
            .find(|point| point.id == access_point_id)
    }

    /// Whether there is a payload that can be transmitted or placed in a wallet.
    #[must_use]
    pub fn has_payload(&self) -> bool {
        !self.encrypted_data.trim().is_empty()
    }

    /// Bumps the usage counter and stamps `last_used` together.
    pub(crate) fn record_usage(&mut self, now: DateTime<Utc>) {
        self.usage_count = self.usage_count.saturating_add(1);
        self.last_used = Some(now);
    }
}
