//! Offline access decision.
//!
//! [`validate_access`] is a pure function of its inputs so the same tap always
//! produces the same verdict. Checks run in a fixed order and the first failing
//! one decides the denial reason shown to the user:
//!
//! 1. credential status
//! 2. expiry (independent of status, which may be stale)
//! 3. access point membership
//! 4. time restrictions of the access point
//!
//! Note that time windows are same-day ranges: a window such as `22:00`–`06:00`
//! matches nothing.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

use crate::types::{AccessAttemptResult, AccessDenialReason, Credential, CredentialStatus};

/// Name reported for readers the credential does not know.
pub const UNKNOWN_ACCESS_POINT: &str = "Unknown";

/// Decides whether `credential` opens `access_point_id` at `now`.
///
/// `now` carries the local UTC offset: weekday and time of day are read from the
/// local wall clock, expiry is compared as an absolute instant.
#[must_use]
pub fn validate_access(
    credential: &Credential,
    access_point_id: &str,
    now: DateTime<FixedOffset>,
) -> AccessAttemptResult {
    let timestamp = now.with_timezone(&Utc);
    let point = credential.access_point(access_point_id);
    let point_name = point.map_or(UNKNOWN_ACCESS_POINT, |point| point.name.as_str());
    let deny = |reason| AccessAttemptResult::denied(access_point_id, point_name, reason, timestamp);

    if let Some(reason) = status_denial(credential.status) {
        return deny(reason);
    }

    if timestamp > credential.valid_until {
        return deny(AccessDenialReason::CredentialExpired);
    }

    let Some(point) = point else {
        return deny(AccessDenialReason::AccessPointNotAllowed);
    };

    if !point.time_restrictions.is_empty() {
        #[allow(clippy::cast_possible_truncation)]
        let weekday = now.weekday().num_days_from_sunday() as u8;
        let minute_of_day = now.hour() * 60 + now.minute();

        let within_window = point
            .time_restrictions
            .iter()
            .any(|restriction| restriction.allows(weekday, minute_of_day));
        if !within_window {
            return deny(AccessDenialReason::TimeRestriction);
        }
    }

    AccessAttemptResult::granted(access_point_id, &point.name, timestamp)
}

const fn status_denial(status: CredentialStatus) -> Option<AccessDenialReason> {
    match status {
        CredentialStatus::Active => None,
        CredentialStatus::Suspended => Some(AccessDenialReason::CredentialSuspended),
        CredentialStatus::Revoked => Some(AccessDenialReason::CredentialRevoked),
        CredentialStatus::Expired => Some(AccessDenialReason::CredentialExpired),
        CredentialStatus::PendingActivation | CredentialStatus::Unknown => {
            Some(AccessDenialReason::InvalidCredential)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use test_case::test_case;

    use super::*;
    use crate::types::{AccessLevel, AccessPoint, AccessPointType, TimeRestriction};

    /// 2025-06-02 is a Monday.
    fn local(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 6, day, hour, minute, 0)
            .unwrap()
    }

    fn point(id: &str, name: &str, restrictions: Vec<TimeRestriction>) -> AccessPoint {
        AccessPoint {
            id: id.to_string(),
            name: name.to_string(),
            kind: AccessPointType::MainEntrance,
            zone: None,
            floor: None,
            time_restrictions: restrictions,
        }
    }

    fn credential(status: CredentialStatus) -> Credential {
        Credential {
            id: "cred-1".to_string(),
            building_id: "b-1".to_string(),
            building_name: "Riverside".to_string(),
            user_id: "u-1".to_string(),
            access_level: AccessLevel::Resident,
            access_points: vec![
                point("main-1", "Main Entrance", vec![]),
                point(
                    "gym",
                    "Gym",
                    vec![TimeRestriction {
                        days: vec![1],
                        start_time: "09:00".to_string(),
                        end_time: "17:00".to_string(),
                    }],
                ),
            ],
            valid_from: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            valid_until: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            status,
            last_used: None,
            usage_count: 0,
            encrypted_data: "opaque".to_string(),
        }
    }

    #[test_case(CredentialStatus::Suspended => AccessDenialReason::CredentialSuspended)]
    #[test_case(CredentialStatus::Revoked => AccessDenialReason::CredentialRevoked)]
    #[test_case(CredentialStatus::Expired => AccessDenialReason::CredentialExpired)]
    #[test_case(CredentialStatus::PendingActivation => AccessDenialReason::InvalidCredential)]
    #[test_case(CredentialStatus::Unknown => AccessDenialReason::InvalidCredential)]
    fn test_status_denial(status: CredentialStatus) -> AccessDenialReason {
        // Status wins over an unknown reader and a closed time window.
        for (point_id, now) in [("main-1", local(2, 12, 0)), ("nowhere", local(3, 3, 0))] {
            let result = validate_access(&credential(status), point_id, now);
            assert!(!result.granted);
            assert_eq!(result.message, result.denial_reason.unwrap().message());
        }
        validate_access(&credential(status), "gym", local(2, 8, 0))
            .denial_reason
            .unwrap()
    }

    #[test]
    fn test_expiry_overrides_active_status() {
        let mut credential = credential(CredentialStatus::Active);
        credential.valid_until = local(2, 11, 59).with_timezone(&Utc);

        let result = validate_access(&credential, "main-1", local(2, 12, 0));
        assert!(!result.granted);
        assert_eq!(result.denial_reason, Some(AccessDenialReason::CredentialExpired));
    }

    #[test]
    fn test_expiry_boundary_is_still_valid() {
        let mut credential = credential(CredentialStatus::Active);
        credential.valid_until = local(2, 12, 0).with_timezone(&Utc);

        assert!(validate_access(&credential, "main-1", local(2, 12, 0)).granted);
    }

    #[test]
    fn test_unknown_access_point() {
        let result = validate_access(
            &credential(CredentialStatus::Active),
            "garage-9",
            local(2, 12, 0),
        );
        assert!(!result.granted);
        assert_eq!(
            result.denial_reason,
            Some(AccessDenialReason::AccessPointNotAllowed)
        );
        assert_eq!(result.access_point_name, UNKNOWN_ACCESS_POINT);
        assert_eq!(result.access_point_id, "garage-9");
    }

    #[test]
    fn test_unrestricted_point_open_around_the_clock() {
        let credential = credential(CredentialStatus::Active);
        let start = local(1, 0, 0);
        for hours in (0..7 * 24).step_by(5) {
            let now = start + Duration::hours(hours) + Duration::minutes(hours % 60);
            assert!(validate_access(&credential, "main-1", now).granted, "{now}");
        }
    }

    #[test_case(2, 9, 0 => None ; "monday at start")]
    #[test_case(2, 17, 0 => None ; "monday at end")]
    #[test_case(2, 8, 59 => Some(AccessDenialReason::TimeRestriction) ; "monday before start")]
    #[test_case(2, 17, 1 => Some(AccessDenialReason::TimeRestriction) ; "monday after end")]
    #[test_case(3, 12, 0 => Some(AccessDenialReason::TimeRestriction) ; "tuesday noon")]
    fn test_time_window(day: u32, hour: u32, minute: u32) -> Option<AccessDenialReason> {
        validate_access(
            &credential(CredentialStatus::Active),
            "gym",
            local(day, hour, minute),
        )
        .denial_reason
    }

    #[test]
    fn test_windows_are_or_combined() {
        let mut credential = credential(CredentialStatus::Active);
        credential.access_points[1]
            .time_restrictions
            .push(TimeRestriction {
                days: vec![2],
                start_time: "06:00".to_string(),
                end_time: "07:00".to_string(),
            });

        assert!(validate_access(&credential, "gym", local(3, 6, 30)).granted);
        assert!(validate_access(&credential, "gym", local(2, 10, 0)).granted);
        assert!(!validate_access(&credential, "gym", local(3, 10, 0)).granted);
    }

    #[test]
    fn test_wall_clock_uses_local_offset() {
        // 08:30 UTC is 10:30 at +02:00, inside the Monday window.
        let now = Utc
            .with_ymd_and_hms(2025, 6, 2, 8, 30, 0)
            .unwrap()
            .with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap());
        assert!(validate_access(&credential(CredentialStatus::Active), "gym", now).granted);

        let utc_now = Utc.with_ymd_and_hms(2025, 6, 2, 8, 30, 0).unwrap().fixed_offset();
        let result = validate_access(&credential(CredentialStatus::Active), "gym", utc_now);
        assert_eq!(result.denial_reason, Some(AccessDenialReason::TimeRestriction));
    }

    #[test]
    fn test_overnight_window_matches_nothing() {
        let mut credential = credential(CredentialStatus::Active);
        credential.access_points[1].time_restrictions = vec![TimeRestriction {
            days: vec![1],
            start_time: "22:00".to_string(),
            end_time: "06:00".to_string(),
        }];

        assert!(!validate_access(&credential, "gym", local(2, 23, 0)).granted);
        assert!(!validate_access(&credential, "gym", local(2, 5, 0)).granted);
    }

    #[test]
    fn test_grant_message_and_determinism() {
        let credential = credential(CredentialStatus::Active);
        let now = local(2, 12, 0);

        let first = validate_access(&credential, "main-1", now);
        let second = validate_access(&credential, "main-1", now);

        assert!(first.granted);
        assert_eq!(first.access_point_name, "Main Entrance");
        assert_eq!(first.message, "Access granted: Main Entrance");
        assert_eq!(first.denial_reason, None);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }
}
