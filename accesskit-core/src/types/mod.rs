//! Data model shared by the store, the validator and the session controller.
//!
//! All types serialize to the JSON shape used by the access API: `camelCase` keys,
//! `snake_case` enumeration values and RFC 3339 timestamps.

mod attempt;
mod credential;
mod invitation;

pub use attempt::{AccessAttemptResult, AccessDenialReason, AccessLogEntry};
pub use credential::{
    AccessLevel, AccessPoint, AccessPointType, Credential, CredentialStatus, TimeRestriction,
};
pub use invitation::{GuestAccessInvitation, InvitationStatus, NewGuestInvitation};
