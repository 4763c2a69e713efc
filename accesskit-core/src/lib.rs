//! `accesskit-core` decides whether a phone may open a building door on an NFC tap.
//!
//! The crate keeps an offline-first cache of building access credentials, validates
//! taps against them without any network round-trip, drives the platform NFC radio
//! through a small session state machine and records every attempt in a bounded
//! audit log that is mirrored to the server on a best-effort basis.
//!
//! Platform capabilities (the NFC radio, haptics, the wallet pass store, persistent
//! storage and logging) are supplied by the host app through foreign traits.
//!
//! ```rust,ignore
//! let kit = AccessKit::new(config, blob_store, Some(radio), haptics, None)?;
//! kit.initialize("bearer-token".to_string()).await;
//! kit.fetch_credentials().await;
//! kit.start_access_session(None).await?;
//! // ... the radio calls back into `handle_tap` when a reader is detected
//! ```
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod clock;
pub mod config;
pub mod credential_store;
pub mod error;
pub mod hardware;
pub mod logger;
pub mod session;
pub mod storage;
pub mod types;
pub mod validator;
pub mod wallet;

mod access_log;
mod client;
mod ffi;
mod http_request;

pub use access_log::{AccessLog, LogOutbox};
pub use client::AccessApiClient;
pub use config::AccessKitConfig;
pub use credential_store::CredentialStore;
pub use error::AccessKitError;
pub use ffi::{
    AccessKit, AccessLogRecord, AccessResultObserver, AttemptRecord, CredentialRecord,
    InvitationRecord, NewInvitationRecord, StateObserver, TapObserver, TapRecord,
};
pub use session::{SessionController, SessionState, Subscription, TapEvent};
pub use types::*;
pub use validator::validate_access;
pub use wallet::WalletBridge;

uniffi::setup_scaffolding!("accesskit_core");
