//! Swift and Kotlin entry point.
//!
//! [`AccessKit`] wires the credential store, the session controller and the wallet
//! bridge together behind one exported object.
//!
//! # Example (Swift)
//!
//! ```swift
//! let kit = try AccessKit(
//!     config: AccessKitConfig(baseUrl: "https://api.example.com", ...),
//!     blobStore: FileBlobStore(),
//!     hardware: NfcBridge(),
//!     haptics: HapticsBridge(),
//!     wallet: PassKitBridge()
//! )
//! await kit.initialize(authToken: token)
//! _ = await kit.fetchCredentials()
//!
//! let subscription = kit.onAccessResult(observer: resultObserver)
//! let credential = try await kit.startAccessSession(credentialId: nil)
//! // the NFC delegate forwards reader detections:
//! let result = await kit.handleTap(accessPointId: id, accessPointName: name)
//! ```

mod types;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use secrecy::SecretString;

pub use types::{
    AccessLogRecord, AttemptRecord, CredentialRecord, InvitationRecord, NewInvitationRecord,
    TapRecord,
};

use crate::client::AccessApiClient;
use crate::clock::{Clock, SystemClock};
use crate::config::AccessKitConfig;
use crate::credential_store::CredentialStore;
use crate::error::AccessKitError;
use crate::hardware::{Haptics, NfcHardware, NoHaptics};
use crate::session::{SessionController, SessionState, Subscription};
use crate::storage::BlobStore;
use crate::types::NewGuestInvitation;
use crate::validator::validate_access;
use crate::wallet::{WalletBridge, WalletModule};

/// Receives session state changes.
#[uniffi::export(with_foreign)]
pub trait StateObserver: Send + Sync {
    /// Called after every state change.
    fn on_state_change(&self, state: SessionState);
}

/// Receives reader detections.
#[uniffi::export(with_foreign)]
pub trait TapObserver: Send + Sync {
    /// Called when a reader is detected, before the tap is evaluated.
    fn on_tap(&self, event: TapRecord);
}

/// Receives tap verdicts.
#[uniffi::export(with_foreign)]
pub trait AccessResultObserver: Send + Sync {
    /// Called with the final verdict of every tap.
    fn on_access_result(&self, result: AttemptRecord);
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Building access SDK.
#[derive(uniffi::Object)]
pub struct AccessKit {
    store: Arc<CredentialStore>,
    client: Arc<AccessApiClient>,
    controller: SessionController,
    wallet: WalletBridge,
    clock: Arc<dyn Clock>,
}

impl AccessKit {
    /// Creates the SDK with an explicit time source.
    ///
    /// # Errors
    ///
    /// Returns [`AccessKitError::InvalidInput`] if the configuration is invalid.
    pub fn with_clock(
        config: &AccessKitConfig,
        blob_store: Arc<dyn BlobStore>,
        hardware: Option<Arc<dyn NfcHardware>>,
        haptics: Option<Arc<dyn Haptics>>,
        wallet: Option<Arc<dyn WalletModule>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AccessKitError> {
        config.validate()?;

        let client = Arc::new(AccessApiClient::new(config));
        let store = Arc::new(CredentialStore::new(
            config,
            Arc::clone(&client),
            blob_store,
            Arc::clone(&clock),
        ));
        let haptics = haptics.unwrap_or_else(|| Arc::new(NoHaptics) as Arc<dyn Haptics>);
        let controller =
            SessionController::new(Arc::clone(&store), hardware, haptics, Arc::clone(&clock));
        let wallet = wallet.map_or_else(WalletBridge::unsupported, WalletBridge::new);

        Ok(Self {
            store,
            client,
            controller,
            wallet,
            clock,
        })
    }

    /// Runs the validator against a cached credential at a given time.
    ///
    /// # Errors
    ///
    /// Returns [`AccessKitError::CredentialNotFound`] for an unknown id.
    pub fn validate_access_at(
        &self,
        credential_id: &str,
        access_point_id: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<AttemptRecord, AccessKitError> {
        let credential =
            self.store
                .credential(credential_id)
                .ok_or_else(|| AccessKitError::CredentialNotFound {
                    id: credential_id.to_string(),
                })?;
        Ok(validate_access(&credential, access_point_id, now).into())
    }
}

#[allow(clippy::needless_pass_by_value)]
#[uniffi::export(async_runtime = "tokio")]
impl AccessKit {
    /// Creates the SDK.
    ///
    /// `hardware` is `None` on devices without an NFC module, `haptics` on devices
    /// without a vibration motor and `wallet` where no pass store exists.
    ///
    /// # Errors
    ///
    /// Returns [`AccessKitError::InvalidInput`] if the configuration is invalid.
    #[uniffi::constructor]
    pub fn new(
        config: AccessKitConfig,
        blob_store: Arc<dyn BlobStore>,
        hardware: Option<Arc<dyn NfcHardware>>,
        haptics: Option<Arc<dyn Haptics>>,
        wallet: Option<Arc<dyn WalletModule>>,
    ) -> Result<Arc<Self>, AccessKitError> {
        Self::with_clock(
            &config,
            blob_store,
            hardware,
            haptics,
            wallet,
            Arc::new(SystemClock),
        )
        .map(Arc::new)
    }

    /// Sets the auth token, restores local state and probes the radio.
    pub async fn initialize(&self, auth_token: String) -> SessionState {
        self.controller
            .initialize(SecretString::from(auth_token))
            .await
    }

    /// Probes the radio again.
    ///
    /// # Errors
    ///
    /// Returns [`AccessKitError::NotReady`] while a session is armed.
    pub async fn refresh_hardware_state(&self) -> Result<SessionState, AccessKitError> {
        self.controller.refresh_hardware_state().await
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.controller.state()
    }

    /// Credential armed for the current session.
    #[must_use]
    pub fn active_credential_id(&self) -> Option<String> {
        self.controller.active_credential_id()
    }

    /// Arms the radio for `credential_id`, or for the single active credential.
    ///
    /// # Errors
    ///
    /// See [`SessionController::start_access_session`].
    pub async fn start_access_session(
        &self,
        credential_id: Option<String>,
    ) -> Result<CredentialRecord, AccessKitError> {
        self.controller
            .start_access_session(credential_id.as_deref())
            .await
            .map(CredentialRecord::from)
    }

    /// Evaluates a reader detection. Never fails.
    pub async fn handle_tap(
        &self,
        access_point_id: String,
        access_point_name: String,
    ) -> AttemptRecord {
        self.controller
            .handle_tap(&access_point_id, &access_point_name)
            .await
            .into()
    }

    /// Disarms the radio and returns to `ready`.
    pub async fn stop_access_session(&self) {
        self.controller.stop_access_session().await;
    }

    /// Subscribes to state changes.
    pub fn on_state_change(&self, observer: Arc<dyn StateObserver>) -> Arc<Subscription> {
        Arc::new(
            self.controller
                .on_state_change(move |state| observer.on_state_change(*state)),
        )
    }

    /// Subscribes to reader detections.
    pub fn on_tap(&self, observer: Arc<dyn TapObserver>) -> Arc<Subscription> {
        Arc::new(
            self.controller
                .on_tap(move |event| observer.on_tap(TapRecord::from(event))),
        )
    }

    /// Subscribes to tap verdicts.
    pub fn on_access_result(&self, observer: Arc<dyn AccessResultObserver>) -> Arc<Subscription> {
        Arc::new(self.controller.on_access_result(move |result| {
            observer.on_access_result(AttemptRecord::from(result.clone()));
        }))
    }

    /// Runs the validator against a cached credential now, without the radio.
    ///
    /// # Errors
    ///
    /// Returns [`AccessKitError::CredentialNotFound`] for an unknown id.
    pub fn validate_access(
        &self,
        credential_id: String,
        access_point_id: String,
    ) -> Result<AttemptRecord, AccessKitError> {
        self.validate_access_at(&credential_id, &access_point_id, self.clock.now())
    }

    /// Downloads credentials, falling back to the cache on any failure.
    pub async fn fetch_credentials(&self) -> Vec<CredentialRecord> {
        self.store
            .fetch_credentials()
            .await
            .iter()
            .map(CredentialRecord::from)
            .collect()
    }

    /// Every cached credential.
    #[must_use]
    pub fn credentials(&self) -> Vec<CredentialRecord> {
        self.store
            .credentials()
            .iter()
            .map(CredentialRecord::from)
            .collect()
    }

    /// A cached credential by id.
    #[must_use]
    pub fn credential(&self, id: String) -> Option<CredentialRecord> {
        self.store.credential(&id).map(CredentialRecord::from)
    }

    /// Cached credentials of one building.
    #[must_use]
    pub fn credentials_for_building(&self, building_id: String) -> Vec<CredentialRecord> {
        self.store
            .credentials_for_building(&building_id)
            .iter()
            .map(CredentialRecord::from)
            .collect()
    }

    /// Active, unexpired credentials.
    #[must_use]
    pub fn active_credentials(&self) -> Vec<CredentialRecord> {
        self.store
            .active_credentials()
            .iter()
            .map(CredentialRecord::from)
            .collect()
    }

    /// Rotates one credential on the server.
    ///
    /// # Errors
    ///
    /// Returns the network or storage error.
    pub async fn refresh_credential(&self, id: String) -> Result<CredentialRecord, AccessKitError> {
        self.store
            .refresh_credential(&id)
            .await
            .map(CredentialRecord::from)
    }

    /// Whether an active credential expires within the refresh threshold.
    #[must_use]
    pub fn credentials_need_refresh(&self) -> bool {
        self.store.credentials_need_refresh()
    }

    /// Revokes everything on the server and wipes the local cache.
    ///
    /// # Errors
    ///
    /// Returns the server error; the local cache is wiped regardless.
    pub async fn emergency_revoke_all(&self) -> Result<(), AccessKitError> {
        self.store.emergency_revoke_all().await
    }

    /// The most recent access attempts, newest first.
    #[must_use]
    pub fn recent_access_attempts(&self, limit: u32) -> Vec<AccessLogRecord> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        self.store
            .recent_access_attempts(limit)
            .into_iter()
            .map(AccessLogRecord::from)
            .collect()
    }

    /// Uploads queued log entries. Returns how many were uploaded.
    pub async fn flush_access_log(&self) -> u32 {
        to_u32(self.store.flush_access_log().await)
    }

    /// Number of log entries waiting for upload.
    #[must_use]
    pub fn pending_log_uploads(&self) -> u32 {
        to_u32(self.store.pending_log_uploads())
    }

    /// Whether a platform wallet is available.
    #[must_use]
    pub fn is_wallet_available(&self) -> bool {
        self.wallet.is_available()
    }

    /// Adds a cached credential to the platform wallet.
    ///
    /// # Errors
    ///
    /// Returns [`AccessKitError::CredentialNotFound`] for an unknown id.
    pub fn add_to_wallet(&self, credential_id: String) -> Result<bool, AccessKitError> {
        let credential = self
            .store
            .credential(&credential_id)
            .ok_or(AccessKitError::CredentialNotFound { id: credential_id })?;
        Ok(self.wallet.add_to_wallet(&credential))
    }

    /// Removes a credential's pass from the platform wallet.
    #[must_use]
    pub fn remove_from_wallet(&self, credential_id: String) -> bool {
        self.wallet.remove_from_wallet(&credential_id)
    }

    /// Whether a credential's pass is installed.
    #[must_use]
    pub fn is_in_wallet(&self, credential_id: String) -> bool {
        self.wallet.is_in_wallet(&credential_id)
    }

    /// Invites a guest.
    ///
    /// # Errors
    ///
    /// Returns [`AccessKitError::InvalidInput`] for invalid parameters, or the
    /// network error.
    pub async fn create_invitation(
        &self,
        invitation: NewInvitationRecord,
    ) -> Result<InvitationRecord, AccessKitError> {
        let invitation = NewGuestInvitation::try_from(invitation)?;
        self.client
            .create_invitation(&invitation)
            .await
            .map(InvitationRecord::from)
    }

    /// Invitations issued for a building.
    ///
    /// # Errors
    ///
    /// Returns the network error.
    pub async fn list_invitations(
        &self,
        building_id: String,
    ) -> Result<Vec<InvitationRecord>, AccessKitError> {
        let invitations = self.client.list_invitations(&building_id).await?;
        Ok(invitations.into_iter().map(InvitationRecord::from).collect())
    }

    /// Cancels an invitation.
    ///
    /// # Errors
    ///
    /// Returns the network error.
    pub async fn cancel_invitation(&self, id: String) -> Result<(), AccessKitError> {
        self.client.cancel_invitation(&id).await
    }
}
