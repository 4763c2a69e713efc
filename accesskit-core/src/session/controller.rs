use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use super::listeners::{Listeners, Subscription};
use super::state::SessionState;
use crate::clock::Clock;
use crate::credential_store::CredentialStore;
use crate::error::AccessKitError;
use crate::hardware::{
    HardwareError, Haptics, NfcHardware, DENIED_PATTERN, GRANTED_PATTERN, SESSION_START_PATTERN,
};
use crate::types::{AccessAttemptResult, AccessDenialReason, AccessLogEntry, Credential};
use crate::validator::validate_access;

const TAP_IN_PROGRESS_MESSAGE: &str = "Another tap is already being processed";

/// A reader detected by the radio, reported before the tap is evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapEvent {
    /// Reader that was tapped.
    pub access_point_id: String,
    /// Reader name as reported by the radio.
    pub access_point_name: String,
    /// Credential armed for the session.
    pub credential_id: String,
    /// When the tap was received.
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct SessionFields {
    state: SessionState,
    active_credential_id: Option<String>,
}

/// Drives the physical tap lifecycle on top of the native radio.
///
/// Start, stop and tap handling are serialized: a tap that arrives while another
/// operation is running is rejected instead of queued.
pub struct SessionController {
    store: Arc<CredentialStore>,
    hardware: Option<Arc<dyn NfcHardware>>,
    haptics: Arc<dyn Haptics>,
    clock: Arc<dyn Clock>,
    fields: Mutex<SessionFields>,
    operation: tokio::sync::Mutex<()>,
    state_listeners: Listeners<SessionState>,
    tap_listeners: Listeners<TapEvent>,
    result_listeners: Listeners<AccessAttemptResult>,
}

impl SessionController {
    /// Creates a controller in the `unsupported` state. `hardware` is `None` on
    /// devices without a radio module.
    #[must_use]
    pub fn new(
        store: Arc<CredentialStore>,
        hardware: Option<Arc<dyn NfcHardware>>,
        haptics: Arc<dyn Haptics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            hardware,
            haptics,
            clock,
            fields: Mutex::new(SessionFields::default()),
            operation: tokio::sync::Mutex::new(()),
            state_listeners: Listeners::new(),
            tap_listeners: Listeners::new(),
            result_listeners: Listeners::new(),
        }
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.fields().state
    }

    /// Credential armed for the current session, if any.
    #[must_use]
    pub fn active_credential_id(&self) -> Option<String> {
        self.fields().active_credential_id.clone()
    }

    /// The credential store backing this controller.
    #[must_use]
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Configures authentication, restores local state and probes the radio.
    ///
    /// Never touches the network. Returns the resulting state.
    pub async fn initialize(&self, auth_token: SecretString) -> SessionState {
        let _operation = self.operation.lock().await;

        self.store.set_auth_token(auth_token);
        self.store.load();

        if self.state().is_session_active() {
            self.disarm();
        }
        self.fields().active_credential_id = None;

        let state = self.probe();
        self.set_state(state);
        tracing::info!(%state, "access session controller initialized");
        state
    }

    /// Probes the radio again, e.g. after the user switched NFC on.
    ///
    /// # Errors
    ///
    /// Returns [`AccessKitError::NotReady`] while a session is armed.
    pub async fn refresh_hardware_state(&self) -> Result<SessionState, AccessKitError> {
        let _operation = self.operation.lock().await;

        let current = self.state();
        if current.is_session_active() {
            return Err(AccessKitError::NotReady { state: current });
        }

        let state = self.probe();
        self.set_state(state);
        Ok(state)
    }

    /// Arms the radio for one credential.
    ///
    /// Without `credential_id` the single active credential is used.
    ///
    /// # Errors
    ///
    /// - [`AccessKitError::NotReady`] unless the controller is `ready`.
    /// - [`AccessKitError::CredentialNotFound`] for an unknown id.
    /// - [`AccessKitError::AmbiguousCredential`] when there is not exactly one
    ///   active credential to choose.
    /// - [`AccessKitError::Hardware`] when the radio cannot be armed; the controller
    ///   moves to `error`.
    pub async fn start_access_session(
        &self,
        credential_id: Option<&str>,
    ) -> Result<Credential, AccessKitError> {
        let _operation = self.operation.lock().await;

        let state = self.state();
        if state != SessionState::Ready {
            return Err(AccessKitError::NotReady { state });
        }

        let credential = self.resolve_credential(credential_id)?;

        let Some(hardware) = &self.hardware else {
            return Err(HardwareError::Unavailable("no nfc module".to_string()).into());
        };
        if let Err(e) = hardware.start_session() {
            tracing::error!("failed to arm nfc radio: {e}");
            self.set_state(SessionState::Error);
            return Err(e.into());
        }

        self.fields().active_credential_id = Some(credential.id.clone());
        self.set_state(SessionState::Reading);
        self.haptics.vibrate(SESSION_START_PATTERN.to_vec());
        tracing::info!(credential_id = %credential.id, "access session started");
        Ok(credential)
    }

    /// Evaluates a tap on `access_point_id` reported by the radio.
    ///
    /// Never fails: every problem is reported as a denial. A completed tap is
    /// logged, updates usage on a grant, notifies subscribers and ends the session.
    pub async fn handle_tap(
        &self,
        access_point_id: &str,
        access_point_name: &str,
    ) -> AccessAttemptResult {
        let now = self.clock.now();
        let timestamp = now.with_timezone(&Utc);

        let Ok(_operation) = self.operation.try_lock() else {
            tracing::warn!(access_point_id, "tap rejected, another operation is running");
            return AccessAttemptResult::denied_with_message(
                access_point_id,
                access_point_name,
                AccessDenialReason::HardwareError,
                TAP_IN_PROGRESS_MESSAGE,
                timestamp,
            );
        };

        let credential_id = {
            let fields = self.fields();
            if fields.state.is_session_active() {
                fields.active_credential_id.clone()
            } else {
                None
            }
        };
        let Some(credential_id) = credential_id else {
            tracing::debug!(access_point_id, "tap without an armed session");
            return AccessAttemptResult::denied(
                access_point_id,
                access_point_name,
                AccessDenialReason::InvalidCredential,
                timestamp,
            );
        };

        self.tap_listeners.emit(&TapEvent {
            access_point_id: access_point_id.to_string(),
            access_point_name: access_point_name.to_string(),
            credential_id: credential_id.clone(),
            timestamp,
        });

        let result = match self.store.credential(&credential_id) {
            Some(credential) => {
                let verdict = validate_access(&credential, access_point_id, now);
                let result = if verdict.granted {
                    self.set_state(SessionState::Transmitting);
                    self.transmit(&credential, verdict)
                } else {
                    verdict
                };
                self.record(&credential, &result);
                result
            }
            None => {
                tracing::warn!(%credential_id, "armed credential is no longer cached");
                AccessAttemptResult::denied(
                    access_point_id,
                    access_point_name,
                    AccessDenialReason::InvalidCredential,
                    timestamp,
                )
            }
        };

        let pattern = if result.granted {
            GRANTED_PATTERN
        } else {
            DENIED_PATTERN
        };
        self.haptics.vibrate(pattern.to_vec());

        tracing::info!(
            access_point_id,
            granted = result.granted,
            denial_reason = ?result.denial_reason,
            "tap processed"
        );
        self.result_listeners.emit(&result);

        self.fields().active_credential_id = None;
        self.set_state(SessionState::Ready);
        self.flush_in_background();

        result
    }

    /// Disarms the radio and returns to `ready`. Waits for an in-flight tap.
    ///
    /// Outside of a session only the armed credential is cleared.
    pub async fn stop_access_session(&self) {
        let _operation = self.operation.lock().await;

        self.fields().active_credential_id = None;
        if self.state().is_session_active() {
            self.disarm();
            self.set_state(SessionState::Ready);
            tracing::info!("access session stopped");
        }
    }

    /// Registers a state change listener.
    pub fn on_state_change(
        &self,
        listener: impl Fn(&SessionState) + Send + Sync + 'static,
    ) -> Subscription {
        self.state_listeners.subscribe(listener)
    }

    /// Registers a listener called when a reader is detected.
    pub fn on_tap(&self, listener: impl Fn(&TapEvent) + Send + Sync + 'static) -> Subscription {
        self.tap_listeners.subscribe(listener)
    }

    /// Registers a listener called with every tap verdict.
    pub fn on_access_result(
        &self,
        listener: impl Fn(&AccessAttemptResult) + Send + Sync + 'static,
    ) -> Subscription {
        self.result_listeners.subscribe(listener)
    }

    fn resolve_credential(&self, credential_id: Option<&str>) -> Result<Credential, AccessKitError> {
        if let Some(id) = credential_id {
            return self
                .store
                .credential(id)
                .ok_or_else(|| AccessKitError::CredentialNotFound { id: id.to_string() });
        }

        let mut active = self.store.active_credentials();
        if active.len() == 1 {
            if let Some(credential) = active.pop() {
                return Ok(credential);
            }
        }
        Err(AccessKitError::AmbiguousCredential {
            candidates: active.len(),
        })
    }

    fn probe(&self) -> SessionState {
        let Some(hardware) = &self.hardware else {
            return SessionState::Unsupported;
        };

        match hardware.is_supported() {
            Ok(false) => return SessionState::Unsupported,
            Ok(true) => {}
            Err(e) => {
                tracing::error!("nfc capability probe failed: {e}");
                return SessionState::Error;
            }
        }

        match hardware.is_enabled() {
            Ok(true) => SessionState::Ready,
            Ok(false) => SessionState::Disabled,
            Err(e) => {
                tracing::error!("nfc state probe failed: {e}");
                SessionState::Error
            }
        }
    }

    fn transmit(&self, credential: &Credential, verdict: AccessAttemptResult) -> AccessAttemptResult {
        if !credential.has_payload() {
            tracing::warn!(credential_id = %credential.id, "credential has no payload to transmit");
            return verdict.into_hardware_failure();
        }
        let Some(hardware) = &self.hardware else {
            return verdict.into_hardware_failure();
        };

        match hardware.transmit_credential(credential.encrypted_data.clone()) {
            Ok(true) => verdict,
            Ok(false) => {
                tracing::warn!(credential_id = %credential.id, "reader did not accept the credential");
                verdict.into_hardware_failure()
            }
            Err(e) => {
                tracing::warn!(credential_id = %credential.id, "credential transmission failed: {e}");
                verdict.into_hardware_failure()
            }
        }
    }

    fn record(&self, credential: &Credential, result: &AccessAttemptResult) {
        let entry = AccessLogEntry::new(credential, result.clone());
        if let Err(e) = self.store.record_access_attempt(entry) {
            tracing::error!("failed to record access attempt: {e}");
        }

        if result.granted {
            if let Err(e) = self.store.update_credential_usage(&credential.id) {
                tracing::error!("failed to update credential usage: {e}");
            }
        }
    }

    fn disarm(&self) {
        if let Some(hardware) = &self.hardware {
            if let Err(e) = hardware.stop_session() {
                tracing::warn!("failed to disarm nfc radio: {e}");
            }
        }
    }

    fn flush_in_background(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                handle.spawn(async move {
                    store.flush_access_log().await;
                });
            }
            Err(_) => tracing::debug!("no async runtime, access log upload deferred"),
        }
    }

    fn set_state(&self, state: SessionState) {
        let previous = std::mem::replace(&mut self.fields().state, state);
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "session state changed");
            self.state_listeners.emit(&state);
        }
    }

    fn fields(&self) -> MutexGuard<'_, SessionFields> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
