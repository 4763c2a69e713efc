//! Offline-first credential cache and access log.
//!
//! The store answers every lookup from local state. Network calls only ever replace
//! that state wholesale (fetch), entry by entry (refresh) or clear it (revoke-all);
//! a failed fetch leaves the cache untouched so access decisions keep working
//! without connectivity.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use crate::access_log::{AccessLog, LogOutbox};
use crate::client::AccessApiClient;
use crate::clock::Clock;
use crate::config::AccessKitConfig;
use crate::error::AccessKitError;
use crate::storage::{self, BlobStore, StorageResult, ACCESS_LOG_KEY, CREDENTIALS_KEY};
use crate::types::{AccessLogEntry, Credential};

/// Local credential cache, access log and their synchronization with the server.
pub struct CredentialStore {
    client: Arc<AccessApiClient>,
    blob_store: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    refresh_threshold: chrono::Duration,
    credentials: RwLock<Vec<Credential>>,
    log: Mutex<AccessLog>,
    outbox: Mutex<LogOutbox>,
}

impl CredentialStore {
    /// Creates an empty store. Call [`Self::load`] to restore persisted state.
    #[must_use]
    pub fn new(
        config: &AccessKitConfig,
        client: Arc<AccessApiClient>,
        blob_store: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            blob_store,
            clock,
            refresh_threshold: config.refresh_threshold(),
            credentials: RwLock::new(Vec::new()),
            log: Mutex::new(AccessLog::new(config.max_log_entries as usize)),
            outbox: Mutex::new(LogOutbox::new(config.outbox_capacity as usize)),
        }
    }

    /// Sets the bearer token used for server calls.
    pub fn set_auth_token(&self, token: SecretString) {
        self.client.set_auth_token(token);
    }

    /// Restores the credential cache and access log from local storage.
    ///
    /// Unreadable blobs are logged and treated as empty; this never touches the network.
    pub fn load(&self) {
        let credentials: Vec<Credential> =
            match storage::load_json(self.blob_store.as_ref(), CREDENTIALS_KEY) {
                Ok(credentials) => credentials.unwrap_or_default(),
                Err(e) => {
                    tracing::warn!("discarding unreadable credential cache: {e}");
                    Vec::new()
                }
            };

        let entries: Vec<AccessLogEntry> =
            match storage::load_json(self.blob_store.as_ref(), ACCESS_LOG_KEY) {
                Ok(entries) => entries.unwrap_or_default(),
                Err(e) => {
                    tracing::warn!("discarding unreadable access log: {e}");
                    Vec::new()
                }
            };

        tracing::debug!(
            credentials = credentials.len(),
            log_entries = entries.len(),
            "loaded local access state"
        );

        *self.write_credentials() = credentials;
        let mut log = self.lock_log();
        let capacity = log.capacity();
        *log = AccessLog::from_entries(entries, capacity);
    }

    /// Downloads the authoritative credential list and replaces the cache with it.
    ///
    /// Never fails: on any network or parse error the current cache is returned.
    pub async fn fetch_credentials(&self) -> Vec<Credential> {
        match self.client.fetch_credentials().await {
            Ok(fresh) => {
                let mut credentials = self.write_credentials();
                *credentials = fresh;
                if let Err(e) = self.persist_credentials(&credentials) {
                    tracing::warn!("failed to persist fetched credentials: {e}");
                }
                tracing::info!(count = credentials.len(), "credential cache refreshed");
                credentials.clone()
            }
            Err(e) => {
                tracing::warn!("failed to fetch credentials, using cache: {e}");
                self.credentials()
            }
        }
    }

    /// Every cached credential.
    #[must_use]
    pub fn credentials(&self) -> Vec<Credential> {
        self.read_credentials().clone()
    }

    /// A cached credential by id.
    #[must_use]
    pub fn credential(&self, id: &str) -> Option<Credential> {
        self.read_credentials()
            .iter()
            .find(|credential| credential.id == id)
            .cloned()
    }

    /// Cached credentials for one building.
    #[must_use]
    pub fn credentials_for_building(&self, building_id: &str) -> Vec<Credential> {
        self.read_credentials()
            .iter()
            .filter(|credential| credential.building_id == building_id)
            .cloned()
            .collect()
    }

    /// Credentials that are `active` and not past `valid_until`.
    #[must_use]
    pub fn active_credentials(&self) -> Vec<Credential> {
        let now = self.now();
        self.read_credentials()
            .iter()
            .filter(|credential| credential.is_active_at(now))
            .cloned()
            .collect()
    }

    /// Rotates one credential's payload on the server and stores the result in place.
    ///
    /// # Errors
    ///
    /// Returns the network error if the refresh fails, or a storage error if the
    /// refreshed credential cannot be persisted.
    pub async fn refresh_credential(&self, id: &str) -> Result<Credential, AccessKitError> {
        let refreshed = self.client.refresh_credential(id).await?;

        let mut credentials = self.write_credentials();
        match credentials.iter_mut().find(|credential| credential.id == id) {
            Some(slot) => *slot = refreshed.clone(),
            None => credentials.push(refreshed.clone()),
        }
        self.persist_credentials(&credentials)?;
        tracing::info!(credential_id = id, "credential refreshed");
        Ok(refreshed)
    }

    /// Whether any active credential expires within the refresh threshold.
    #[must_use]
    pub fn credentials_need_refresh(&self) -> bool {
        let now = self.now();
        self.read_credentials()
            .iter()
            .any(|credential| credential.expires_within(now, self.refresh_threshold))
    }

    /// Records a successful use: bumps `usage_count` and sets `last_used`. Local only.
    ///
    /// # Errors
    ///
    /// Returns [`AccessKitError::CredentialNotFound`] for an unknown id, or a storage
    /// error if the cache cannot be persisted.
    pub fn update_credential_usage(&self, id: &str) -> Result<(), AccessKitError> {
        let now = self.now();
        let mut credentials = self.write_credentials();
        let credential = credentials
            .iter_mut()
            .find(|credential| credential.id == id)
            .ok_or_else(|| AccessKitError::CredentialNotFound { id: id.to_string() })?;
        credential.record_usage(now);
        self.persist_credentials(&credentials)?;
        Ok(())
    }

    /// Revokes every credential on the server and wipes the local cache.
    ///
    /// The local wipe happens before the request is sent, so no credential survives
    /// even if the server call fails or this future is dropped early. The request is
    /// sent even when the persisted copy cannot be removed.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the persisted copy could not be wiped, otherwise
    /// the server error, if any. The in-memory cache is empty either way.
    pub async fn emergency_revoke_all(&self) -> Result<(), AccessKitError> {
        let wiped = {
            let mut credentials = self.write_credentials();
            credentials.clear();
            match self.blob_store.delete(CREDENTIALS_KEY.to_string()) {
                Ok(()) => Ok(()),
                Err(e) => {
                    tracing::error!("failed to delete persisted credentials: {e}");
                    self.persist_credentials(&credentials)
                }
            }
        };
        if let Err(e) = &wiped {
            tracing::error!("persisted credentials survive the emergency revoke: {e}");
        }
        tracing::warn!("local credentials wiped by emergency revoke");

        let revoked = self.client.revoke_all_credentials().await;
        wiped?;
        revoked
    }

    /// Appends an attempt to the local log and queues it for upload.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the log cannot be persisted; the entry is then
    /// neither kept in the local log nor queued for upload.
    pub fn record_access_attempt(&self, entry: AccessLogEntry) -> StorageResult<()> {
        {
            let mut log = self.lock_log();
            let mut updated = log.clone();
            updated.push(entry.clone());
            storage::save_json(self.blob_store.as_ref(), ACCESS_LOG_KEY, &updated.to_vec())?;
            *log = updated;
        }

        if let Some(dropped) = lock(&self.outbox).enqueue(entry) {
            tracing::warn!(entry_id = %dropped.id, "log outbox full, dropping oldest entry");
        }
        Ok(())
    }

    /// The `limit` most recent attempts from the local log, newest first.
    #[must_use]
    pub fn recent_access_attempts(&self, limit: usize) -> Vec<AccessLogEntry> {
        self.lock_log().recent(limit)
    }

    /// Uploads queued log entries in order, stopping at the first failure.
    ///
    /// Entries that were not uploaded stay queued. Returns how many were uploaded.
    pub async fn flush_access_log(&self) -> usize {
        let pending = lock(&self.outbox).drain();
        let mut uploaded = 0;
        let mut remaining = pending.into_iter();

        while let Some(entry) = remaining.next() {
            if let Err(e) = self.client.submit_log_entry(&entry).await {
                tracing::debug!(entry_id = %entry.id, "access log upload failed: {e}");
                let mut unsent = vec![entry];
                unsent.extend(remaining);
                lock(&self.outbox).requeue(unsent);
                break;
            }
            uploaded += 1;
        }

        if uploaded > 0 {
            tracing::debug!(uploaded, "access log entries mirrored");
        }
        uploaded
    }

    /// Number of log entries waiting for upload.
    #[must_use]
    pub fn pending_log_uploads(&self) -> usize {
        lock(&self.outbox).len()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    fn persist_credentials(&self, credentials: &[Credential]) -> StorageResult<()> {
        storage::save_json(self.blob_store.as_ref(), CREDENTIALS_KEY, credentials)
    }

    fn read_credentials(&self) -> std::sync::RwLockReadGuard<'_, Vec<Credential>> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_credentials(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Credential>> {
        self.credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_log(&self) -> MutexGuard<'_, AccessLog> {
        lock(&self.log)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
