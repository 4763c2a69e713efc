//! Platform wallet integration: placing a credential in the device's pass store.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::error::AccessKitError;
use crate::types::Credential;

/// Organization shown on every pass.
pub const ORGANIZATION_NAME: &str = "Property Management";
/// Pass type registered with the wallet.
pub const PASS_TYPE_IDENTIFIER: &str = "pass.com.propertymanagement.access";

const PASS_FORMAT_VERSION: u8 = 1;

/// Errors raised by the native wallet module.
#[derive(Debug, Error, uniffi::Error)]
pub enum WalletError {
    /// The platform rejected the operation.
    #[error("wallet error: {0}")]
    Platform(String),

    /// Unexpected `UniFFI` callback error.
    #[error("unexpected uniffi callback error: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl From<uniffi::UnexpectedUniFFICallbackError> for WalletError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(error.reason)
    }
}

/// Native pass store.
#[uniffi::export(with_foreign)]
pub trait WalletModule: Send + Sync {
    /// Whether the wallet can accept passes on this device.
    ///
    /// # Errors
    ///
    /// Returns an error if availability cannot be determined.
    fn is_available(&self) -> Result<bool, WalletError>;

    /// Installs a pass described by `pass_json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the pass.
    fn add_pass(&self, pass_json: String) -> Result<bool, WalletError>;

    /// Removes the pass with serial number `pass_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform fails to remove it.
    fn remove_pass(&self, pass_id: String) -> Result<bool, WalletError>;

    /// Serial numbers of installed passes.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass list cannot be read.
    fn installed_passes(&self) -> Result<Vec<String>, WalletError>;
}

/// Wallet for platforms without a pass store. Never available.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedWallet;

impl WalletModule for UnsupportedWallet {
    fn is_available(&self) -> Result<bool, WalletError> {
        Ok(false)
    }

    fn add_pass(&self, _pass_json: String) -> Result<bool, WalletError> {
        Ok(false)
    }

    fn remove_pass(&self, _pass_id: String) -> Result<bool, WalletError> {
        Ok(false)
    }

    fn installed_passes(&self) -> Result<Vec<String>, WalletError> {
        Ok(Vec::new())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletPass<'a> {
    format_version: u8,
    pass_type_identifier: &'static str,
    serial_number: &'a str,
    organization_name: &'static str,
    description: String,
    logo_text: &'a str,
    expiration_date: String,
    generic: PassStructure,
    nfc: PassNfc<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PassStructure {
    primary_fields: Vec<PassField>,
    secondary_fields: Vec<PassField>,
    auxiliary_fields: Vec<PassField>,
}

#[derive(Serialize)]
struct PassField {
    key: &'static str,
    label: &'static str,
    value: String,
}

#[derive(Serialize)]
struct PassNfc<'a> {
    message: &'a str,
}

fn rfc3339(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Serializes `credential` into the pass description handed to the wallet.
///
/// # Errors
///
/// Returns a serialization error if encoding fails.
pub fn pass_json(credential: &Credential) -> Result<String, AccessKitError> {
    let pass = WalletPass {
        format_version: PASS_FORMAT_VERSION,
        pass_type_identifier: PASS_TYPE_IDENTIFIER,
        serial_number: &credential.id,
        organization_name: ORGANIZATION_NAME,
        description: format!("Access pass for {}", credential.building_name),
        logo_text: &credential.building_name,
        expiration_date: rfc3339(credential.valid_until),
        generic: PassStructure {
            primary_fields: vec![PassField {
                key: "building",
                label: "Building",
                value: credential.building_name.clone(),
            }],
            secondary_fields: vec![PassField {
                key: "accessLevel",
                label: "Access Level",
                value: credential.access_level.to_string(),
            }],
            auxiliary_fields: vec![
                PassField {
                    key: "validFrom",
                    label: "Valid From",
                    value: rfc3339(credential.valid_from),
                },
                PassField {
                    key: "validUntil",
                    label: "Valid Until",
                    value: rfc3339(credential.valid_until),
                },
            ],
        },
        nfc: PassNfc {
            message: &credential.encrypted_data,
        },
    };
    Ok(serde_json::to_string(&pass)?)
}

/// Pushes credentials to and from the platform wallet.
///
/// Every operation answers `false` instead of failing; platform errors are logged.
pub struct WalletBridge {
    module: Arc<dyn WalletModule>,
}

impl WalletBridge {
    /// Bridge over a native wallet module.
    #[must_use]
    pub fn new(module: Arc<dyn WalletModule>) -> Self {
        Self { module }
    }

    /// Bridge for platforms without a wallet.
    #[must_use]
    pub fn unsupported() -> Self {
        Self::new(Arc::new(UnsupportedWallet))
    }

    /// Whether the wallet can accept passes.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.module.is_available().unwrap_or_else(|e| {
            tracing::warn!("wallet availability check failed: {e}");
            false
        })
    }

    /// Installs `credential` as a pass.
    ///
    /// Nothing is sent to the wallet when it is unavailable or the credential has
    /// no payload.
    #[must_use]
    pub fn add_to_wallet(&self, credential: &Credential) -> bool {
        if !self.is_available() {
            tracing::debug!("wallet unavailable, pass not added");
            return false;
        }
        if !credential.has_payload() {
            tracing::warn!(credential_id = %credential.id, "credential has no payload for a pass");
            return false;
        }

        let json = match pass_json(credential) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("failed to build wallet pass: {e}");
                return false;
            }
        };
        self.module.add_pass(json).unwrap_or_else(|e| {
            tracing::warn!(credential_id = %credential.id, "wallet rejected pass: {e}");
            false
        })
    }

    /// Removes the pass for `credential_id`.
    #[must_use]
    pub fn remove_from_wallet(&self, credential_id: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        self.module
            .remove_pass(credential_id.to_string())
            .unwrap_or_else(|e| {
                tracing::warn!(credential_id, "failed to remove wallet pass: {e}");
                false
            })
    }

    /// Whether a pass for `credential_id` is installed.
    #[must_use]
    pub fn is_in_wallet(&self, credential_id: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        match self.module.installed_passes() {
            Ok(passes) => passes.iter().any(|pass| pass == credential_id),
            Err(e) => {
                tracing::warn!("failed to list wallet passes: {e}");
                false
            }
        }
    }
}
