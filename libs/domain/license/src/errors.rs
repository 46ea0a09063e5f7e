// [libs/domain/license/src/errors.rs]
//! Failure catalogue for the License Manager: `AuthDenied`, `Network`,
//! `LimitExceeded`, `StoreFailure`.

use thiserror::Error;
use wbe_infra_license_client::LicenseClientError;

#[derive(Error, Debug)]
pub enum LicenseManagerError {
    #[error("LICENSE_STORE_FAILURE: {0}")]
    StoreFailed(String),

    /// The client's network bucket, surfaced unchanged — callers map
    /// this to `{reachable:false}` / grace-path handling themselves.
    #[error("LICENSE_NETWORK: {0}")]
    Network(String),

    #[error("LICENSE_INVALID_KEY: {0}")]
    InvalidKey(String),

    /// Protected operation denied: state is revoked, expired, or
    /// hardware-mismatched. Carries a user-visible message with
    /// support contact.
    #[error("LICENSE_DENIED: {0}")]
    Denied(String),

    /// `request_transfer` quota exhausted before any network call.
    #[error("LICENSE_TRANSFER_LIMIT_EXCEEDED: contact {support_email} or {support_phone}")]
    LimitExceeded { support_email: String, support_phone: String },

    #[error("LICENSE_NOT_ACTIVATED")]
    NotActivated,
}

impl From<LicenseClientError> for LicenseManagerError {
    fn from(fault: LicenseClientError) -> Self {
        match fault {
            LicenseClientError::Network(msg) => LicenseManagerError::Network(msg),
            LicenseClientError::InvalidKey(msg) => LicenseManagerError::InvalidKey(msg),
        }
    }
}
