// [libs/infra/license-client/src/errors.rs]
//! Failure catalogue for the License Validation Client. `Network`
//! is the terminal bucket every
//! transport-level problem collapses into — timeouts, connection
//! refusal, a malformed response missing a required field — because
//! the License Manager only has one recovery path for all of them:
//! the offline-grace check.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LicenseClientError {
    /// Unreachable, timed out, or returned a response missing a
    /// required field. Never mapped to `active` — the manager treats
    /// this as `{reachable: false}` and falls back to grace.
    #[error("LICENSE_CLIENT_NETWORK: {0}")]
    Network(String),

    /// A 4xx response carrying `unauthorized` — not retried.
    #[error("LICENSE_CLIENT_INVALID_KEY: {0}")]
    InvalidKey(String),
}
