// [libs/infra/license-client/src/lib.rs]
//! The License Validation Client: a stateless HTTP
//! adapter to the external licence registry webhook. The License
//! Manager is the only consumer; this crate knows nothing about
//! process state, only the wire protocol.

pub mod client;
pub mod errors;

pub use client::{EventType, LicenseDecision, LicenseValidationClient, RemoteStatus, TransferResult};
pub use errors::LicenseClientError;
