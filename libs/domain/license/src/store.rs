// [libs/domain/license/src/store.rs]
//! The write/read port this crate needs from the Persistent Store.
//! The License Manager is generic over it the same way the calculator
//! is generic over `BalancePersistence`.

use wbe_domain_models::license::{AuditLogEntry, License};

use crate::errors::LicenseManagerError;

pub trait LicenseStore: Send + Sync {
    fn load(&self) -> Result<Option<License>, LicenseManagerError>;
    fn save(&self, license: &License) -> Result<(), LicenseManagerError>;
    fn append_audit(&self, entry: &AuditLogEntry) -> Result<(), LicenseManagerError>;
    fn recent_audit(&self, limit: usize) -> Result<Vec<AuditLogEntry>, LicenseManagerError>;
}
