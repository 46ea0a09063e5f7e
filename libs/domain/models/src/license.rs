// [libs/domain/models/src/license.rs]
//! License record, hardware binding, and the audit trail the License
//! Manager writes on every state-changing event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LicenseTier {
    Trial,
    Standard,
    Premium,
}

impl LicenseTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseTier::Trial => "trial",
            LicenseTier::Standard => "standard",
            LicenseTier::Premium => "premium",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "trial" => Some(LicenseTier::Trial),
            "standard" => Some(LicenseTier::Standard),
            "premium" => Some(LicenseTier::Premium),
            _ => None,
        }
    }

    /// Default expiry window in days.
    pub fn default_expiry_days(&self) -> i64 {
        match self {
            LicenseTier::Trial => 30,
            LicenseTier::Standard => 365,
            LicenseTier::Premium => 730,
        }
    }

    /// Default online revalidation interval.
    pub fn default_check_interval_hours(&self) -> i64 {
        match self {
            LicenseTier::Trial => 1,
            LicenseTier::Standard => 24,
            LicenseTier::Premium => 168,
        }
    }
}

/// The License Manager's state machine states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LicenseState {
    Init,
    Unactivated,
    Active,
    GraceOffline,
    Expired,
    Revoked,
    HardwareMismatch,
}

/// The three positional hardware fingerprint components. Ordering is
/// wire-stable: slot 1 = motherboard, slot 2 = CPU, slot 3 = MAC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HardwareComponents {
    pub motherboard_hash: String,
    pub cpu_hash: String,
    pub mac_hash: String,
}

impl HardwareComponents {
    /// Weighted similarity score against another fingerprint
    /// `0.40*eq(mb) + 0.30*eq(cpu) + 0.30*eq(mac)`.
    /// Symmetric and `score(a,a) == 1.0`.
    pub fn similarity(&self, other: &HardwareComponents) -> f64 {
        let mb = if self.motherboard_hash == other.motherboard_hash { 1.0 } else { 0.0 };
        let cpu = if self.cpu_hash == other.cpu_hash { 1.0 } else { 0.0 };
        let mac = if self.mac_hash == other.mac_hash { 1.0 } else { 0.0 };
        0.40 * mb + 0.30 * cpu + 0.30 * mac
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct License {
    pub license_id: Option<i64>,
    pub license_key: String,
    pub tier: LicenseTier,
    pub state: LicenseState,
    pub expiry_date: DateTime<Utc>,
    pub hardware: HardwareComponents,
    pub last_online_check: Option<DateTime<Utc>>,
    pub offline_grace_until: Option<DateTime<Utc>>,
    pub transfer_count: u32,
    pub activated_at: DateTime<Utc>,
}

/// Closed enumeration over audit event kinds, replacing a
/// stringly-typed event log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditEventType {
    Activate,
    Validate,
    Transfer,
    RevokeObserved,
    ExpiryWarning,
    TransferLimit,
    HardwareMismatch,
    OfflineGrace,
    OnlineFailed,
    NetworkError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLogEntry {
    pub audit_id: Option<i64>,
    pub license_id: i64,
    pub event_type: AuditEventType,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hw(mb: &str, cpu: &str, mac: &str) -> HardwareComponents {
        HardwareComponents {
            motherboard_hash: mb.to_string(),
            cpu_hash: cpu.to_string(),
            mac_hash: mac.to_string(),
        }
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = hw("mb1", "cpu1", "mac1");
        let b = hw("mb1", "cpu2", "mac2");
        assert_eq!(a.similarity(&b), b.similarity(&a));
    }

    #[test]
    fn similarity_of_identical_is_one() {
        let a = hw("mb1", "cpu1", "mac1");
        assert_eq!(a.similarity(&a), 1.0);
    }

    #[test]
    fn similarity_weights_motherboard_highest() {
        let a = hw("mb1", "cpu1", "mac1");
        let only_mb_matches = hw("mb1", "cpu2", "mac2");
        let only_cpu_mac_match = hw("mb2", "cpu1", "mac1");
        assert!((a.similarity(&only_mb_matches) - 0.40).abs() < 1e-9);
        assert!((a.similarity(&only_cpu_mac_match) - 0.60).abs() < 1e-9);
    }
}
