// [libs/domain/license/src/policy.rs]
//! Pure decision rules factored out of the manager so they can be unit
//! tested without a network or store: hardware matching, offline
//! grace windows, and the remote-status → state mapping.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use wbe_domain_models::license::{HardwareComponents, LicenseState};
use wbe_infra_license_client::RemoteStatus;

/// `match = score ≥ threshold`.
pub fn hardware_matches(bound: &HardwareComponents, observed: &HardwareComponents, threshold: f64) -> bool {
    bound.similarity(observed) >= threshold
}

pub fn offline_grace_until(now: DateTime<Utc>, grace_days: i64) -> DateTime<Utc> {
    now + ChronoDuration::days(grace_days)
}

pub fn within_grace(now: DateTime<Utc>, offline_grace_until: Option<DateTime<Utc>>) -> bool {
    match offline_grace_until {
        Some(deadline) => now < deadline,
        None => false,
    }
}

pub fn is_expired(now: DateTime<Utc>, expiry_date: DateTime<Utc>) -> bool {
    now >= expiry_date
}

/// Days remaining until expiry; negative once past.
pub fn days_remaining(now: DateTime<Utc>, expiry_date: DateTime<Utc>) -> i64 {
    (expiry_date - now).num_days()
}

pub const EXPIRY_WARNING_THRESHOLD_DAYS: i64 = 7;

pub fn remote_status_to_state(status: RemoteStatus) -> LicenseState {
    match status {
        RemoteStatus::Active => LicenseState::Active,
        RemoteStatus::Revoked => LicenseState::Revoked,
        RemoteStatus::Expired => LicenseState::Expired,
        RemoteStatus::Pending => LicenseState::Unactivated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hw(mb: &str, cpu: &str, mac: &str) -> HardwareComponents {
        HardwareComponents { motherboard_hash: mb.into(), cpu_hash: cpu.into(), mac_hash: mac.into() }
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let bound = hw("mb1", "cpu1", "mac1");
        let observed = hw("mb1", "cpu2", "mac2");
        assert!(hardware_matches(&bound, &observed, 0.40));
        assert!(!hardware_matches(&bound, &observed, 0.41));
    }

    #[test]
    fn grace_window_boundaries() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let deadline = offline_grace_until(t0, 7);
        assert!(within_grace(t0 + ChronoDuration::days(5), Some(deadline)));
        assert!(!within_grace(t0 + ChronoDuration::days(8), Some(deadline)));
        assert!(!within_grace(t0, None));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert!(is_expired(now, now));
        assert!(!is_expired(now, now + ChronoDuration::seconds(1)));
    }
}
