// [libs/domain/license/src/manager.rs]
//! The License Manager: a process-wide singleton value (not a hidden
//! global — created at the composition
//! root and shared by reference/`Arc`) that makes a binary
//! authorisation decision at startup and continuously thereafter.

use std::sync::RwLock;

use chrono::Utc;
use tracing::{info, instrument, warn};
use wbe_domain_models::license::{AuditEventType, AuditLogEntry, HardwareComponents, License, LicenseState, LicenseTier};
use wbe_infra_license_client::LicenseValidationClient;

use crate::config::{FeatureValue, LicenseManagerConfig};
use crate::errors::LicenseManagerError;
use crate::policy;
use crate::store::LicenseStore;

pub struct UserInfo {
    pub licensee_name: Option<String>,
    pub licensee_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub state: LicenseState,
    pub tier: Option<LicenseTier>,
    pub expiry_date: Option<chrono::DateTime<Utc>>,
    pub days_remaining: Option<i64>,
    pub transfer_count: u32,
    pub hardware_match_score: Option<f64>,
}

pub struct LicenseManager<S: LicenseStore> {
    store: S,
    client: std::sync::Arc<LicenseValidationClient>,
    config: LicenseManagerConfig,
    cached: RwLock<Option<License>>,
}

impl<S: LicenseStore> LicenseManager<S> {
    pub fn new(store: S, client: LicenseValidationClient, config: LicenseManagerConfig) -> Self {
        Self { store, client: std::sync::Arc::new(client), config, cached: RwLock::new(None) }
    }

    /// Runs a blocking client call on tokio's blocking pool — the
    /// client wraps `reqwest::blocking::Client` because the ticker
    /// this manager backs is a separate cooperating task, not part of
    /// the synchronous calculation path.
    async fn call_blocking<F, T>(&self, f: F) -> Result<T, LicenseManagerError>
    where
        F: FnOnce(&LicenseValidationClient) -> Result<T, wbe_infra_license_client::LicenseClientError> + Send + 'static,
        T: Send + 'static,
    {
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || f(&client))
            .await
            .expect("license client blocking task panicked")
            .map_err(LicenseManagerError::from)
    }

    fn snapshot(&self) -> Option<License> {
        self.cached.read().expect("license cache lock poisoned").clone()
    }

    fn replace_cache(&self, license: License) {
        *self.cached.write().expect("license cache lock poisoned") = Some(license);
    }

    fn audit(&self, license_id: i64, event_type: AuditEventType, details: impl Into<String>) {
        let entry = AuditLogEntry { audit_id: None, license_id, event_type, details: details.into(), created_at: Utc::now() };
        if let Err(fault) = self.store.append_audit(&entry) {
            warn!("📋 [LICENSE_MANAGER]: failed to write audit row for {:?}: {}", event_type, fault);
        }
    }

    pub fn recent_audit_events(&self, limit: usize) -> Result<Vec<AuditLogEntry>, LicenseManagerError> {
        self.store.recent_audit(limit)
    }

    /// Ticker cadence for the currently cached tier, or the
    /// configured minimum if no license has been loaded yet.
    pub fn check_interval_hours(&self) -> i64 {
        match self.snapshot() {
            Some(license) => self.config.check_interval_hours(license.tier),
            None => self.config.min_tick_interval_hours,
        }
    }

    /// The configurable floor under `check_interval_hours` — the
    /// ticker's cadence never goes below this, however a tier's
    /// feature table is misconfigured.
    pub fn min_tick_interval_hours(&self) -> i64 {
        self.config.min_tick_interval_hours
    }

    /// `INIT → UNACTIVATED | ACTIVE | GRACE_OFFLINE | EXPIRED |
    /// REVOKED | HARDWARE_MISMATCH` on process start.
    #[instrument(skip(self, observed_hw))]
    pub async fn validate_startup(&self, observed_hw: &HardwareComponents) -> Result<LicenseState, LicenseManagerError> {
        let Some(license) = self.load()? else {
            return Ok(LicenseState::Unactivated);
        };

        if !policy::hardware_matches(&license.hardware, observed_hw, self.config.hardware_similarity_threshold) {
            let mut mismatched = license.clone();
            mismatched.state = LicenseState::HardwareMismatch;
            self.persist(&mismatched)?;
            self.audit(mismatched.license_id.unwrap_or_default(), AuditEventType::HardwareMismatch, "observed hardware below similarity threshold at startup");
            return Ok(LicenseState::HardwareMismatch);
        }

        let now = Utc::now();
        if policy::is_expired(now, license.expiry_date) && license.state != LicenseState::Expired {
            let mut expired = license.clone();
            expired.state = LicenseState::Expired;
            self.persist(&expired)?;
            return Ok(LicenseState::Expired);
        }

        let due = license.last_online_check.is_none()
            || now.signed_duration_since(license.last_online_check.unwrap()).num_hours() >= self.config.check_interval_hours(license.tier);
        if !due {
            return Ok(license.state);
        }

        self.run_online_check(license, observed_hw).await
    }

    /// Identical decision logic to `validate_startup`, invoked by the
    /// background ticker on every tick.
    #[instrument(skip(self, observed_hw))]
    pub async fn check(&self, observed_hw: &HardwareComponents) -> Result<LicenseState, LicenseManagerError> {
        let Some(license) = self.load()? else {
            return Ok(LicenseState::Unactivated);
        };
        self.run_online_check(license, observed_hw).await
    }

    async fn run_online_check(&self, license: License, observed_hw: &HardwareComponents) -> Result<LicenseState, LicenseManagerError> {
        let license_id = license.license_id.unwrap_or_default();
        let key = license.license_key.clone();
        let hw = observed_hw.clone();
        let outcome = self.call_blocking(move |client| client.validate(&key, &hw)).await;
        match outcome {
            Ok(decision) => {
                let mut updated = license.clone();
                updated.state = policy::remote_status_to_state(decision.status);
                updated.last_online_check = Some(Utc::now());
                updated.offline_grace_until = Some(policy::offline_grace_until(Utc::now(), self.config.offline_grace_days));
                if let Some(tier) = LicenseTier::from_str(&decision.license_tier) {
                    updated.tier = tier;
                }
                self.persist(&updated)?;

                match updated.state {
                    LicenseState::Revoked => self.audit(license_id, AuditEventType::RevokeObserved, "remote reported revoked"),
                    LicenseState::Active => {
                        let remaining = policy::days_remaining(Utc::now(), updated.expiry_date);
                        if remaining <= policy::EXPIRY_WARNING_THRESHOLD_DAYS {
                            warn!("⏳ [LICENSE_MANAGER]: license expires in {} day(s)", remaining);
                            self.audit(license_id, AuditEventType::ExpiryWarning, format!("{remaining} day(s) remaining"));
                        }
                        self.audit(license_id, AuditEventType::Validate, "online check ok");
                    }
                    _ => {}
                }
                Ok(updated.state)
            }
            Err(LicenseManagerError::Network(msg)) => {
                self.audit(license_id, AuditEventType::NetworkError, msg.clone());
                if policy::within_grace(Utc::now(), license.offline_grace_until) {
                    let mut grace = license.clone();
                    grace.state = LicenseState::GraceOffline;
                    self.persist(&grace)?;
                    self.audit(license_id, AuditEventType::OfflineGrace, "online check unreachable, within grace window");
                    Ok(LicenseState::GraceOffline)
                } else {
                    let mut expired = license.clone();
                    expired.state = LicenseState::Expired;
                    self.persist(&expired)?;
                    self.audit(license_id, AuditEventType::OnlineFailed, "grace window exceeded");
                    Ok(LicenseState::Expired)
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Lightweight pre-flight check before protected operations
    /// returns `true` iff the cached state is not revoked. Reads the
    /// in-memory snapshot only — no network call.
    pub fn check_instant_revocation(&self) -> bool {
        match self.snapshot() {
            Some(license) => license.state != LicenseState::Revoked,
            None => true,
        }
    }

    #[instrument(skip(self, observed_hw, user_info))]
    pub async fn activate(
        &self,
        license_key: &str,
        observed_hw: &HardwareComponents,
        user_info: UserInfo,
    ) -> Result<LicenseState, LicenseManagerError> {
        let key = license_key.to_string();
        let hw = observed_hw.clone();
        let name = user_info.licensee_name.clone();
        let email = user_info.licensee_email.clone();
        let decision = self
            .call_blocking(move |client| client.activate(&key, &hw, name.as_deref(), email.as_deref(), None))
            .await?;

        let tier = LicenseTier::from_str(&decision.license_tier).unwrap_or(LicenseTier::Trial);
        let now = Utc::now();
        let license = License {
            license_id: None,
            license_key: license_key.to_string(),
            tier,
            state: policy::remote_status_to_state(decision.status),
            expiry_date: decision.expiry_date.and_hms_opt(0, 0, 0).unwrap().and_utc(),
            hardware: observed_hw.clone(),
            last_online_check: Some(now),
            offline_grace_until: Some(policy::offline_grace_until(now, self.config.offline_grace_days)),
            transfer_count: 0,
            activated_at: now,
        };
        self.persist(&license)?;
        self.audit(license.license_id.unwrap_or_default(), AuditEventType::Activate, format!("activated at tier {}", tier.as_str()));
        info!("🔑 [LICENSE_MANAGER]: activation complete, state={:?}", license.state);
        Ok(license.state)
    }

    /// Enforces `max_transfers` locally before any network call.
    #[instrument(skip(self, new_hw))]
    pub async fn request_transfer(&self, new_hw: &HardwareComponents) -> Result<LicenseState, LicenseManagerError> {
        let Some(license) = self.load()? else {
            return Err(LicenseManagerError::NotActivated);
        };
        if license.transfer_count >= self.config.max_transfers {
            self.audit(license.license_id.unwrap_or_default(), AuditEventType::TransferLimit, "transfer quota exhausted");
            return Err(LicenseManagerError::LimitExceeded {
                support_email: self.config.support_email.clone(),
                support_phone: self.config.support_phone.clone(),
            });
        }

        let key = license.license_key.clone();
        let hw = new_hw.clone();
        let result = self.call_blocking(move |client| client.transfer(&key, &hw)).await?;
        let mut updated = license.clone();
        updated.state = policy::remote_status_to_state(result.status);
        updated.hardware = new_hw.clone();
        updated.transfer_count = result.transfer_count;
        self.persist(&updated)?;
        self.audit(updated.license_id.unwrap_or_default(), AuditEventType::Transfer, format!("transfer #{}", updated.transfer_count));
        Ok(updated.state)
    }

    pub fn has_feature(&self, name: &str) -> bool {
        let Some(license) = self.snapshot() else { return false };
        matches!(self.config.feature(license.tier, name), Some(FeatureValue::Bool(true)))
    }

    pub fn get_feature_limit(&self, name: &str) -> Option<f64> {
        let license = self.snapshot()?;
        match self.config.feature(license.tier, name)? {
            FeatureValue::Limit(value) => Some(value),
            FeatureValue::Bool(_) => None,
        }
    }

    /// Fire-and-forget: failures are logged, never surfaced as a
    /// licensing-state change.
    #[instrument(skip(self, stats))]
    pub async fn report_monthly_usage(&self, month: &str, stats: serde_json::Value) {
        let Some(license) = self.snapshot() else { return };
        let key = license.license_key.clone();
        let hw = license.hardware.clone();
        let month = month.to_string();
        let outcome = self.call_blocking(move |client| client.report_usage(&key, &hw, &month, stats)).await;
        if let Err(fault) = outcome {
            warn!("📉 [LICENSE_MANAGER]: usage report failed: {}", fault);
        }
    }

    /// `status_snapshot() -> {state, tier, expiry, days_remaining,
    /// transfer_count, hardware_match_score}`.
    /// `observed_hw` is optional because the snapshot is also useful
    /// to a caller that only wants the cached licensing state (e.g. a
    /// CLI `status` command run before a new fingerprint has been
    /// computed) without forcing every caller to observe hardware first.
    pub fn status_snapshot(&self, observed_hw: Option<&HardwareComponents>) -> StatusSnapshot {
        match self.snapshot() {
            Some(license) => StatusSnapshot {
                state: license.state,
                tier: Some(license.tier),
                expiry_date: Some(license.expiry_date),
                days_remaining: Some(policy::days_remaining(Utc::now(), license.expiry_date)),
                transfer_count: license.transfer_count,
                hardware_match_score: observed_hw.map(|hw| license.hardware.similarity(hw)),
            },
            None => StatusSnapshot {
                state: LicenseState::Init,
                tier: None,
                expiry_date: None,
                days_remaining: None,
                transfer_count: 0,
                hardware_match_score: None,
            },
        }
    }

    fn load(&self) -> Result<Option<License>, LicenseManagerError> {
        if let Some(cached) = self.snapshot() {
            return Ok(Some(cached));
        }
        let loaded = self.store.load()?;
        if let Some(license) = &loaded {
            self.replace_cache(license.clone());
        }
        Ok(loaded)
    }

    fn persist(&self, license: &License) -> Result<(), LicenseManagerError> {
        self.store.save(license)?;
        self.replace_cache(license.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration as StdDuration;

    struct StubStore {
        license: Mutex<Option<License>>,
        audit: Mutex<Vec<AuditLogEntry>>,
    }

    impl StubStore {
        fn with(license: Option<License>) -> Self {
            Self { license: Mutex::new(license), audit: Mutex::new(Vec::new()) }
        }
    }

    impl LicenseStore for StubStore {
        fn load(&self) -> Result<Option<License>, LicenseManagerError> {
            Ok(self.license.lock().unwrap().clone())
        }
        fn save(&self, license: &License) -> Result<(), LicenseManagerError> {
            *self.license.lock().unwrap() = Some(license.clone());
            Ok(())
        }
        fn append_audit(&self, entry: &AuditLogEntry) -> Result<(), LicenseManagerError> {
            self.audit.lock().unwrap().push(entry.clone());
            Ok(())
        }
        fn recent_audit(&self, limit: usize) -> Result<Vec<AuditLogEntry>, LicenseManagerError> {
            let log = self.audit.lock().unwrap();
            Ok(log.iter().rev().take(limit).cloned().collect())
        }
    }

    fn hw() -> HardwareComponents {
        HardwareComponents { motherboard_hash: "mb1".into(), cpu_hash: "cpu1".into(), mac_hash: "mac1".into() }
    }

    fn dummy_client() -> LicenseValidationClient {
        LicenseValidationClient::new("http://127.0.0.1:1/webhook".into(), "test-key".into(), StdDuration::from_millis(50))
    }

    fn active_license(transfer_count: u32) -> License {
        License {
            license_id: Some(1),
            license_key: "KEY-1".into(),
            tier: LicenseTier::Standard,
            state: LicenseState::Active,
            expiry_date: Utc::now() + chrono::Duration::days(30),
            hardware: hw(),
            last_online_check: Some(Utc::now()),
            offline_grace_until: Some(Utc::now() + chrono::Duration::days(7)),
            transfer_count,
            activated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn startup_with_no_license_is_unactivated() {
        let manager = LicenseManager::new(StubStore::with(None), dummy_client(), LicenseManagerConfig::default());
        let state = manager.validate_startup(&hw()).await.unwrap();
        assert_eq!(state, LicenseState::Unactivated);
    }

    #[tokio::test]
    async fn transfer_quota_exhausted_never_calls_network() {
        let mut config = LicenseManagerConfig::default();
        config.max_transfers = 3;
        let manager = LicenseManager::new(StubStore::with(Some(active_license(3))), dummy_client(), config);

        let other_hw = HardwareComponents { motherboard_hash: "mb2".into(), cpu_hash: "cpu2".into(), mac_hash: "mac2".into() };
        let outcome = manager.request_transfer(&other_hw).await;
        assert!(matches!(outcome, Err(LicenseManagerError::LimitExceeded { .. })));

        let snapshot = manager.status_snapshot(Some(&other_hw));
        assert_eq!(snapshot.transfer_count, 3);
        assert_eq!(snapshot.hardware_match_score, Some(0.0), "hw on file is still mb1/cpu1/mac1, fully mismatched vs other_hw");
    }

    #[tokio::test]
    async fn check_instant_revocation_reflects_cached_state() {
        let manager = LicenseManager::new(StubStore::with(Some(active_license(0))), dummy_client(), LicenseManagerConfig::default());
        assert!(manager.check_instant_revocation());

        let mut revoked = active_license(0);
        revoked.state = LicenseState::Revoked;
        manager.persist(&revoked).unwrap();
        assert!(!manager.check_instant_revocation());
    }

    #[test]
    fn feature_gate_reads_from_cached_tier() {
        let mut config = LicenseManagerConfig::default();
        let mut standard_features = std::collections::HashMap::new();
        standard_features.insert("advanced_reports".to_string(), FeatureValue::Bool(true));
        standard_features.insert("max_facilities".to_string(), FeatureValue::Limit(50.0));
        config.tier_features.insert(LicenseTier::Standard, standard_features);

        let manager = LicenseManager::new(StubStore::with(Some(active_license(0))), dummy_client(), config);
        manager.load().unwrap();

        assert!(manager.has_feature("advanced_reports"));
        assert!(!manager.has_feature("nonexistent"));
        assert_eq!(manager.get_feature_limit("max_facilities"), Some(50.0));
    }
}
