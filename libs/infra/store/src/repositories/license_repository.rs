// [libs/infra/store/src/repositories/license_repository.rs]
//! The license record, stored in `license_info`. A single row per
//! installation — `save` upserts on the unique `license_key`, `load`
//! reads back the most recently activated one.

use chrono::{DateTime, Utc};
use libsql::params;
use tracing::instrument;
use wbe_domain_models::license::{HardwareComponents, License, LicenseState, LicenseTier};

use crate::client::StoreClient;
use crate::errors::StoreError;

const SELECT_COLUMNS: &str = "license_id, license_key, tier, status, expiry_date, hw_motherboard, hw_cpu, hw_mac, \
    last_online_check, offline_grace_until, transfer_count, activated_at";

pub struct LicenseRepository {
    client: StoreClient,
}

impl LicenseRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Option<License>, StoreError> {
        let conn = self.client.get_connection()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM license_info ORDER BY license_id DESC LIMIT 1");
        let mut rows = conn.query(&sql, ()).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_license(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, license))]
    pub async fn save(&self, license: &License) -> Result<(), StoreError> {
        let conn = self.client.get_connection()?;
        conn.execute(
            "INSERT INTO license_info (
                license_key, tier, status, expiry_date, hw_motherboard, hw_cpu, hw_mac,
                last_online_check, offline_grace_until, transfer_count, activated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(license_key) DO UPDATE SET
                tier = excluded.tier,
                status = excluded.status,
                expiry_date = excluded.expiry_date,
                hw_motherboard = excluded.hw_motherboard,
                hw_cpu = excluded.hw_cpu,
                hw_mac = excluded.hw_mac,
                last_online_check = excluded.last_online_check,
                offline_grace_until = excluded.offline_grace_until,
                transfer_count = excluded.transfer_count",
            params![
                license.license_key.clone(),
                tier_tag(license.tier),
                state_tag(license.state),
                license.expiry_date.to_rfc3339(),
                license.hardware.motherboard_hash.clone(),
                license.hardware.cpu_hash.clone(),
                license.hardware.mac_hash.clone(),
                license.last_online_check.map(|t| t.to_rfc3339()),
                license.offline_grace_until.map(|t| t.to_rfc3339()),
                i64::from(license.transfer_count),
                license.activated_at.to_rfc3339(),
            ],
        )
        .await?;
        Ok(())
    }
}

fn tier_tag(tier: LicenseTier) -> &'static str {
    tier.as_str()
}

fn parse_tier(tag: &str) -> Result<LicenseTier, StoreError> {
    LicenseTier::from_str(tag).ok_or_else(|| StoreError::MappingError(format!("unknown tier '{tag}'")))
}

fn state_tag(state: LicenseState) -> &'static str {
    match state {
        LicenseState::Init => "init",
        LicenseState::Unactivated => "unactivated",
        LicenseState::Active => "active",
        LicenseState::GraceOffline => "grace_offline",
        LicenseState::Expired => "expired",
        LicenseState::Revoked => "revoked",
        LicenseState::HardwareMismatch => "hardware_mismatch",
    }
}

fn parse_state(tag: &str) -> Result<LicenseState, StoreError> {
    match tag {
        "init" => Ok(LicenseState::Init),
        "unactivated" => Ok(LicenseState::Unactivated),
        "active" => Ok(LicenseState::Active),
        "grace_offline" => Ok(LicenseState::GraceOffline),
        "expired" => Ok(LicenseState::Expired),
        "revoked" => Ok(LicenseState::Revoked),
        "hardware_mismatch" => Ok(LicenseState::HardwareMismatch),
        other => Err(StoreError::MappingError(format!("unknown license state '{other}'"))),
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw).map(|t| t.with_timezone(&Utc)).map_err(|_| StoreError::MappingError(format!("bad timestamp '{raw}'")))
}

fn map_license(row: &libsql::Row) -> Result<License, StoreError> {
    let tier_tag: String = row.get(2)?;
    let status_tag: String = row.get(3)?;
    let expiry_raw: String = row.get(4)?;
    let last_online_raw: Option<String> = row.get(8)?;
    let grace_raw: Option<String> = row.get(9)?;
    let activated_raw: String = row.get(11)?;

    Ok(License {
        license_id: Some(row.get::<i64>(0)?),
        license_key: row.get(1)?,
        tier: parse_tier(&tier_tag)?,
        state: parse_state(&status_tag)?,
        expiry_date: parse_timestamp(&expiry_raw)?,
        hardware: HardwareComponents {
            motherboard_hash: row.get(5)?,
            cpu_hash: row.get(6)?,
            mac_hash: row.get(7)?,
        },
        last_online_check: last_online_raw.map(|raw| parse_timestamp(&raw)).transpose()?,
        offline_grace_until: grace_raw.map(|raw| parse_timestamp(&raw)).transpose()?,
        transfer_count: row.get::<i64>(10)? as u32,
        activated_at: parse_timestamp(&activated_raw)?,
    })
}
