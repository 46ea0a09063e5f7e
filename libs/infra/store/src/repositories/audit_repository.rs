// [libs/infra/store/src/repositories/audit_repository.rs]
//! Append-only license audit trail (`license_audit_log`).

use chrono::{DateTime, Utc};
use libsql::params;
use tracing::instrument;
use wbe_domain_models::license::{AuditEventType, AuditLogEntry};

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct AuditRepository {
    client: StoreClient,
}

impl AuditRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, entry))]
    pub async fn append(&self, entry: &AuditLogEntry) -> Result<(), StoreError> {
        let conn = self.client.get_connection()?;
        conn.execute(
            "INSERT INTO license_audit_log (license_id, event_type, event_details, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![entry.license_id, event_type_tag(entry.event_type), entry.details.clone(), entry.created_at.to_rfc3339()],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>, StoreError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT audit_id, license_id, event_type, event_details, created_at FROM license_audit_log ORDER BY audit_id DESC LIMIT ?1",
                params![limit as i64],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_entry(&row)?);
        }
        Ok(out)
    }
}

fn event_type_tag(event_type: AuditEventType) -> &'static str {
    match event_type {
        AuditEventType::Activate => "activate",
        AuditEventType::Validate => "validate",
        AuditEventType::Transfer => "transfer",
        AuditEventType::RevokeObserved => "revoke_observed",
        AuditEventType::ExpiryWarning => "expiry_warning",
        AuditEventType::TransferLimit => "transfer_limit",
        AuditEventType::HardwareMismatch => "hardware_mismatch",
        AuditEventType::OfflineGrace => "offline_grace",
        AuditEventType::OnlineFailed => "online_failed",
        AuditEventType::NetworkError => "network_error",
    }
}

fn parse_event_type(tag: &str) -> Result<AuditEventType, StoreError> {
    match tag {
        "activate" => Ok(AuditEventType::Activate),
        "validate" => Ok(AuditEventType::Validate),
        "transfer" => Ok(AuditEventType::Transfer),
        "revoke_observed" => Ok(AuditEventType::RevokeObserved),
        "expiry_warning" => Ok(AuditEventType::ExpiryWarning),
        "transfer_limit" => Ok(AuditEventType::TransferLimit),
        "hardware_mismatch" => Ok(AuditEventType::HardwareMismatch),
        "offline_grace" => Ok(AuditEventType::OfflineGrace),
        "online_failed" => Ok(AuditEventType::OnlineFailed),
        "network_error" => Ok(AuditEventType::NetworkError),
        other => Err(StoreError::MappingError(format!("unknown audit event type '{other}'"))),
    }
}

fn map_entry(row: &libsql::Row) -> Result<AuditLogEntry, StoreError> {
    let event_type_tag: String = row.get(2)?;
    let created_raw: String = row.get(4)?;
    Ok(AuditLogEntry {
        audit_id: Some(row.get::<i64>(0)?),
        license_id: row.get(1)?,
        event_type: parse_event_type(&event_type_tag)?,
        details: row.get(3)?,
        created_at: DateTime::parse_from_rfc3339(&created_raw)
            .map_err(|_| StoreError::MappingError("bad created_at".into()))?
            .with_timezone(&Utc),
    })
}
