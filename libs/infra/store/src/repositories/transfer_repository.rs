// [libs/infra/store/src/repositories/transfer_repository.rs]
//! The pump transfer event ledger (`pump_transfer_events`)
//! and the atomic apply the `PumpTransferStore` port needs: decrement
//! source, increment destination, insert the event row, all inside one
//! transaction so a mid-way failure leaves no partial mutation.

use chrono::{NaiveDate, Utc};
use libsql::params;
use tracing::instrument;
use wbe_domain_models::transfer::Transfer;

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct TransferRepository {
    client: StoreClient,
}

impl TransferRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn event_exists(&self, date: NaiveDate, source_code: &str, dest_code: &str) -> Result<bool, StoreError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT 1 FROM pump_transfer_events WHERE calc_date = ?1 AND source_code = ?2 AND dest_code = ?3",
                params![date.to_string(), source_code.to_string(), dest_code.to_string()],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }

    #[instrument(skip(self))]
    pub async fn area_code_of(&self, facility_code: &str) -> Result<Option<String>, StoreError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn.query("SELECT area_code FROM facilities WHERE facility_code = ?1", params![facility_code.to_string()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, transfer))]
    pub async fn apply_transfer(&self, transfer: &Transfer, actor: &str) -> Result<(), StoreError> {
        let conn = self.client.get_connection()?;
        conn.execute("BEGIN", ()).await?;

        let result = async {
            conn.execute(
                "UPDATE facilities SET current_volume_m3 = current_volume_m3 - ?1 WHERE facility_code = ?2",
                params![transfer.volume_m3, transfer.source_code.clone()],
            )
            .await?;
            conn.execute(
                "UPDATE facilities SET current_volume_m3 = current_volume_m3 + ?1 WHERE facility_code = ?2",
                params![transfer.volume_m3, transfer.dest_code.clone()],
            )
            .await?;
            conn.execute(
                "INSERT INTO pump_transfer_events (calc_date, source_code, dest_code, volume_m3, applied_at, applied_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    transfer.calc_date.to_string(),
                    transfer.source_code.clone(),
                    transfer.dest_code.clone(),
                    transfer.volume_m3,
                    Utc::now().to_rfc3339(),
                    actor.to_string(),
                ],
            )
            .await?;
            Ok::<(), libsql::Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                conn.execute("COMMIT", ()).await?;
                Ok(())
            }
            Err(fault) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(StoreError::from(fault))
            }
        }
    }
}
