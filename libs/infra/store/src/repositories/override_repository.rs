// [libs/infra/store/src/repositories/override_repository.rs]
//! Manual overrides and monthly tailings moisture
//! (`manual_overrides`, `tailings_moisture_monthly`) — the first link
//! in the calculator's input resolution chain.

use chrono::{NaiveDate, Utc};
use libsql::params;
use tracing::instrument;
use wbe_domain_models::overrides::TailingsMoistureMonthly;

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct OverrideRepository {
    client: StoreClient,
}

impl OverrideRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// The override value for the calendar month containing `date`,
    /// matched by the first day of that month (overrides are written
    /// keyed to the month, per `ManualOverride::date`).
    #[instrument(skip(self))]
    pub async fn get(&self, date: NaiveDate, key: &str) -> Result<Option<f64>, StoreError> {
        let conn = self.client.get_connection()?;
        let month_prefix = date.format("%Y-%m").to_string();
        let mut rows = conn
            .query(
                "SELECT value FROM manual_overrides WHERE key = ?1 AND substr(date, 1, 7) = ?2",
                params![key.to_string(), month_prefix],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<f64>(0)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn upsert(&self, date: NaiveDate, key: &str, value: f64) -> Result<(), StoreError> {
        let conn = self.client.get_connection()?;
        conn.execute(
            "INSERT INTO manual_overrides (date, key, value, written_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(date, key) DO UPDATE SET value = excluded.value, written_at = excluded.written_at",
            params![date.to_string(), key.to_string(), value, Utc::now().to_rfc3339()],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn tailings_moisture_pct(&self, year: i32, month: u32) -> Result<Option<f64>, StoreError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT tailings_moisture_pct FROM tailings_moisture_monthly WHERE year = ?1 AND month = ?2",
                params![i64::from(year), i64::from(month)],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<f64>(0)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn upsert_tailings_moisture(&self, entry: &TailingsMoistureMonthly) -> Result<(), StoreError> {
        let conn = self.client.get_connection()?;
        conn.execute(
            "INSERT INTO tailings_moisture_monthly (year, month, tailings_moisture_pct)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(year, month) DO UPDATE SET tailings_moisture_pct = excluded.tailings_moisture_pct",
            params![i64::from(entry.year), i64::from(entry.month), entry.tailings_moisture_pct],
        )
        .await?;
        Ok(())
    }
}
