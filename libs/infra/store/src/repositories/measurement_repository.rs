// [libs/infra/store/src/repositories/measurement_repository.rs]
//! Appended measurement rows and the
//! month-scoped, active-source-filtered sum the Calculator resolves
//! surface/ground/underground/rainfall/return totals from.

use chrono::NaiveDate;
use libsql::params;
use tracing::instrument;
use wbe_domain_models::measurement::{Measurement, QualityFlag};
use wbe_domain_models::source::SourceType;

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct MeasurementRepository {
    client: StoreClient,
}

impl MeasurementRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Sum of every measurement row whose `source_code` names a
    /// currently active source of `source_type`, for the calendar
    /// month containing `date`. Unscoped rows (no `source_code`) are
    /// never included here — those feed the time-series repository,
    /// not the source ledger.
    #[instrument(skip(self))]
    pub async fn sum_for_month(&self, date: NaiveDate, source_type: SourceType) -> Result<f64, StoreError> {
        let conn = self.client.get_connection()?;
        let month_prefix = date.format("%Y-%m").to_string();
        let mut rows = conn
            .query(
                "SELECT COALESCE(SUM(m.value), 0.0)
                 FROM measurements m
                 JOIN sources s ON s.source_code = m.source_code
                 WHERE s.source_type = ?1 AND s.active = 1 AND substr(m.date, 1, 7) = ?2",
                params![source_type_tag(source_type), month_prefix],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<f64>(0)?),
            None => Ok(0.0),
        }
    }

    #[instrument(skip(self, measurement))]
    pub async fn insert(&self, measurement: &Measurement) -> Result<(), StoreError> {
        let conn = self.client.get_connection()?;
        conn.execute(
            "INSERT INTO measurements (date, field, source_code, facility_code, value, quality) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                measurement.date.to_string(),
                measurement.field.clone(),
                measurement.source_code.clone(),
                measurement.facility_code.clone(),
                measurement.value,
                quality_tag(measurement.quality),
            ],
        )
        .await?;
        Ok(())
    }
}

fn source_type_tag(source_type: SourceType) -> &'static str {
    match source_type {
        SourceType::Surface => "surface",
        SourceType::Ground => "ground",
        SourceType::Underground => "underground",
        SourceType::Rainfall => "rainfall",
        SourceType::Return => "return",
    }
}

fn quality_tag(quality: QualityFlag) -> &'static str {
    match quality {
        QualityFlag::Ok => "ok",
        QualityFlag::Suspect => "suspect",
        QualityFlag::Missing => "missing",
    }
}
