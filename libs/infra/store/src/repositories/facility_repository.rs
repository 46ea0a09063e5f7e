// [libs/infra/store/src/repositories/facility_repository.rs]
//! Facility CRUD and the opening-volume restore path `BalancePersistence`
//! needs.

use libsql::params;
use tracing::instrument;
use wbe_domain_models::facility::Facility;

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct FacilityRepository {
    client: StoreClient,
}

impl FacilityRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Facility>, StoreError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn.query("SELECT facility_code, total_capacity_m3, surface_area_m2, is_lined, evap_active, pump_start_pct, pump_stop_pct, feeds_to, active, current_volume_m3, minimum_volume_m3, average_daily_consumption_m3, area_code FROM facilities", ()).await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_facility(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self, facility))]
    pub async fn upsert(&self, facility: &Facility) -> Result<(), StoreError> {
        let conn = self.client.get_connection()?;
        conn.execute(
            "INSERT INTO facilities (facility_code, total_capacity_m3, surface_area_m2, is_lined, evap_active, pump_start_pct, pump_stop_pct, feeds_to, active, current_volume_m3, minimum_volume_m3, average_daily_consumption_m3, area_code)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(facility_code) DO UPDATE SET
                total_capacity_m3 = excluded.total_capacity_m3,
                surface_area_m2 = excluded.surface_area_m2,
                is_lined = excluded.is_lined,
                evap_active = excluded.evap_active,
                pump_start_pct = excluded.pump_start_pct,
                pump_stop_pct = excluded.pump_stop_pct,
                feeds_to = excluded.feeds_to,
                active = excluded.active,
                current_volume_m3 = excluded.current_volume_m3,
                minimum_volume_m3 = excluded.minimum_volume_m3,
                average_daily_consumption_m3 = excluded.average_daily_consumption_m3,
                area_code = excluded.area_code",
            params![
                facility.facility_code.clone(),
                facility.total_capacity_m3,
                facility.surface_area_m2,
                facility.is_lined as i64,
                facility.evap_active as i64,
                facility.pump_start_pct,
                facility.pump_stop_pct,
                facility.feeds_to.join(","),
                facility.active as i64,
                facility.current_volume_m3,
                facility.minimum_volume_m3,
                facility.average_daily_consumption_m3,
                facility.area_code.clone(),
            ],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_current_volume(&self, facility_code: &str, volume_m3: f64) -> Result<(), StoreError> {
        let conn = self.client.get_connection()?;
        conn.execute("UPDATE facilities SET current_volume_m3 = ?1 WHERE facility_code = ?2", params![volume_m3, facility_code.to_string()]).await?;
        Ok(())
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
}

fn map_facility(row: &libsql::Row) -> Result<Facility, StoreError> {
    let feeds_to_raw: String = row.get(7)?;
    Ok(Facility {
        facility_code: row.get(0)?,
        total_capacity_m3: row.get(1)?,
        surface_area_m2: row.get(2)?,
        is_lined: row.get::<i64>(3)? != 0,
        evap_active: row.get::<i64>(4)? != 0,
        pump_start_pct: row.get(5)?,
        pump_stop_pct: row.get(6)?,
        feeds_to: if feeds_to_raw.is_empty() { Vec::new() } else { feeds_to_raw.split(',').map(String::from).collect() },
        active: row.get::<i64>(8)? != 0,
        current_volume_m3: row.get(9)?,
        minimum_volume_m3: row.get(10)?,
        average_daily_consumption_m3: row.get(11)?,
        area_code: row.get(12)?,
    })
}
