// [libs/infra/store/src/repositories/balance_repository.rs]
//! The `calculations` table — one row per `(calc_date,
//! calc_type)`, with the facility/transfer/warning/flag collections
//! folded to JSON columns since they are read back whole, never
//! queried by field.

use chrono::NaiveDate;
use libsql::params;
use tracing::instrument;
use wbe_domain_models::balance::{Balance, CalcType, CapacityWarning, DataQualityFlag, FacilityBalanceSnapshot};
use wbe_domain_models::transfer::Transfer;

use crate::client::StoreClient;
use crate::errors::StoreError;

const SELECT_COLUMNS: &str = "calc_id, calc_date, calc_type, computed_at, surface_water_m3, groundwater_m3, \
    underground_water_m3, rainfall_m3, ore_moisture_m3, aquifer_seepage_gain_m3, tsf_return_m3, total_inflows_m3, \
    fresh_inflows_m3, evaporation_total_m3, plant_consumption_net_m3, plant_consumption_gross_m3, auxiliary_uses_m3, \
    discharge_m3, tailings_retention_m3, total_outflows_m3, seepage_loss_total_m3, storage_change_m3, closure_error_m3, \
    closure_error_pct, has_low_fresh_inflows, facilities_json, pump_transfers_json, capacity_warnings_json, flags_json";

pub struct BalanceRepository {
    client: StoreClient,
}

impl BalanceRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn existing_balance(&self, calc_date: NaiveDate, calc_type: CalcType) -> Result<Option<Balance>, StoreError> {
        let conn = self.client.get_connection()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM calculations WHERE calc_date = ?1 AND calc_type = ?2");
        let mut rows = conn.query(&sql, params![calc_date.to_string(), calc_type_tag(calc_type)]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_balance(&row)?)),
            None => Ok(None),
        }
    }

    /// The closing volume a facility carried into `date`'s month, read
    /// from the most recent balance strictly before it.
    #[instrument(skip(self))]
    pub async fn previous_closing_volume(&self, facility_code: &str, date: NaiveDate) -> Result<Option<f64>, StoreError> {
        let conn = self.client.get_connection()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM calculations WHERE calc_date < ?1 ORDER BY calc_date DESC LIMIT 1");
        let mut rows = conn.query(&sql, params![date.to_string()]).await?;
        let Some(row) = rows.next().await? else { return Ok(None) };
        let balance = map_balance(&row)?;
        Ok(balance.facilities.iter().find(|f| f.facility_code == facility_code).map(|f| f.closing_volume_m3))
    }

    #[instrument(skip(self, snapshot))]
    pub async fn restore_facility_openings(&self, snapshot: &[FacilityBalanceSnapshot]) -> Result<(), StoreError> {
        let conn = self.client.get_connection()?;
        for entry in snapshot {
            conn.execute(
                "UPDATE facilities SET current_volume_m3 = ?1 WHERE facility_code = ?2",
                params![entry.opening_volume_m3, entry.facility_code.clone()],
            )
            .await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_balance(&self, calc_id: i64) -> Result<(), StoreError> {
        let conn = self.client.get_connection()?;
        conn.execute("DELETE FROM calculations WHERE calc_id = ?1", params![calc_id]).await?;
        Ok(())
    }

    #[instrument(skip(self, balance))]
    pub async fn insert_balance(&self, balance: &Balance) -> Result<i64, StoreError> {
        let conn = self.client.get_connection()?;
        let facilities_json = serde_json::to_string(&balance.facilities).map_err(|e| StoreError::MappingError(e.to_string()))?;
        let transfers_json = serde_json::to_string(&balance.pump_transfers).map_err(|e| StoreError::MappingError(e.to_string()))?;
        let warnings_json = serde_json::to_string(&balance.capacity_warnings).map_err(|e| StoreError::MappingError(e.to_string()))?;
        let flags_json = serde_json::to_string(&balance.flags).map_err(|e| StoreError::MappingError(e.to_string()))?;

        let mut rows = conn.query(
            "INSERT INTO calculations (
                calc_date, calc_type, computed_at, surface_water_m3, groundwater_m3, underground_water_m3,
                rainfall_m3, ore_moisture_m3, aquifer_seepage_gain_m3, tsf_return_m3, total_inflows_m3, fresh_inflows_m3,
                evaporation_total_m3, plant_consumption_net_m3, plant_consumption_gross_m3, auxiliary_uses_m3,
                discharge_m3, tailings_retention_m3, total_outflows_m3, seepage_loss_total_m3, storage_change_m3,
                closure_error_m3, closure_error_pct, has_low_fresh_inflows, facilities_json, pump_transfers_json,
                capacity_warnings_json, flags_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28)
            RETURNING calc_id",
            params![
                balance.calc_date.to_string(),
                calc_type_tag(balance.calc_type),
                balance.computed_at.to_rfc3339(),
                balance.surface_water_m3,
                balance.groundwater_m3,
                balance.underground_water_m3,
                balance.rainfall_m3,
                balance.ore_moisture_m3,
                balance.aquifer_seepage_gain_m3,
                balance.tsf_return_m3,
                balance.total_inflows_m3,
                balance.fresh_inflows_m3,
                balance.evaporation_total_m3,
                balance.plant_consumption_net_m3,
                balance.plant_consumption_gross_m3,
                balance.auxiliary_uses_m3,
                balance.discharge_m3,
                balance.tailings_retention_m3,
                balance.total_outflows_m3,
                balance.seepage_loss_total_m3,
                balance.storage_change_m3,
                balance.closure_error_m3,
                balance.closure_error_pct,
                balance.has_low_fresh_inflows as i64,
                facilities_json,
                transfers_json,
                warnings_json,
                flags_json,
            ],
        )
        .await?;
        let row = rows.next().await?.ok_or_else(|| StoreError::MappingError("insert did not return calc_id".into()))?;
        Ok(row.get::<i64>(0)?)
    }
}

fn calc_type_tag(calc_type: CalcType) -> &'static str {
    match calc_type {
        CalcType::Monthly => "monthly",
    }
}

fn parse_calc_type(tag: &str) -> Result<CalcType, StoreError> {
    match tag {
        "monthly" => Ok(CalcType::Monthly),
        other => Err(StoreError::MappingError(format!("unknown calc_type '{other}'"))),
    }
}

fn map_balance(row: &libsql::Row) -> Result<Balance, StoreError> {
    let calc_type_tag: String = row.get(2)?;
    let computed_at_raw: String = row.get(3)?;
    let facilities_json: String = row.get(25)?;
    let transfers_json: String = row.get(26)?;
    let warnings_json: String = row.get(27)?;
    let flags_json: String = row.get(28)?;

    let facilities: Vec<FacilityBalanceSnapshot> =
        serde_json::from_str(&facilities_json).map_err(|e| StoreError::MappingError(e.to_string()))?;
    let pump_transfers: Vec<Transfer> = serde_json::from_str(&transfers_json).map_err(|e| StoreError::MappingError(e.to_string()))?;
    let capacity_warnings: Vec<CapacityWarning> =
        serde_json::from_str(&warnings_json).map_err(|e| StoreError::MappingError(e.to_string()))?;
    let flags: std::collections::BTreeSet<DataQualityFlag> =
        serde_json::from_str(&flags_json).map_err(|e| StoreError::MappingError(e.to_string()))?;

    Ok(Balance {
        calc_id: Some(row.get::<i64>(0)?),
        calc_date: row.get::<String>(1)?.parse().map_err(|_| StoreError::MappingError("bad calc_date".into()))?,
        calc_type: parse_calc_type(&calc_type_tag)?,
        computed_at: chrono::DateTime::parse_from_rfc3339(&computed_at_raw)
            .map_err(|_| StoreError::MappingError("bad computed_at".into()))?
            .with_timezone(&chrono::Utc),
        surface_water_m3: row.get(4)?,
        groundwater_m3: row.get(5)?,
        underground_water_m3: row.get(6)?,
        rainfall_m3: row.get(7)?,
        ore_moisture_m3: row.get(8)?,
        aquifer_seepage_gain_m3: row.get(9)?,
        tsf_return_m3: row.get(10)?,
        total_inflows_m3: row.get(11)?,
        fresh_inflows_m3: row.get(12)?,
        evaporation_total_m3: row.get(13)?,
        plant_consumption_net_m3: row.get(14)?,
        plant_consumption_gross_m3: row.get(15)?,
        auxiliary_uses_m3: row.get(16)?,
        discharge_m3: row.get(17)?,
        tailings_retention_m3: row.get(18)?,
        total_outflows_m3: row.get(19)?,
        seepage_loss_total_m3: row.get(20)?,
        storage_change_m3: row.get(21)?,
        closure_error_m3: row.get(22)?,
        closure_error_pct: row.get::<Option<f64>>(23)?,
        has_low_fresh_inflows: row.get::<i64>(24)? != 0,
        facilities,
        pump_transfers,
        capacity_warnings,
        flags,
    })
}
