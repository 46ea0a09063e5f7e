// [libs/infra/store/src/repositories/source_repository.rs]
//! Water source CRUD and the active-sources-by-type lookup
//! `CalculatorDataSource::active_sources` needs.

use libsql::params;
use tracing::instrument;
use wbe_domain_models::source::{Source, SourceType};

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct SourceRepository {
    client: StoreClient,
}

impl SourceRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Source>, StoreError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn.query("SELECT source_code, source_type, active, area_code FROM sources", ()).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_source(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn active_by_type(&self, source_type: SourceType) -> Result<Vec<Source>, StoreError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT source_code, source_type, active, area_code FROM sources WHERE source_type = ?1 AND active = 1",
                params![source_type_tag(source_type)],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_source(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self, source))]
    pub async fn upsert(&self, source: &Source) -> Result<(), StoreError> {
        let conn = self.client.get_connection()?;
        conn.execute(
            "INSERT INTO sources (source_code, source_type, active, area_code)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(source_code) DO UPDATE SET
                source_type = excluded.source_type,
                active = excluded.active,
                area_code = excluded.area_code",
            params![source.source_code.clone(), source_type_tag(source.source_type), source.active as i64, source.area_code.clone()],
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

fn parse_source_type(tag: &str) -> Result<SourceType, StoreError> {
    match tag {
        "surface" => Ok(SourceType::Surface),
        "ground" => Ok(SourceType::Ground),
        "underground" => Ok(SourceType::Underground),
        "rainfall" => Ok(SourceType::Rainfall),
        "return" => Ok(SourceType::Return),
        other => Err(StoreError::MappingError(format!("unknown source_type '{other}'"))),
    }
}

fn map_source(row: &libsql::Row) -> Result<Source, StoreError> {
    let type_tag: String = row.get(1)?;
    Ok(Source {
        source_code: row.get(0)?,
        source_type: parse_source_type(&type_tag)?,
        active: row.get::<i64>(2)? != 0,
        area_code: row.get(3)?,
    })
}
