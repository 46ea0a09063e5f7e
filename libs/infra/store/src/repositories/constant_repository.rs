// [libs/infra/store/src/repositories/constant_repository.rs]
//! Admin-managed constants table (`constants`) — the third
//! link in the calculator's override -> TS-repo -> constant chain.

use libsql::params;
use tracing::instrument;
use wbe_domain_models::constant::Constant;

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct ConstantRepository {
    client: StoreClient,
}

impl ConstantRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<Option<f64>, StoreError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn.query("SELECT numeric_value FROM constants WHERE key = ?1", params![key.to_string()]).await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<Option<f64>>(0)?),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Constant>, StoreError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn.query("SELECT key, numeric_value, text_value FROM constants", ()).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Constant {
                key: row.get(0)?,
                numeric_value: row.get::<Option<f64>>(1)?,
                text_value: row.get::<Option<String>>(2)?,
            });
        }
        Ok(out)
    }

    #[instrument(skip(self, constant))]
    pub async fn upsert(&self, constant: &Constant) -> Result<(), StoreError> {
        let conn = self.client.get_connection()?;
        conn.execute(
            "INSERT INTO constants (key, numeric_value, text_value)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET numeric_value = excluded.numeric_value, text_value = excluded.text_value",
            params![constant.key.clone(), constant.numeric_value, constant.text_value.clone()],
        )
        .await?;
        Ok(())
    }
}
