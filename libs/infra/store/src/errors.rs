// [libs/infra/store/src/errors.rs]
//! Error catalog for the Persistent Store.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    ConnectionError(String),

    #[error("store configuration invalid: {0}")]
    ConfigurationError(String),

    #[error("query rejected: {0}")]
    QueryError(#[from] libsql::Error),

    #[error("row mapping failed: {0}")]
    MappingError(String),

    #[error("facility '{0}' not found")]
    FacilityNotFound(String),

    #[error("balance for {0} ({1}) not found")]
    BalanceNotFound(chrono::NaiveDate, &'static str),

    #[error("transaction collapsed: {0}")]
    TransactionError(String),
}

impl From<StoreError> for String {
    fn from(value: StoreError) -> Self {
        value.to_string()
    }
}
