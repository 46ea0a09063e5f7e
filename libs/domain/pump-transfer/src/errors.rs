// [libs/domain/pump-transfer/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PumpTransferError {
    #[error("PUMP_UNKNOWN_FACILITY: {0}")]
    UnknownFacility(String),

    #[error("PUMP_STORE_FAULT: {0}")]
    StoreFailed(String),
}
