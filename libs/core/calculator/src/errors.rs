// [libs/core/calculator/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("CALC_NO_FACILITIES: no facilities are configured, nothing to balance")]
    NoFacilities,

    #[error("CALC_SAVE_FAULT: {0}")]
    SaveFailed(String),

    #[error("CALC_ROLLBACK_FAULT: save failed ({save_error}) and rollback also failed ({rollback_error})")]
    RollbackFailed {
        save_error: String,
        rollback_error: String,
    },
}
