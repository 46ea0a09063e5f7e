// [libs/infra/timeseries/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimeSeriesError {
    #[error("TS_IO_FAULT: failed to read source file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TS_PARSE_FAULT: malformed row in {path}: {detail}")]
    Parse { path: String, detail: String },
}
