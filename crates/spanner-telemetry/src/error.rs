use spanner_common::error::CommonError;
use thiserror::Error;

pub type TelemetryResult<T> = Result<T, TelemetryError>;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to create instrument {name}: {message}")]
    InstrumentCreationError { name: String, message: String },
    #[error("common error: {0}")]
    CommonError(#[from] CommonError),
}

impl TelemetryError {
    pub fn creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        TelemetryError::InstrumentCreationError {
            name: name.into(),
            message: message.into(),
        }
    }
}
