use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid distribution for component {component}: {reason}")]
    InvalidDistribution { component: usize, reason: String },
    #[error("e_step {e_step} does not point from e_start {e_start} towards e_end {e_end}")]
    InvalidScanDirection {
        e_start: f64,
        e_end: f64,
        e_step: f64,
    },
    #[error("invalid axis bounds: {0}")]
    InvalidBounds(String),
    #[error("array size mismatch for {array}: expected {expected}, got {actual}")]
    ArraySizeMismatch {
        array: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("potential axis of sweep row {row} differs from the first row")]
    FrequencyAxisMismatch { row: usize },
    #[error("kinetics engine failure: {0}")]
    NativeEngineFailure(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("simulation cancelled")]
    Cancelled,
    #[error("kinetics engine did not return within {timeout_ms} ms")]
    EngineTimeout { timeout_ms: u64 },
    #[error("failed to parse numeric data: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse experiment config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("failed to serialize experiment config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

impl From<libloading::Error> for SimError {
    fn from(value: libloading::Error) -> Self {
        SimError::NativeEngineFailure(value.to_string())
    }
}
