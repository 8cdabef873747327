use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelError {
    /// Calibration record could not be read or committed. Fatal.
    #[error("calibration store error: {0}")]
    Storage(String),
    /// Byte store could not be brought up. Fatal.
    #[error("calibration store initialization error: {0}")]
    StoreInit(String),
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("configuration error: {0}")]
    Config(String),
    /// A fatal error already occurred; the monitor refuses to run further cycles.
    #[error("monitor halted after fatal error")]
    Halted,
    #[error("io error: {0}")]
    Io(String),
}

impl LevelError {
    /// Errors after which calibration integrity can no longer be assumed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LevelError::Storage(_) | LevelError::StoreInit(_) | LevelError::Halted
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing sensor source")]
    MissingSensors,
    #[error("missing byte store")]
    MissingStore,
    #[error("missing serial transport")]
    MissingTransport,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
