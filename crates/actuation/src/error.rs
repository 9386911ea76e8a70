//! Actuation error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by an actuator backend
#[derive(Debug, Error)]
pub enum ActuationError {
    /// Writing a sysfs attribute failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pin or PWM channel does not exist or cannot be exported
    #[error("Invalid pin {0}")]
    InvalidPin(String),

    /// Command issued before setup or after cleanup
    #[error("Actuator not initialized")]
    NotInitialized,
}

impl ActuationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ActuationError::Io {
            path: path.into(),
            source,
        }
    }
}
