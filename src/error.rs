//! Crate-wide error type.
//!
//! Every fallible operation returns `AppError`. Each variant maps to a process
//! exit code so `main` can stay a thin wrapper.
//!
//! Numerical degeneracy inside the RTD statistics never shows up here: those
//! cases are reported as NaN entries in the statistics record.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    /// Invalid or contradictory configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing, unreadable or unusable input data.
    #[error("data error: {0}")]
    Data(String),

    /// The inversion failed for one spectrum.
    #[error("inversion of spectrum {spectrum} failed: {message}")]
    Engine { spectrum: usize, message: String },

    /// Writing results failed.
    #[error("output error: {0}")]
    Io(String),
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }

    pub fn engine(spectrum: usize, message: impl Into<String>) -> Self {
        Self::Engine {
            spectrum,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) => 2,
            AppError::Data(_) => 3,
            AppError::Engine { .. } => 4,
            AppError::Io(_) => 5,
        }
    }
}
