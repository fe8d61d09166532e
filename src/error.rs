//! Error taxonomy for the prediction pipeline.
//!
//! - [`ArtifactLoadError`]: startup-fatal, artifacts missing or corrupt.
//! - [`InvalidInputError`]: a clinical field outside its declared domain.
//! - [`PredictionError`]: scaler/classifier failure or shape mismatch.
//!
//! Startup glue (`main`, config) wraps these in `anyhow` with context.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Failure to bring the classifier or scaler into memory.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("artifact not found: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("artifact unreadable: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact malformed: {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact has unexpected shape: {}: {reason}", .path.display())]
    Shape { path: PathBuf, reason: String },
}

/// One out-of-domain field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violated field of a rejected `ClinicalInput`.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidInputError {
    pub violations: Vec<FieldViolation>,
}

impl InvalidInputError {
    /// Whether `field` is among the violations.
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for InvalidInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid clinical input: ")?;
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for InvalidInputError {}

/// Stage of the decision pipeline that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transform,
    Classify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform => f.write_str("scaler transform"),
            Self::Classify => f.write_str("classifier predict"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("{stage}: expected {expected} columns, got {actual}")]
    ShapeMismatch {
        stage: Stage,
        expected: usize,
        actual: usize,
    },

    #[error("{stage}: produced a non-finite value")]
    NonFinite { stage: Stage },

    #[error("{stage}: {message}")]
    Failed { stage: Stage, message: String },
}

/// Either half of the request pipeline failing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}
