use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("forecast horizon {requested} is outside the allowed range {min}..={max}")]
    InvalidHorizon { requested: usize, min: usize, max: usize },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not open transaction file `{path}`: {source}")]
    Open { path: PathBuf, source: std::io::Error },
    #[error("could not decode transaction file `{path}`: {source}")]
    Decode { path: PathBuf, source: csv::Error },
    #[error("transaction file `{path}` is missing required column `{column}`")]
    MissingColumn { path: PathBuf, column: &'static str },
}

/// Failures that stop a whole analytics run. Per-item problems are outcomes, not errors.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AnalyticsError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_validation",
            Self::Ingest(_) => "ingest",
            Self::Domain(_) => "domain",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Ingest(_) => 3,
            Self::Domain(_) => 4,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Config(_) => "The configuration is invalid. Fix the named key and try again.",
            Self::Ingest(_) => "The transaction snapshot could not be read.",
            Self::Domain(_) => "The request could not be processed. Check inputs and try again.",
        }
    }
}
