//! Error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading input and configuration
#[derive(Debug, Error)]
pub enum IslandsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode PBF: {0}")]
    Pbf(#[from] osmpbf::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid bounds '{0}', expected min_lat,min_lon,max_lat,max_lon")]
    InvalidBounds(String),

    #[error(transparent)]
    Common(#[from] butterfly_common::Error),
}

/// Failure of the analysis of a single transport mode
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("unknown transport mode '{0}'")]
    UnknownMode(String),

    #[error("mode '{mode}' belongs to family '{family}', which has no candidate edges")]
    NoCandidatePool { mode: String, family: String },
}
