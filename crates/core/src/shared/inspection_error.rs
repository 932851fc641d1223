use std::path::PathBuf;

use thiserror::Error;

/// Why a video source could not be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceFailure {
    /// Missing, unreadable or undecodable file.
    #[error("cannot open: {0}")]
    Open(String),
    /// The container reports a frame rate below one frame per second.
    #[error("frame rate is zero, duration undefined")]
    ZeroFrameRate,
}

/// Fatal errors of an inspection run.
///
/// Per-composite provider failures and unparseable responses are not
/// here: they are recovered inside the run and reported in its outcome.
#[derive(Error, Debug)]
pub enum InspectionError {
    #[error("video source unavailable ({path}): {cause}")]
    SourceUnavailable { path: PathBuf, cause: SourceFailure },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to build composite: {0}")]
    Composite(String),
}

impl InspectionError {
    pub fn unavailable(path: impl Into<PathBuf>, cause: SourceFailure) -> Self {
        InspectionError::SourceUnavailable {
            path: path.into(),
            cause,
        }
    }
}
