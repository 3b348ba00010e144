use thiserror::Error;

/// Failures at the host boundary. The simulation itself never fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("unknown flock color `{0}`")]
    UnknownColor(String),
    #[error("unknown draw mode `{0}`")]
    UnknownDrawMode(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
