use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DataFetch,
    ShapeMismatch,
}

/// Failure to obtain or decode one of the external datasets. Never fatal to
/// the workflow: callers log it and keep the previous pool.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("request for {resource} failed: {message}")]
    Transport { resource: String, message: String },
    #[error("{resource} responded with status {status}")]
    Status { resource: String, status: u16 },
    #[error("failed to read {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {resource}: {source}")]
    Parse {
        resource: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("fetch of {resource} was interrupted: {message}")]
    Interrupted { resource: String, message: String },
    #[error("{resource} has an unexpected shape: {detail}")]
    ShapeMismatch { resource: String, detail: String },
}

impl DataSourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            _ => ErrorKind::DataFetch,
        }
    }

    pub fn resource(&self) -> &str {
        match self {
            Self::Transport { resource, .. }
            | Self::Status { resource, .. }
            | Self::Io { resource, .. }
            | Self::Parse { resource, .. }
            | Self::Interrupted { resource, .. }
            | Self::ShapeMismatch { resource, .. } => resource,
        }
    }
}
