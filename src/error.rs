use thiserror::Error;

use crate::domain::NodeId;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("node directory unavailable: {0}")]
    Directory(String),

    #[error("readiness probe for node {node} failed: {message}")]
    Poll { node: NodeId, message: String },

    #[error("node {node} not ready after {attempts} probes")]
    PollTimeout { node: NodeId, attempts: u32 },

    #[error("fetching results for node {node} failed: {message}")]
    Fetch { node: NodeId, message: String },

    #[error("no access token available")]
    AuthMissing,

    #[error("configuration error: {0}")]
    Config(String),
}

impl WatchError {
    /// Short name of the error bucket, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Directory(_) => "directory",
            Self::Poll { .. } => "poll",
            Self::PollTimeout { .. } => "poll_timeout",
            Self::Fetch { .. } => "fetch",
            Self::AuthMissing => "auth_missing",
            Self::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
