//! Error taxonomy of the synchronization engine.

use notiflow_shared::ApiError;
use thiserror::Error;

/// Errors produced inside the engine.
///
/// Only `Config` and `Storage` ever reach a caller; the rest are absorbed at
/// the coordinator boundary and turned into state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Missing, invalid or expired credential.
    #[error("not authenticated")]
    Unauthenticated,
    /// Push-channel handshake or mid-stream failure.
    #[error("transport failure: {0}")]
    Transport(String),
    /// A REST call failed.
    #[error("remote call failed: {0}")]
    RemoteCall(ApiError),
    /// A push frame could not be parsed.
    #[error("malformed push frame: {0}")]
    MalformedMessage(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("session storage error: {0}")]
    Storage(String),
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthenticated => SyncError::Unauthenticated,
            other => SyncError::RemoteCall(other),
        }
    }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
