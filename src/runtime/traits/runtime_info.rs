// ABOUTME: Daemon liveness and version queries.
// ABOUTME: Run once, right after a connection is opened.

use super::sealed::Sealed;
use async_trait::async_trait;

#[async_trait]
pub trait RuntimeInfo: Sealed + Send + Sync {
    /// Fails unless the daemon answers on its socket.
    async fn ping(&self) -> Result<(), RuntimeInfoError>;

    /// Version string the daemon reports, e.g. `27.3.1`.
    async fn version(&self) -> Result<String, RuntimeInfoError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeInfoError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("unexpected daemon response: {0}")]
    UnexpectedResponse(String),
}
