use thiserror::Error;

/// Errors produced by the networking layer.
///
/// Transport failures during a session never surface as errors; they
/// degrade the handle to [`ConnState::Failed`](crate::ConnState::Failed)
/// and sends become silent drops.
#[derive(Error, Debug)]
pub enum NetError {
    /// The configured WebSocket base URL could not be parsed.
    #[error("Invalid WebSocket URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
