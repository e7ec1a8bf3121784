use thiserror::Error;

/// Errors produced by the client layer.
///
/// Only the REST collaborator surfaces errors to callers; transport and
/// parse failures on the real-time path degrade silently per the
/// delivery contract (state `Failed`, dropped frame) and never appear
/// here.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
