use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed wire frame: {0}")]
    Parse(#[from] serde_json::Error),
}
