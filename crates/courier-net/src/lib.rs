// Per-chat WebSocket connection management.

pub mod retry;
pub mod session;
pub mod state;

mod error;

pub use error::NetError;
pub use retry::RetryPolicy;
pub use session::{
    session_url, ConnectConfig, Connection, ConnectionHandle, SessionCommand, SessionNotification,
};
pub use state::ConnState;
