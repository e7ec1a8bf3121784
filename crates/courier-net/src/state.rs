//! Connection lifecycle states.
//!
//! `Connecting → Open → {Closing → Closed, Failed}`.  `Closed` and
//! `Failed` are terminal per handle; reopening a chat always produces a
//! fresh handle, never a revival of the old one.

/// State of one per-chat connection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// The session task is establishing the WebSocket (including any
    /// retries allowed by the configured policy).
    Connecting,
    /// The socket is live; sends are transmitted immediately.
    Open,
    /// A close was requested and the close frame is being written.
    Closing,
    /// The session ended cleanly (local close or server close frame).
    Closed,
    /// The session could not be established or the transport dropped.
    Failed,
}

impl ConnState {
    /// Whether the session can still transition to `Open`.
    pub fn is_live(&self) -> bool {
        matches!(self, ConnState::Connecting | ConnState::Open)
    }

    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnState::Closed | ConnState::Failed)
    }
}

impl std::fmt::Display for ConnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnState::Connecting => "connecting",
            ConnState::Open => "open",
            ConnState::Closing => "closing",
            ConnState::Closed => "closed",
            ConnState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}
