/// Default WebSocket endpoint for per-chat sessions
pub const DEFAULT_WS_URL: &str = "ws://localhost:8080/api/v1/ws/connect";

/// Default REST API base (chat list, history)
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";

/// Connection establishment timeout in seconds
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Capacity of the session command channel (outbound events, close)
pub const COMMAND_BUFFER: usize = 256;

/// Capacity of the session notification channel (inbound frames)
pub const NOTIFICATION_BUFFER: usize = 256;

/// Capacity of the store's broadcast update feed
pub const STORE_UPDATE_BUFFER: usize = 128;

/// Default page size for history fetches
pub const HISTORY_PAGE_SIZE: u32 = 50;
