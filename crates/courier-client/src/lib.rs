//! # courier-client
//!
//! The client-side synchronization core: the message reconciler that
//! merges server-pushed events into the local chat store, the outbound
//! dispatcher, and the chat session glue that ties one connection to one
//! reconciler with deterministic teardown.

pub mod config;
pub mod dispatcher;
pub mod history;
pub mod reconciler;
pub mod session;

mod error;

pub use config::ClientConfig;
pub use dispatcher::Dispatcher;
pub use error::ClientError;
pub use reconciler::Reconciler;
pub use session::{ChatClient, ChatSession};
