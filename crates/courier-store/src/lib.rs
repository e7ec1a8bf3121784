//! # courier-store
//!
//! The local chat store: the single in-memory source of truth for chats
//! and their message logs.  All mutation funnels through three entry
//! points (`set_chats`, `add_message`, `set_messages`); reads are always
//! consistent snapshots, and a broadcast feed notifies reactive readers
//! after each mutation.

pub mod store;

pub use store::{ChatStore, StoreUpdate};
