//! # minidis
//!
//! A small Redis-like in-memory key-value server.
//!
//! minidis speaks RESP2 (and plain inline commands) over TCP and keeps
//! strings, lists and hashes in a single keyspace with per-key expiry. The
//! whole keyspace can be checkpointed to a checksummed binary snapshot and
//! loaded back on startup.

pub mod command;
pub mod config;
pub mod error;
pub mod glob;
pub mod persistence;
pub mod resp;
pub mod server;
pub mod store;
pub mod types;
