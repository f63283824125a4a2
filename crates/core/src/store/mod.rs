//! SQLite-backed partitioned cache store.
//!
//! This module provides the durable key-value store the strategies read and
//! write, using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named partitions (static, dynamic) created idempotently and deletable
//!   wholesale during activation cleanup
//! - Entries keyed by a normalized request digest, upserted last-writer-wins
//! - Optional `cached_at` annotations that drive freshness checks and
//!   age-based eviction
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::StoreDb;
pub use entries::CachedEntry;
pub use key::request_key;
