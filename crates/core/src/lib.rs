//! Core types and shared functionality for stratus.
//!
//! This crate provides:
//! - Partitioned cache store with SQLite backend
//! - Request/response model shared by the fetch client and the worker
//! - Unified error types
//! - Layered application configuration

pub mod config;
pub mod error;
pub mod http;
pub mod store;

pub use config::AppConfig;
pub use error::Error;
pub use http::{InterceptedRequest, RequestDestination, RequestMode, ServedResponse};
pub use store::{CachedEntry, StoreDb};
