//! Network client for stratus.
//!
//! This crate provides the network-fetch primitive the worker's strategies
//! compose with the cache store: a reqwest-backed HTTP client behind the
//! [`Fetch`] trait, plus URL canonicalization for consistent request keys.

pub mod fetch;

pub use fetch::{Fetch, FetchConfig, HttpFetcher, url::canonicalize};
