//! Shared test utilities for the weather relay workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Observation payload fixtures (well-formed, partial, malformed)
//! - A scripted mock of the downstream ingestion API
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../../crates/test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, MockEndpoint};
//!
//! let mock = MockEndpoint::start([503, 200]).await;
//! ```

pub mod fixtures;
pub mod mock_endpoint;

pub use mock_endpoint::{unreachable_url, MockEndpoint, RecordedRequest, INGEST_PATH};
