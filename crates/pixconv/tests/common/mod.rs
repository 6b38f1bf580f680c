//! Shared test utilities for pixconv integration tests.
//!
//! - `fixtures`: small images encoded in every decodable input format
//! - `harness`: an orchestrator wired to an in-memory store and a
//!   configurable background remover

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::*;
