//! Shared test utilities for dipgen integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs over a submission-package fixture
//! - Builders for package configs and finding-aid documents

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
