//! Shared test utilities for hirelens integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs over an in-memory database and a
//!   temporary blob store
//! - Scripted fakes for the evaluator, notifier and profile fetcher
//! - Builders for evaluation results and GitHub fixtures

pub mod builders;
pub mod fakes;
pub mod harness;

pub use builders::*;
pub use fakes::*;
pub use harness::{Collaborators, TestHarness};
