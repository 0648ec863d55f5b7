//! Cross-module test fixtures and HTTP-level tests.

pub mod support;

#[cfg(feature = "database-sqlite")]
mod app;
