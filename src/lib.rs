#![deny(missing_docs)]

//! Core library for the in-memory products catalog server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Mutation counters exposed at `/metrics`.
pub mod metrics;
/// Mutex-guarded product storage.
pub mod store;
