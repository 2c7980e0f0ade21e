//! Integration Tests Entry Point
//!
//! Tests are organized by module:
//! - `api/` - HTTP tests against the assembled router
//! - `common/` - Shared test utilities

mod api;
mod common;
