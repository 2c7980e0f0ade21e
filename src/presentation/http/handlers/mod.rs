//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints. Each handler builds the service
//! it needs from `AppState`, validates the body and maps domain results into
//! response DTOs.

pub mod account;
pub mod auth;
pub mod catalog;
pub mod content;
pub mod customers;
pub mod finance;
pub mod health;
pub mod inventory;
pub mod marketing;
pub mod orders;
pub mod store;
