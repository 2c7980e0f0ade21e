//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **Slug**: URL-safe identifier derived from a display name
//! - **PageRequest / Page**: offset pagination shared by every list endpoint

mod pagination;
mod slug;

pub use pagination::*;
pub use slug::*;
