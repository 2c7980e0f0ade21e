//! # Domain Services
//!
//! Domain services encapsulate business rules that don't naturally belong
//! to a single entity. They are pure functions over domain entities.
//!
//! ## Services
//!
//! - **PricingService**: coupon evaluation, promotion prices, shipping and totals
//! - **SegmentationService**: customer segment classification

mod pricing_service;
mod segmentation_service;

pub use pricing_service::*;
pub use segmentation_service::*;
