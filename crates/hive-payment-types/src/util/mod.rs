//! Utility types.
//!
//! - [`payment_amount`] - Human-readable payment amounts and their conversion to wei

pub mod payment_amount;

pub use payment_amount::*;
