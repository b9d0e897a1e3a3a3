//! Data models
//!
//! Wire shapes of the places backend, shared between the HTTP client and
//! the application core. All IDs are `i64`.

pub mod booking;
pub mod place;
pub mod rating;

// Re-exports
pub use booking::*;
pub use place::*;
pub use rating::*;
