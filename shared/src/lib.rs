//! Shared types for SeatMap
//!
//! Wire models, request/response DTOs and geo helpers used by both the
//! HTTP client and the application core.

pub mod client;
pub mod error;
pub mod geo;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use geo::{Coordinate, TravelMode};
pub use models::{
    Booking, BookingCreate, CrowdStatus, Place, PlaceId, RatingCreate, RatingEntry, RatingSummary,
    SeatsUpdate,
};
