//! Booking Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::place::PlaceId;

fn default_status() -> String {
    "pending".to_string()
}

/// Booking entity (预订)
///
/// Created by a user action and never mutated client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(default)]
    pub id: Option<i64>,
    /// Present on admin listings; per-place listings may omit it
    #[serde(default)]
    pub place_id: Option<PlaceId>,
    pub name: String,
    pub people: u32,
    /// Requested time as typed by the user (e.g. "19:30")
    pub time: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create booking payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingCreate {
    pub name: String,
    pub people: u32,
    pub time: String,
}
