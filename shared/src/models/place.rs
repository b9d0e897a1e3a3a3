//! Place Model

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

pub type PlaceId = i64;

/// Place entity (场所：咖啡馆、游戏俱乐部等)
///
/// Identity is stable across refetches; `free_seats` only changes through an
/// authorized seat update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    /// "Cafe", "Game Club", ...
    #[serde(rename = "type")]
    pub category: String,
    #[serde(default)]
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub total_seats: u32,
    pub free_seats: u32,
}

impl Place {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    pub fn is_full(&self) -> bool {
        self.free_seats == 0
    }

    /// Whether `free_seats` is an acceptable new value for this place
    pub fn accepts_free_seats(&self, free_seats: i64) -> bool {
        (0..=i64::from(self.total_seats)).contains(&free_seats)
    }
}

/// Seat update payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatsUpdate {
    pub free_seats: u32,
}
