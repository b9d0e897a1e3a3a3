//! Geo helpers
//!
//! Great-circle distance and travel-time estimation. Everything here is pure
//! and total: no I/O, no failure modes apart from parsing user input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Walking speed used for ETA estimation
pub const WALKING_SPEED_KMH: f64 = 4.5;

/// Driving speed used for ETA estimation (city traffic)
pub const DRIVING_SPEED_KMH: f64 = 25.0;

/// A WGS84 coordinate pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Linear interpolation towards `other`; `t` is clamped to [0, 1].
    ///
    /// `t == 1.0` returns `other` exactly so that an animation always lands
    /// on its target instead of an accumulated floating point neighbour.
    pub fn interpolate(self, other: Self, t: f64) -> Self {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t >= 1.0 {
            return other;
        }
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }

    /// Great-circle distance to `other` in kilometres
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(*self, *other)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

/// Geo input parse error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeoParseError {
    #[error("expected \"LAT,LNG\", got \"{0}\"")]
    Format(String),

    #[error("coordinate out of range: {0}")]
    OutOfRange(String),

    #[error("unknown travel mode \"{0}\" (expected walk or drive)")]
    TravelMode(String),
}

impl FromStr for Coordinate {
    type Err = GeoParseError;

    /// Parses `"41.30,69.25"` (latitude first)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| GeoParseError::Format(s.to_string()))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| GeoParseError::Format(s.to_string()))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| GeoParseError::Format(s.to_string()))?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoParseError::OutOfRange(s.to_string()));
        }
        Ok(Self { lat, lng })
    }
}

/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1_rad = a.lat.to_radians();
    let lat2_rad = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // 浮点误差可能让 h 略大于 1
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// How the user intends to travel to a place
///
/// Path finding is mode-agnostic; the mode only changes the ETA label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Walk,
    Drive,
}

impl TravelMode {
    pub fn speed_kmh(self) -> f64 {
        match self {
            TravelMode::Walk => WALKING_SPEED_KMH,
            TravelMode::Drive => DRIVING_SPEED_KMH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Walk => "walk",
            TravelMode::Drive => "drive",
        }
    }

    /// The other mode (used by the walk/drive toggle)
    pub fn toggled(self) -> Self {
        match self {
            TravelMode::Walk => TravelMode::Drive,
            TravelMode::Drive => TravelMode::Walk,
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = GeoParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walk" | "walking" | "foot" => Ok(TravelMode::Walk),
            "drive" | "driving" | "car" => Ok(TravelMode::Drive),
            other => Err(GeoParseError::TravelMode(other.to_string())),
        }
    }
}

/// Estimated travel time in whole minutes, rounded to the nearest minute
pub fn eta_minutes(distance_km: f64, mode: TravelMode) -> u32 {
    if !distance_km.is_finite() || distance_km <= 0.0 {
        return 0;
    }
    let minutes = (distance_km / mode.speed_kmh() * 60.0).round();
    if minutes >= u32::MAX as f64 {
        u32::MAX
    } else {
        minutes as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASHKENT: Coordinate = Coordinate::new(41.30, 69.25);
    const NEARBY: Coordinate = Coordinate::new(41.32, 69.27);

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(haversine_km(TASHKENT, TASHKENT), 0.0);
        assert_eq!(haversine_km(NEARBY, NEARBY), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let ab = haversine_km(TASHKENT, NEARBY);
        let ba = haversine_km(NEARBY, TASHKENT);
        assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn test_distance_nearby_places() {
        let d = TASHKENT.distance_km(&NEARBY);
        // ~2.8 km between the two points
        assert!(d.is_finite());
        assert!(d > 2.5 && d < 3.0, "got {d}");
    }

    #[test]
    fn test_distance_antipodal_is_finite() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let d = haversine_km(a, b);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_eta_minutes() {
        // 4.5 km on foot = 60 min, 25 km by car = 60 min
        assert_eq!(eta_minutes(4.5, TravelMode::Walk), 60);
        assert_eq!(eta_minutes(25.0, TravelMode::Drive), 60);
        // 1 km walking = 13.33 min -> 13
        assert_eq!(eta_minutes(1.0, TravelMode::Walk), 13);
        // 1 km driving = 2.4 min -> 2
        assert_eq!(eta_minutes(1.0, TravelMode::Drive), 2);
        assert_eq!(eta_minutes(0.0, TravelMode::Walk), 0);
        assert_eq!(eta_minutes(f64::NAN, TravelMode::Walk), 0);
    }

    #[test]
    fn test_interpolate_clamps() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(10.0, 20.0);
        assert_eq!(a.interpolate(b, -1.0), a);
        assert_eq!(a.interpolate(b, 2.0), b);
        assert_eq!(a.interpolate(b, 1.0), b);
        assert_eq!(a.interpolate(b, 0.5), Coordinate::new(5.0, 10.0));
    }

    #[test]
    fn test_parse_coordinate() {
        let c: Coordinate = "41.30, 69.25".parse().unwrap();
        assert_eq!(c, TASHKENT);
        assert!("41.30".parse::<Coordinate>().is_err());
        assert!("abc,1".parse::<Coordinate>().is_err());
        assert_eq!(
            "91,0".parse::<Coordinate>(),
            Err(GeoParseError::OutOfRange("91,0".to_string()))
        );
    }

    #[test]
    fn test_travel_mode() {
        assert_eq!("drive".parse::<TravelMode>().unwrap(), TravelMode::Drive);
        assert_eq!("Walk".parse::<TravelMode>().unwrap(), TravelMode::Walk);
        assert!("fly".parse::<TravelMode>().is_err());
        assert_eq!(TravelMode::Walk.toggled(), TravelMode::Drive);
        assert_eq!(
            serde_json::to_string(&TravelMode::Drive).unwrap(),
            "\"drive\""
        );
    }
}
