//! Rating Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::place::PlaceId;

/// Crowd status reported together with a rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrowdStatus {
    Busy,
    Free,
    Normal,
}

impl CrowdStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CrowdStatus::Busy => "busy",
            CrowdStatus::Free => "free",
            CrowdStatus::Normal => "normal",
        }
    }
}

impl fmt::Display for CrowdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrowdStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "busy" => Ok(CrowdStatus::Busy),
            "free" => Ok(CrowdStatus::Free),
            "normal" => Ok(CrowdStatus::Normal),
            other => Err(format!(
                "unknown crowd status \"{other}\" (expected busy, free or normal)"
            )),
        }
    }
}

/// Per-place rating summary (server-derived, read-only on the client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub place_id: PlaceId,
    /// Unrated places may send `null`; read as 0
    #[serde(default, deserialize_with = "null_as_default")]
    pub avg_rating: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u32,
    /// Absent until someone reports a crowd status
    #[serde(default)]
    pub last_status: Option<CrowdStatus>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One rating in a place's append-only history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub rating: u8,
    pub status: CrowdStatus,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create rating payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingCreate {
    pub rating: u8,
    pub status: CrowdStatus,
    pub name: Option<String>,
    pub comment: Option<String>,
}
