//! Client-related types shared between the backend contract and the client
//!
//! Request/response bodies that are not domain models in their own right.

use serde::{Deserialize, Serialize};

use crate::models::PlaceId;

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Manager login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Manager login response data
///
/// `place_id` is absent for admins, who are not bound to a single place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub place_id: Option<PlaceId>,
    #[serde(default)]
    pub is_admin: bool,
}
