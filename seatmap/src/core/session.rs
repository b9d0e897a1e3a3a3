//! Manager/admin session
//!
//! Issued by a successful backend login, held only in memory and dropped on
//! logout. Nothing in this module touches the disk.

use chrono::{DateTime, Utc};
use seatmap_client::LoginResponse;
use shared::models::PlaceId;

/// Role granted by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Bound to exactly one place
    Manager(PlaceId),
    /// Sees every place and every booking
    Admin,
}

/// Authenticated session
#[derive(Clone)]
pub struct Session {
    token: String,
    pub username: String,
    pub role: Role,
    pub logged_in_at: DateTime<Utc>,
}

// Keep the token out of logs
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("logged_in_at", &self.logged_in_at)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Build a session from the login response
    ///
    /// Returns `None` for a non-admin response without a place binding,
    /// which would leave the manager with nothing to manage.
    pub fn from_login(username: &str, response: LoginResponse) -> Option<Self> {
        let role = if response.is_admin {
            Role::Admin
        } else {
            Role::Manager(response.place_id?)
        };
        Some(Self {
            token: response.token,
            username: username.to_string(),
            role,
            logged_in_at: Utc::now(),
        })
    }

    /// Bearer token attached to privileged requests
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Place bound to a manager session (`None` for admins)
    pub fn place_id(&self) -> Option<PlaceId> {
        match self.role {
            Role::Manager(id) => Some(id),
            Role::Admin => None,
        }
    }

    /// Managers edit their own place only; admins edit any place
    pub fn can_edit(&self, place_id: PlaceId) -> bool {
        match self.role {
            Role::Manager(id) => id == place_id,
            Role::Admin => true,
        }
    }
}
