//! Application core
//!
//! State, synchronisation and view projection of the SeatMap client. The
//! map widget and the platform location service are reached through the
//! [`MapSurface`] and [`LocationSource`] traits.

pub mod action;
pub mod animator;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod favorites;
pub mod map;
pub mod notice;
pub mod render;
pub mod route;
pub mod session;
pub mod state;
pub mod tracker;

pub use action::{Action, ActionKind, DelegateTarget};
pub use animator::{MarkerAnimator, ScheduledRepeat};
pub use cache::{DataCache, Snapshot};
pub use config::AppConfig;
pub use controller::{BookingRequest, Controller, Dispatched, RatingRequest};
pub use error::{AppError, AppResult};
pub use favorites::FavoritesStore;
pub use map::{LogMap, MapSurface};
pub use notice::{Notice, NoticeLevel};
pub use render::{CategoryFilter, ViewFilters};
pub use route::{EtaLabel, Route, RouteKind, RouteResolver};
pub use session::{Role, Session};
pub use state::AppState;
pub use tracker::{LocationError, LocationSource, LocationTracker, ReplaySource, TrackerOptions};
