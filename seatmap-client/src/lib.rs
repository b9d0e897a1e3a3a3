//! SeatMap Client - HTTP client for the places backend
//!
//! Provides network-based HTTP calls to the places REST API and to the
//! external road-routing provider.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod routing;

pub use api::PlacesApi;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use routing::{OsrmRouter, RouteProvider, RoutedPath, RoutingError};

// Re-export shared types for convenience
pub use shared::client::{LoginRequest, LoginResponse};
