//! Road routing provider
//!
//! [`RouteProvider`] is the seam to the external routing service. The
//! bundled implementation talks to an OSRM-compatible HTTP API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::geo::Coordinate;
use thiserror::Error;

/// Public OSRM demo server
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

/// Routing provider error
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("Routing request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Routing provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Routing provider found no route ({0})")]
    NoRoute(String),

    #[error("Invalid routing response: {0}")]
    InvalidResponse(String),
}

/// Path computed by the provider
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPath {
    /// Polyline, origin first
    pub points: Vec<Coordinate>,
    /// Road distance reported by the provider, in kilometres
    pub distance_km: f64,
    /// Travel duration reported by the provider, in seconds
    pub duration_secs: f64,
}

/// External road-routing service
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RoutedPath, RoutingError>;
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: [lng, lat]
    coordinates: Vec<[f64; 2]>,
}

/// OSRM HTTP routing client
#[derive(Debug, Clone)]
pub struct OsrmRouter {
    client: Client,
    base_url: String,
    profile: String,
}

impl OsrmRouter {
    /// `profile` is the OSRM profile segment ("driving", "foot", ...)
    pub fn new(
        base_url: impl Into<String>,
        profile: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(format!("seatmap/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: profile.into(),
        })
    }

    fn route_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, self.profile, origin.lng, origin.lat, destination.lng, destination.lat
        )
    }

    fn parse(body: &str) -> Result<RoutedPath, RoutingError> {
        let parsed: OsrmResponse = serde_json::from_str(body)
            .map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;

        if parsed.code != "Ok" {
            let reason = parsed.message.unwrap_or(parsed.code);
            return Err(RoutingError::NoRoute(reason));
        }

        let route = parsed
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::NoRoute("empty route list".to_string()))?;

        let points: Vec<Coordinate> = route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lng, lat]| Coordinate::new(lat, lng))
            .collect();
        if points.len() < 2 {
            return Err(RoutingError::InvalidResponse(format!(
                "route geometry has {} point(s)",
                points.len()
            )));
        }

        Ok(RoutedPath {
            points,
            distance_km: route.distance / 1000.0,
            duration_secs: route.duration,
        })
    }
}

#[async_trait]
impl RouteProvider for OsrmRouter {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RoutedPath, RoutingError> {
        let url = self.route_url(origin, destination);
        tracing::debug!(url = %url, "Requesting route");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RoutingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Self::parse(&body)
    }
}
