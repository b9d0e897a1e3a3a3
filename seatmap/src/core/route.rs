//! Route Resolver - 路线
//!
//! Road route from the external provider, or a straight two-point segment
//! when the provider fails. At most one route is displayed at a time.

use std::fmt;
use std::sync::Arc;

use seatmap_client::routing::RouteProvider;
use serde::Serialize;
use shared::geo::{Coordinate, TravelMode, eta_minutes, haversine_km};
use shared::models::PlaceId;

use super::map::MapSurface;

/// How the route path was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    /// Computed by the routing provider
    Road,
    /// Synthesized origin → destination segment
    Straight,
}

/// Path between the user and a target place
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub place_id: PlaceId,
    pub kind: RouteKind,
    pub path: Vec<Coordinate>,
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Great-circle distance origin → destination (not the path length)
    pub distance_km: f64,
}

impl Route {
    pub fn straight(place_id: PlaceId, origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            place_id,
            kind: RouteKind::Straight,
            path: vec![origin, destination],
            origin,
            destination,
            distance_km: haversine_km(origin, destination),
        }
    }

    /// ETA label for `mode`
    pub fn eta(&self, mode: TravelMode) -> EtaLabel {
        EtaLabel::new(self.distance_km, mode)
    }
}

/// Distance + estimated minutes shown next to a route
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EtaLabel {
    pub mode: TravelMode,
    pub distance_km: f64,
    pub minutes: u32,
}

impl EtaLabel {
    pub fn new(distance_km: f64, mode: TravelMode) -> Self {
        Self {
            mode,
            distance_km,
            minutes: eta_minutes(distance_km, mode),
        }
    }
}

impl fmt::Display for EtaLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} km, ~{} min ({})",
            self.distance_km, self.minutes, self.mode
        )
    }
}

/// Resolves routes and keeps the single displayed one in sync with the map
pub struct RouteResolver {
    provider: Arc<dyn RouteProvider>,
    map: Arc<dyn MapSurface>,
    active: Option<Route>,
}

impl RouteResolver {
    pub fn new(provider: Arc<dyn RouteProvider>, map: Arc<dyn MapSurface>) -> Self {
        Self {
            provider,
            map,
            active: None,
        }
    }

    /// Road route if the provider delivers one, otherwise a straight segment
    ///
    /// Never fails: provider errors are logged and replaced by the fallback.
    pub async fn resolve(
        &self,
        place_id: PlaceId,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Route {
        match self.provider.route(origin, destination).await {
            Ok(routed) if routed.points.len() >= 2 => {
                tracing::debug!(
                    place_id,
                    points = routed.points.len(),
                    road_km = routed.distance_km,
                    road_secs = routed.duration_secs,
                    "Road route resolved"
                );
                Route {
                    place_id,
                    kind: RouteKind::Road,
                    path: routed.points,
                    origin,
                    destination,
                    distance_km: haversine_km(origin, destination),
                }
            }
            Ok(_) => {
                tracing::warn!(place_id, "Routing provider returned a degenerate path, using straight line");
                Route::straight(place_id, origin, destination)
            }
            Err(e) => {
                tracing::warn!(place_id, error = %e, "Routing failed, using straight line");
                Route::straight(place_id, origin, destination)
            }
        }
    }

    /// Resolve and display, replacing the previously displayed route
    pub async fn show(
        &mut self,
        place_id: PlaceId,
        origin: Coordinate,
        destination: Coordinate,
    ) -> &Route {
        let route = self.resolve(place_id, origin, destination).await;
        self.map.clear_route();
        self.map.draw_route(&route);
        tracing::debug!(place_id, kind = ?route.kind, distance_km = route.distance_km, "Route displayed");
        self.active.insert(route)
    }

    /// Remove the displayed route; no-op when none is shown
    pub fn clear(&mut self) {
        if self.active.take().is_some() {
            self.map.clear_route();
        }
    }

    pub fn active(&self) -> Option<&Route> {
        self.active.as_ref()
    }

    /// ETA of the displayed route; recomputed without touching the path
    pub fn eta(&self, mode: TravelMode) -> Option<EtaLabel> {
        self.active.as_ref().map(|r| r.eta(mode))
    }
}
