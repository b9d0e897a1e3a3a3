//! Map surface
//!
//! The map widget (markers, clustering, polylines) is an external
//! collaborator; the core only drives it through [`MapSurface`].

use shared::geo::Coordinate;
use shared::models::Place;

use super::route::Route;

/// Operations the core needs from the map widget
pub trait MapSurface: Send + Sync {
    /// Replace all place markers
    fn show_places(&self, places: &[Place]);

    /// Move (or create) the user's marker
    fn set_user_marker(&self, position: Coordinate);

    /// Draw a route polyline
    fn draw_route(&self, route: &Route);

    /// Remove the displayed route polyline, if any
    fn clear_route(&self);
}

/// Map surface that only logs; used by the CLI
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMap;

impl MapSurface for LogMap {
    fn show_places(&self, places: &[Place]) {
        tracing::debug!(count = places.len(), "Place markers refreshed");
    }

    fn set_user_marker(&self, position: Coordinate) {
        tracing::trace!(lat = position.lat, lng = position.lng, "User marker moved");
    }

    fn draw_route(&self, route: &Route) {
        tracing::debug!(
            place_id = route.place_id,
            kind = ?route.kind,
            points = route.path.len(),
            "Route drawn"
        );
    }

    fn clear_route(&self) {
        tracing::trace!("Route cleared");
    }
}
