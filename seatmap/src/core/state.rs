//! Application state
//!
//! Everything the views are projected from, owned by one controller and
//! changed only through the named transitions below.

use shared::geo::{Coordinate, TravelMode};
use shared::models::PlaceId;

use super::cache::{DataCache, Snapshot};
use super::favorites::FavoritesStore;
use super::render::ViewFilters;
use super::session::Session;

/// 应用状态
#[derive(Debug)]
pub struct AppState {
    cache: DataCache,
    favorites: FavoritesStore,
    session: Option<Session>,
    location: Option<Coordinate>,
    filters: ViewFilters,
    /// Place the route is drawn to
    target: Option<PlaceId>,
    travel_mode: TravelMode,
}

impl AppState {
    pub fn new(favorites: FavoritesStore, travel_mode: TravelMode) -> Self {
        Self {
            cache: DataCache::new(),
            favorites,
            session: None,
            location: None,
            filters: ViewFilters::default(),
            target: None,
            travel_mode,
        }
    }

    // ========== Accessors ==========

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn location(&self) -> Option<Coordinate> {
        self.location
    }

    pub fn filters(&self) -> &ViewFilters {
        &self.filters
    }

    pub fn target(&self) -> Option<PlaceId> {
        self.target
    }

    pub fn travel_mode(&self) -> TravelMode {
        self.travel_mode
    }

    // ========== Transitions ==========

    /// Install a fresh snapshot; drops the route target if its place is gone
    pub(crate) fn install_snapshot(&mut self, snapshot: Snapshot) {
        self.cache.install(snapshot);
        if let Some(target) = self.target
            && self.cache.place(target).is_none()
        {
            self.target = None;
        }
    }

    pub(crate) fn cache_mut(&mut self) -> &mut DataCache {
        &mut self.cache
    }

    pub(crate) fn favorites_mut(&mut self) -> &mut FavoritesStore {
        &mut self.favorites
    }

    /// Replace any existing session; bookings of the previous one are dropped
    pub(crate) fn start_session(&mut self, session: Session) {
        self.cache.clear_bookings();
        self.session = Some(session);
    }

    /// Clear the session and all manager/admin data
    pub(crate) fn end_session(&mut self) -> Option<Session> {
        self.cache.clear_bookings();
        self.session.take()
    }

    pub(crate) fn set_location(&mut self, location: Coordinate) {
        self.location = Some(location);
    }

    pub(crate) fn filters_mut(&mut self) -> &mut ViewFilters {
        &mut self.filters
    }

    pub(crate) fn select_target(&mut self, place_id: PlaceId) {
        self.target = Some(place_id);
    }

    pub(crate) fn clear_target(&mut self) -> Option<PlaceId> {
        self.target.take()
    }

    pub(crate) fn set_travel_mode(&mut self, mode: TravelMode) {
        self.travel_mode = mode;
    }
}
