//! In-memory doubles for the backend, the routing provider and the map

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use seatmap_lib::core::{FavoritesStore, MapSurface, Route};
use seatmap_lib::seatmap_client::routing::{RouteProvider, RoutedPath, RoutingError};
use seatmap_lib::seatmap_client::{ClientError, ClientResult, LoginResponse, PlacesApi};
use seatmap_lib::shared::geo::{Coordinate, TravelMode};
use seatmap_lib::shared::models::{
    Booking, BookingCreate, Place, PlaceId, RatingCreate, RatingEntry, RatingSummary,
};
use seatmap_lib::Controller;

pub const TOKEN: &str = "manager-token";
pub const ADMIN_TOKEN: &str = "admin-token";

pub fn place(id: PlaceId, lat: f64, lng: f64, total: u32, free: u32) -> Place {
    Place {
        id,
        name: format!("Place {id}"),
        category: if id % 2 == 0 { "Game Club" } else { "Cafe" }.to_string(),
        address: format!("Street {id}"),
        lat,
        lng,
        total_seats: total,
        free_seats: free,
    }
}

/// Counts of requests per endpoint
#[derive(Debug, Default)]
pub struct Calls {
    pub places: AtomicUsize,
    pub summaries: AtomicUsize,
    pub update_seats: AtomicUsize,
    pub login: AtomicUsize,
    pub bookings: AtomicUsize,
    pub create_booking: AtomicUsize,
    pub ratings: AtomicUsize,
    pub create_rating: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Places backend double
#[derive(Default)]
pub struct FakeApi {
    pub places: Mutex<Vec<Place>>,
    pub summaries: Mutex<Vec<RatingSummary>>,
    pub bookings: Mutex<Vec<Booking>>,
    pub ratings: Mutex<HashMap<PlaceId, Vec<RatingEntry>>>,
    pub calls: Calls,
    /// Makes `GET /api/ratings/summary` fail
    pub fail_summaries: Mutex<bool>,
    /// Server-side clamp applied to seat updates (to prove the server wins)
    pub seat_cap: Mutex<Option<u32>>,
    /// Makes `GET /api/places` wait until the summary read has started
    pub places_await_summaries: Mutex<bool>,
    summaries_entered: Notify,
}

impl FakeApi {
    pub fn with_places(places: Vec<Place>) -> Arc<Self> {
        let api = Self::default();
        *api.places.lock().unwrap() = places;
        Arc::new(api)
    }

    fn check_token(token: &str) -> ClientResult<()> {
        if token == TOKEN || token == ADMIN_TOKEN {
            Ok(())
        } else {
            Err(ClientError::Unauthorized)
        }
    }
}

#[async_trait]
impl PlacesApi for FakeApi {
    async fn places(&self) -> ClientResult<Vec<Place>> {
        self.calls.places.fetch_add(1, Ordering::SeqCst);
        let wait = *self.places_await_summaries.lock().unwrap();
        if wait {
            self.summaries_entered.notified().await;
        }
        Ok(self.places.lock().unwrap().clone())
    }

    async fn rating_summaries(&self) -> ClientResult<Vec<RatingSummary>> {
        self.calls.summaries.fetch_add(1, Ordering::SeqCst);
        self.summaries_entered.notify_one();
        if *self.fail_summaries.lock().unwrap() {
            return Err(ClientError::InvalidResponse("summary unavailable".to_string()));
        }
        Ok(self.summaries.lock().unwrap().clone())
    }

    async fn update_seats(
        &self,
        token: &str,
        place_id: PlaceId,
        free_seats: u32,
    ) -> ClientResult<Place> {
        self.calls.update_seats.fetch_add(1, Ordering::SeqCst);
        Self::check_token(token)?;

        let cap = *self.seat_cap.lock().unwrap();
        let mut places = self.places.lock().unwrap();
        let place = places
            .iter_mut()
            .find(|p| p.id == place_id)
            .ok_or_else(|| ClientError::NotFound("Place not found".to_string()))?;
        if free_seats > place.total_seats {
            return Err(ClientError::Validation(
                "free_seats cannot exceed total_seats".to_string(),
            ));
        }
        place.free_seats = cap.map_or(free_seats, |cap| free_seats.min(cap));
        Ok(place.clone())
    }

    async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        self.calls.login.fetch_add(1, Ordering::SeqCst);
        match (username, password) {
            ("manager", "pass") => Ok(LoginResponse {
                token: TOKEN.to_string(),
                place_id: Some(1),
                is_admin: false,
            }),
            ("admin", "pass") => Ok(LoginResponse {
                token: ADMIN_TOKEN.to_string(),
                place_id: None,
                is_admin: true,
            }),
            _ => Err(ClientError::Unauthorized),
        }
    }

    async fn place_bookings(&self, token: &str, place_id: PlaceId) -> ClientResult<Vec<Booking>> {
        self.calls.bookings.fetch_add(1, Ordering::SeqCst);
        Self::check_token(token)?;
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.place_id == Some(place_id))
            .cloned()
            .collect())
    }

    async fn create_booking(
        &self,
        place_id: PlaceId,
        booking: &BookingCreate,
    ) -> ClientResult<Booking> {
        self.calls.create_booking.fetch_add(1, Ordering::SeqCst);
        let mut bookings = self.bookings.lock().unwrap();
        let created = Booking {
            id: Some(bookings.len() as i64 + 1),
            place_id: Some(place_id),
            name: booking.name.clone(),
            people: booking.people,
            time: booking.time.clone(),
            status: "pending".to_string(),
            created_at: None,
        };
        bookings.push(created.clone());
        Ok(created)
    }

    async fn place_ratings(&self, place_id: PlaceId) -> ClientResult<Vec<RatingEntry>> {
        self.calls.ratings.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .ratings
            .lock()
            .unwrap()
            .get(&place_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_rating(
        &self,
        place_id: PlaceId,
        rating: &RatingCreate,
    ) -> ClientResult<RatingEntry> {
        self.calls.create_rating.fetch_add(1, Ordering::SeqCst);
        let entry = RatingEntry {
            rating: rating.rating,
            status: rating.status,
            name: rating.name.clone(),
            comment: rating.comment.clone(),
            created_at: None,
        };

        let mut ratings = self.ratings.lock().unwrap();
        let history = ratings.entry(place_id).or_default();
        history.push(entry.clone());

        let count = history.len() as u32;
        let avg = history.iter().map(|e| f64::from(e.rating)).sum::<f64>() / f64::from(count);
        let mut summaries = self.summaries.lock().unwrap();
        summaries.retain(|s| s.place_id != place_id);
        summaries.push(RatingSummary {
            place_id,
            avg_rating: avg,
            count,
            last_status: Some(rating.status),
        });
        Ok(entry)
    }

    async fn admin_bookings(&self, token: &str) -> ClientResult<Vec<Booking>> {
        self.calls.bookings.fetch_add(1, Ordering::SeqCst);
        if token != ADMIN_TOKEN {
            return Err(ClientError::Forbidden("Admins only".to_string()));
        }
        Ok(self.bookings.lock().unwrap().clone())
    }
}

/// Routing provider that always fails
pub struct FailingRouter;

#[async_trait]
impl RouteProvider for FailingRouter {
    async fn route(&self, _o: Coordinate, _d: Coordinate) -> Result<RoutedPath, RoutingError> {
        Err(RoutingError::Status {
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

/// Routing provider returning a three-point path through the midpoint
pub struct MidpointRouter;

#[async_trait]
impl RouteProvider for MidpointRouter {
    async fn route(&self, o: Coordinate, d: Coordinate) -> Result<RoutedPath, RoutingError> {
        Ok(RoutedPath {
            points: vec![o, o.interpolate(d, 0.5), d],
            distance_km: 10.0,
            duration_secs: 900.0,
        })
    }
}

/// Map surface that records what it was asked to draw
#[derive(Default)]
pub struct RecordingMap {
    pub place_refreshes: Mutex<Vec<usize>>,
    pub markers: Mutex<Vec<Coordinate>>,
    pub routes: Mutex<Vec<Route>>,
    pub clears: AtomicUsize,
}

impl RecordingMap {
    pub fn last_marker(&self) -> Option<Coordinate> {
        self.markers.lock().unwrap().last().copied()
    }

    pub fn last_route(&self) -> Option<Route> {
        self.routes.lock().unwrap().last().cloned()
    }
}

impl MapSurface for RecordingMap {
    fn show_places(&self, places: &[Place]) {
        self.place_refreshes.lock().unwrap().push(places.len());
    }

    fn set_user_marker(&self, position: Coordinate) {
        self.markers.lock().unwrap().push(position);
    }

    fn draw_route(&self, route: &Route) {
        self.routes.lock().unwrap().push(route.clone());
    }

    fn clear_route(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub controller: Controller,
    pub api: Arc<FakeApi>,
    pub map: Arc<RecordingMap>,
    pub dir: tempfile::TempDir,
}

pub fn harness(api: Arc<FakeApi>, router: Arc<dyn RouteProvider>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let map = Arc::new(RecordingMap::default());
    let controller = Controller::new(
        api.clone(),
        router,
        map.clone(),
        FavoritesStore::load(dir.path()),
        TravelMode::Walk,
    );
    Harness {
        controller,
        api,
        map,
        dir,
    }
}
