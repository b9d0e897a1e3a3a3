//! Backend API abstraction
//!
//! The application core talks to the backend only through [`PlacesApi`], so
//! it can run against the network client or an in-memory double.

use async_trait::async_trait;
use shared::models::{
    Booking, BookingCreate, Place, PlaceId, RatingCreate, RatingEntry, RatingSummary,
};

use crate::{ClientResult, HttpClient, LoginResponse};

/// Operations of the places REST backend
#[async_trait]
pub trait PlacesApi: Send + Sync {
    /// `GET /api/places`
    async fn places(&self) -> ClientResult<Vec<Place>>;

    /// `GET /api/ratings/summary`
    async fn rating_summaries(&self) -> ClientResult<Vec<RatingSummary>>;

    /// `PUT /api/places/{id}/seats` (token)
    async fn update_seats(&self, token: &str, place_id: PlaceId, free_seats: u32)
    -> ClientResult<Place>;

    /// `POST /api/manager/login`
    async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse>;

    /// `GET /api/places/{id}/bookings` (token)
    async fn place_bookings(&self, token: &str, place_id: PlaceId) -> ClientResult<Vec<Booking>>;

    /// `POST /api/places/{id}/bookings`
    async fn create_booking(&self, place_id: PlaceId, booking: &BookingCreate)
    -> ClientResult<Booking>;

    /// `GET /api/places/{id}/ratings`
    async fn place_ratings(&self, place_id: PlaceId) -> ClientResult<Vec<RatingEntry>>;

    /// `POST /api/places/{id}/ratings`
    async fn create_rating(&self, place_id: PlaceId, rating: &RatingCreate)
    -> ClientResult<RatingEntry>;

    /// `GET /api/admin/bookings` (token)
    async fn admin_bookings(&self, token: &str) -> ClientResult<Vec<Booking>>;
}

#[async_trait]
impl PlacesApi for HttpClient {
    async fn places(&self) -> ClientResult<Vec<Place>> {
        HttpClient::places(self).await
    }

    async fn rating_summaries(&self) -> ClientResult<Vec<RatingSummary>> {
        HttpClient::rating_summaries(self).await
    }

    async fn update_seats(
        &self,
        token: &str,
        place_id: PlaceId,
        free_seats: u32,
    ) -> ClientResult<Place> {
        HttpClient::update_seats(self, token, place_id, free_seats).await
    }

    async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        HttpClient::login(self, username, password).await
    }

    async fn place_bookings(&self, token: &str, place_id: PlaceId) -> ClientResult<Vec<Booking>> {
        HttpClient::place_bookings(self, token, place_id).await
    }

    async fn create_booking(
        &self,
        place_id: PlaceId,
        booking: &BookingCreate,
    ) -> ClientResult<Booking> {
        HttpClient::create_booking(self, place_id, booking).await
    }

    async fn place_ratings(&self, place_id: PlaceId) -> ClientResult<Vec<RatingEntry>> {
        HttpClient::place_ratings(self, place_id).await
    }

    async fn create_rating(
        &self,
        place_id: PlaceId,
        rating: &RatingCreate,
    ) -> ClientResult<RatingEntry> {
        HttpClient::create_rating(self, place_id, rating).await
    }

    async fn admin_bookings(&self, token: &str) -> ClientResult<Vec<Booking>> {
        HttpClient::admin_bookings(self, token).await
    }
}
