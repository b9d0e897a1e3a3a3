//! HTTP client for network-based API calls

use crate::{ClientConfig, ClientError, ClientResult, LoginRequest, LoginResponse};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::error::ErrorBody;
use shared::models::{
    Booking, BookingCreate, Place, PlaceId, RatingCreate, RatingEntry, RatingSummary, SeatsUpdate,
};

/// HTTP client for making network requests to the places backend
///
/// The client holds no credentials: privileged calls take the session token
/// explicitly so it lives only in the caller's in-memory session.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build a request, attaching the bearer token when given
    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> ClientResult<T> {
        tracing::debug!(path = %path, "GET");
        let response = self.request(Method::GET, path, token).send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> ClientResult<T> {
        tracing::debug!(path = %path, "POST");
        let response = self
            .request(Method::POST, path, token)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> ClientResult<T> {
        tracing::debug!(path = %path, "PUT");
        let response = self
            .request(Method::PUT, path, token)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = ErrorBody::parse(&text).message();
            tracing::warn!(status = %status, detail = ?detail, "Request rejected");
            return Err(ClientError::from_status(status, detail));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::InvalidResponse(format!("{} ({} bytes)", e, bytes.len())))
    }

    // ========== Places API ==========

    /// List all places
    pub async fn places(&self) -> ClientResult<Vec<Place>> {
        self.get("/api/places", None).await
    }

    /// Rating summary of every place
    pub async fn rating_summaries(&self) -> ClientResult<Vec<RatingSummary>> {
        self.get("/api/ratings/summary", None).await
    }

    /// Update the free-seat count of a place (manager/admin token)
    pub async fn update_seats(
        &self,
        token: &str,
        place_id: PlaceId,
        free_seats: u32,
    ) -> ClientResult<Place> {
        self.put(
            &format!("/api/places/{}/seats", place_id),
            &SeatsUpdate { free_seats },
            Some(token),
        )
        .await
    }

    // ========== Auth API ==========

    /// Login with username and password
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.post("/api/manager/login", &request, None).await
    }

    // ========== Bookings API ==========

    /// Bookings of one place (manager token)
    pub async fn place_bookings(&self, token: &str, place_id: PlaceId) -> ClientResult<Vec<Booking>> {
        self.get(&format!("/api/places/{}/bookings", place_id), Some(token))
            .await
    }

    /// Create a booking
    pub async fn create_booking(
        &self,
        place_id: PlaceId,
        booking: &BookingCreate,
    ) -> ClientResult<Booking> {
        self.post(&format!("/api/places/{}/bookings", place_id), booking, None)
            .await
    }

    /// All bookings across places (admin token)
    pub async fn admin_bookings(&self, token: &str) -> ClientResult<Vec<Booking>> {
        self.get("/api/admin/bookings", Some(token)).await
    }

    // ========== Ratings API ==========

    /// Rating history of one place
    pub async fn place_ratings(&self, place_id: PlaceId) -> ClientResult<Vec<RatingEntry>> {
        self.get(&format!("/api/places/{}/ratings", place_id), None)
            .await
    }

    /// Submit a rating with a crowd status report
    pub async fn create_rating(
        &self,
        place_id: PlaceId,
        rating: &RatingCreate,
    ) -> ClientResult<RatingEntry> {
        self.post(&format!("/api/places/{}/ratings", place_id), rating, None)
            .await
    }
}
