// seatmap-client/tests/http_client.rs
// HTTP client against an in-process fake backend

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
};
use seatmap_client::{ClientConfig, ClientError, HttpClient, PlacesApi};
use serde_json::{Value, json};
use shared::models::{
    Booking, BookingCreate, CrowdStatus, Place, RatingCreate, RatingEntry, RatingSummary,
    SeatsUpdate,
};

const TOKEN: &str = "secret-token";

type ApiError = (StatusCode, Json<Value>);

#[derive(Default)]
struct Backend {
    places: Mutex<Vec<Place>>,
    bookings: Mutex<Vec<Booking>>,
    ratings: Mutex<Vec<RatingEntry>>,
}

fn detail(status: StatusCode, msg: &str) -> ApiError {
    (status, Json(json!({ "detail": msg })))
}

fn authorize(headers: &HeaderMap) -> Result<(), ApiError> {
    let auth = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    if auth == format!("Bearer {}", TOKEN) {
        Ok(())
    } else {
        Err(detail(StatusCode::UNAUTHORIZED, "Not authenticated"))
    }
}

async fn list_places(State(b): State<Arc<Backend>>) -> Json<Vec<Place>> {
    Json(b.places.lock().unwrap().clone())
}

async fn summaries() -> Json<Value> {
    // Place 2 has no ratings yet: aggregates come back as null
    Json(json!([
        {"place_id": 1, "avg_rating": 4.5, "count": 2, "last_status": "busy"},
        {"place_id": 2, "avg_rating": null, "count": 0, "last_status": null}
    ]))
}

async fn update_seats(
    State(b): State<Arc<Backend>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(update): Json<SeatsUpdate>,
) -> Result<Json<Place>, ApiError> {
    authorize(&headers)?;
    let mut places = b.places.lock().unwrap();
    let place = places
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Place not found"))?;
    if update.free_seats > place.total_seats {
        return Err(detail(
            StatusCode::BAD_REQUEST,
            &format!("free_seats must be between 0 and {}", place.total_seats),
        ));
    }
    place.free_seats = update.free_seats;
    Ok(Json(place.clone()))
}

async fn login(Json(req): Json<Value>) -> Result<Json<Value>, ApiError> {
    match (req["username"].as_str(), req["password"].as_str()) {
        (Some("manager"), Some("pass")) => Ok(Json(
            json!({ "token": TOKEN, "place_id": 1, "is_admin": false }),
        )),
        (Some("admin"), Some("pass")) => Ok(Json(
            json!({ "token": TOKEN, "place_id": null, "is_admin": true }),
        )),
        _ => Err(detail(StatusCode::UNAUTHORIZED, "Invalid credentials")),
    }
}

async fn place_bookings(
    State(b): State<Arc<Backend>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, ApiError> {
    authorize(&headers)?;
    let bookings = b.bookings.lock().unwrap();
    Ok(Json(
        bookings
            .iter()
            .filter(|bk| bk.place_id == Some(id))
            .cloned()
            .collect(),
    ))
}

async fn create_booking(
    State(b): State<Arc<Backend>>,
    Path(id): Path<i64>,
    Json(req): Json<BookingCreate>,
) -> Json<Booking> {
    let mut bookings = b.bookings.lock().unwrap();
    let booking = Booking {
        id: Some(bookings.len() as i64 + 1),
        place_id: Some(id),
        name: req.name,
        people: req.people,
        time: req.time,
        status: "pending".to_string(),
        created_at: None,
    };
    bookings.push(booking.clone());
    Json(booking)
}

async fn admin_bookings(
    State(b): State<Arc<Backend>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, ApiError> {
    authorize(&headers)?;
    Ok(Json(b.bookings.lock().unwrap().clone()))
}

async fn list_ratings(State(b): State<Arc<Backend>>) -> Json<Vec<RatingEntry>> {
    Json(b.ratings.lock().unwrap().clone())
}

async fn create_rating(
    State(b): State<Arc<Backend>>,
    Json(req): Json<RatingCreate>,
) -> Json<RatingEntry> {
    let entry = RatingEntry {
        rating: req.rating,
        status: req.status,
        name: req.name,
        comment: req.comment,
        created_at: None,
    };
    b.ratings.lock().unwrap().push(entry.clone());
    Json(entry)
}

fn coffee_time() -> Place {
    Place {
        id: 1,
        name: "Coffee Time".to_string(),
        category: "Cafe".to_string(),
        address: "Andijan, Center street 5".to_string(),
        lat: 40.7821,
        lng: 72.3442,
        total_seats: 20,
        free_seats: 8,
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn start_backend() -> (HttpClient, Arc<Backend>) {
    let backend = Arc::new(Backend::default());
    backend.places.lock().unwrap().push(coffee_time());

    let router = Router::new()
        .route("/api/places", get(list_places))
        .route("/api/ratings/summary", get(summaries))
        .route("/api/places/{id}/seats", put(update_seats))
        .route("/api/manager/login", post(login))
        .route(
            "/api/places/{id}/bookings",
            get(place_bookings).post(create_booking),
        )
        .route("/api/admin/bookings", get(admin_bookings))
        .route(
            "/api/places/{id}/ratings",
            get(list_ratings).post(create_rating),
        )
        .with_state(backend.clone());

    let base_url = serve(router).await;
    let client = ClientConfig::new(base_url)
        .with_timeout(5)
        .build_http_client()
        .unwrap();
    (client, backend)
}

#[tokio::test]
async fn test_list_places_and_summaries() {
    let (client, _backend) = start_backend().await;

    let places = client.places().await.unwrap();
    assert_eq!(places, vec![coffee_time()]);

    let summaries = client.rating_summaries().await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].last_status, Some(CrowdStatus::Busy));
    assert_eq!(
        summaries[1],
        RatingSummary {
            place_id: 2,
            avg_rating: 0.0,
            count: 0,
            last_status: None,
        }
    );
}

#[tokio::test]
async fn test_login_manager_and_admin() {
    let (client, _backend) = start_backend().await;

    let manager = client.login("manager", "pass").await.unwrap();
    assert_eq!(manager.token, TOKEN);
    assert_eq!(manager.place_id, Some(1));
    assert!(!manager.is_admin);

    let admin = client.login("admin", "pass").await.unwrap();
    assert!(admin.is_admin);
    assert_eq!(admin.place_id, None);

    let err = client.login("manager", "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
}

#[tokio::test]
async fn test_update_seats_requires_token() {
    let (client, backend) = start_backend().await;

    let err = client.update_seats("bogus", 1, 5).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    assert_eq!(backend.places.lock().unwrap()[0].free_seats, 8);

    let updated = client.update_seats(TOKEN, 1, 5).await.unwrap();
    assert_eq!(updated.free_seats, 5);
    assert_eq!(backend.places.lock().unwrap()[0].free_seats, 5);
}

#[tokio::test]
async fn test_update_seats_rejection_surfaces_detail() {
    let (client, _backend) = start_backend().await;

    match client.update_seats(TOKEN, 1, 21).await.unwrap_err() {
        ClientError::Validation(msg) => assert_eq!(msg, "free_seats must be between 0 and 20"),
        other => panic!("unexpected {other:?}"),
    }
    match client.update_seats(TOKEN, 99, 1).await.unwrap_err() {
        ClientError::NotFound(msg) => assert_eq!(msg, "Place not found"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_bookings_flow() {
    let (client, _backend) = start_backend().await;

    let created = client
        .create_booking(
            1,
            &BookingCreate {
                name: "Aziz".to_string(),
                people: 3,
                time: "19:30".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.id, Some(1));
    assert_eq!(created.status, "pending");

    let for_place = client.place_bookings(TOKEN, 1).await.unwrap();
    assert_eq!(for_place, vec![created.clone()]);

    let all = client.admin_bookings(TOKEN).await.unwrap();
    assert_eq!(all.len(), 1);

    assert!(matches!(
        client.admin_bookings("bogus").await.unwrap_err(),
        ClientError::Unauthorized
    ));
}

#[tokio::test]
async fn test_ratings_through_trait_object() {
    let (client, _backend) = start_backend().await;
    let api: Arc<dyn PlacesApi> = Arc::new(client);

    let entry = api
        .create_rating(
            1,
            &RatingCreate {
                rating: 5,
                status: CrowdStatus::Free,
                name: Some("Dilnoza".to_string()),
                comment: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(entry.rating, 5);

    let history = api.place_ratings(1).await.unwrap();
    assert_eq!(history, vec![entry]);
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let router = Router::new().route("/api/places", get(|| async { "not json" }));
    let base_url = serve(router).await;
    let client = HttpClient::new(&ClientConfig::new(base_url)).unwrap();

    let err = client.places().await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
    assert!(!err.is_rejection());
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Grab a free port, then close it again
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpClient::new(&ClientConfig::new(format!("http://{}", addr)).with_timeout(2))
        .unwrap();
    let err = client.places().await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
}
