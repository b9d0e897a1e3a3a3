//! Controller - 应用控制器
//!
//! Owns the [`AppState`] and runs every state transition: data refresh,
//! favorites, filters, session, seat updates, bookings, ratings, location
//! updates and routing. Failures are handled where they occur: logged with
//! `tracing`, surfaced once as a [`Notice`], and returned to the caller.
//! Nothing here is fatal and nothing is retried.

use std::sync::Arc;

use seatmap_client::PlacesApi;
use seatmap_client::routing::RouteProvider;
use shared::geo::{Coordinate, TravelMode};
use shared::models::{
    Booking, BookingCreate, CrowdStatus, Place, PlaceId, RatingCreate, RatingEntry,
};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use super::action::{Action, DelegateTarget};
use super::animator::MarkerAnimator;
use super::cache::fetch_snapshot;
use super::error::{AppError, AppResult};
use super::favorites::FavoritesStore;
use super::map::MapSurface;
use super::notice::Notice;
use super::render::{
    self, AdminTableView, CategoryFilter, ManagerPanelView, UserListView,
};
use super::route::{EtaLabel, RouteResolver};
use super::session::{Role, Session};
use super::state::AppState;
use super::tracker::{LocationError, LocationTracker};

const NOTICE_CAPACITY: usize = 64;

/// Result of a dispatched [`Action`]
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Favorite { place_id: PlaceId, favorite: bool },
    /// Route shown; `None` until the user's location is known
    Route(Option<EtaLabel>),
    RouteCleared,
    TravelMode(TravelMode, Option<EtaLabel>),
    /// Front end should open the booking form
    BookingForm(PlaceId),
    /// Front end should open the rating form
    RatingForm(PlaceId),
    Ratings(PlaceId, Vec<RatingEntry>),
    SeatsSaved(Place),
}

/// Booking form input
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub name: String,
    pub people: u32,
    pub time: String,
}

/// Rating form input
#[derive(Debug, Clone)]
pub struct RatingRequest {
    pub rating: u8,
    pub status: CrowdStatus,
    pub name: Option<String>,
    pub comment: Option<String>,
}

/// Single owner of the application state
pub struct Controller {
    api: Arc<dyn PlacesApi>,
    map: Arc<dyn MapSurface>,
    resolver: RouteResolver,
    animator: MarkerAnimator,
    state: AppState,
    notices: broadcast::Sender<Notice>,
    /// ETA label of the displayed route
    eta: watch::Sender<Option<EtaLabel>>,
}

impl Controller {
    pub fn new(
        api: Arc<dyn PlacesApi>,
        router: Arc<dyn RouteProvider>,
        map: Arc<dyn MapSurface>,
        favorites: FavoritesStore,
        travel_mode: TravelMode,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let (eta, _) = watch::channel(None);
        Self {
            resolver: RouteResolver::new(router, map.clone()),
            animator: MarkerAnimator::new(map.clone()),
            api,
            map,
            state: AppState::new(favorites, travel_mode),
            notices,
            eta,
        }
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Receiver of the ETA label; changes on every re-route or mode toggle
    pub fn subscribe_eta(&self) -> watch::Receiver<Option<EtaLabel>> {
        self.eta.subscribe()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn animator(&self) -> &MarkerAnimator {
        &self.animator
    }

    pub fn resolver(&self) -> &RouteResolver {
        &self.resolver
    }

    fn notify(&self, notice: Notice) {
        // 没有订阅者时丢弃
        let _ = self.notices.send(notice);
    }

    /// Log and surface a failure once, then hand it back
    fn surface<T>(&self, operation: &'static str, result: AppResult<T>) -> AppResult<T> {
        if let Err(e) = &result {
            tracing::warn!(operation, error = %e, "Operation failed");
            self.notify(Notice::error(e.user_message()));
        }
        result
    }

    fn require_session(&self) -> AppResult<&Session> {
        self.state.session().ok_or(AppError::NotAuthenticated)
    }

    fn require_place(&self, place_id: PlaceId) -> AppResult<&Place> {
        self.state
            .cache()
            .place(place_id)
            .ok_or(AppError::PlaceNotFound(place_id))
    }

    // ========== Data ==========

    /// Fetch places and rating summaries; replaces both or neither
    pub async fn refresh(&mut self) -> AppResult<()> {
        let result = fetch_snapshot(self.api.as_ref())
            .await
            .map_err(AppError::from);
        let snapshot = self.surface("refresh", result)?;

        tracing::info!(
            places = snapshot.places.len(),
            ratings = snapshot.ratings.len(),
            "Places refreshed"
        );
        self.state.install_snapshot(snapshot);
        if self.state.target().is_none() && self.resolver.active().is_some() {
            self.resolver.clear();
            self.eta.send_replace(None);
        }
        self.map.show_places(self.state.cache().places());
        Ok(())
    }

    // ========== Favorites & filters ==========

    /// Toggle a favorite; returns whether the place is a favorite afterwards
    pub fn toggle_favorite(&mut self, place_id: PlaceId) -> AppResult<bool> {
        let result = self.try_toggle_favorite(place_id);
        self.surface("toggle favorite", result)
    }

    fn try_toggle_favorite(&mut self, place_id: PlaceId) -> AppResult<bool> {
        // Stale ids may always be removed; new ones must exist
        if !self.state.favorites().contains(place_id) {
            self.require_place(place_id)?;
        }
        self.state.favorites_mut().toggle(place_id)
    }

    pub fn set_category_filter(&mut self, category: CategoryFilter) {
        self.state.filters_mut().category = category;
    }

    pub fn set_favorites_only(&mut self, enabled: bool) {
        self.state.filters_mut().favorites_only = enabled;
    }

    /// Enable distance sorting; it takes effect once a location is known
    pub fn set_near_me(&mut self, enabled: bool) {
        self.state.filters_mut().near_me = enabled;
        if enabled && self.state.location().is_none() {
            self.notify(Notice::info(
                "Waiting for your location to sort by distance",
            ));
        }
    }

    // ========== Views ==========

    pub fn user_list(&self) -> UserListView {
        render::user_list(
            self.state.cache(),
            self.state.favorites(),
            self.state.location(),
            self.state.filters(),
        )
    }

    pub fn manager_panel(&self) -> Option<ManagerPanelView> {
        render::manager_panel(self.state.session(), self.state.cache())
    }

    pub fn admin_table(&self) -> AdminTableView {
        render::admin_table(self.state.cache())
    }

    // ========== Session ==========

    /// Authenticate against the backend; a success replaces any session
    pub async fn login(&mut self, username: &str, password: &str) -> AppResult<Role> {
        let result = self.try_login(username, password).await;
        let role = self.surface("login", result)?;
        tracing::info!(username, role = ?role, "Logged in");
        self.notify(Notice::success(format!("Logged in as {username}")));
        Ok(role)
    }

    async fn try_login(&mut self, username: &str, password: &str) -> AppResult<Role> {
        let response = self.api.login(username, password).await?;
        let session = Session::from_login(username, response).ok_or_else(|| {
            AppError::Forbidden(format!("account {username} is not bound to a place"))
        })?;
        let role = session.role;
        self.state.start_session(session);
        Ok(role)
    }

    /// Drop the session and any manager/admin data
    pub fn logout(&mut self) {
        if let Some(session) = self.state.end_session() {
            tracing::info!(username = %session.username, "Logged out");
            self.notify(Notice::info("Logged out"));
        }
    }

    // ========== Seats ==========

    /// Validate and send a seat update; the cache only changes on success
    pub async fn submit_seat_update(&mut self, place_id: PlaceId, free_seats: i64) -> AppResult<Place> {
        let result = self.try_seat_update(place_id, free_seats).await;
        let place = self.surface("seat update", result)?;
        self.notify(Notice::success("Saved!"));
        Ok(place)
    }

    async fn try_seat_update(&mut self, place_id: PlaceId, free_seats: i64) -> AppResult<Place> {
        let session = self.require_session()?;
        if !session.can_edit(place_id) {
            return Err(AppError::Forbidden(format!(
                "{} cannot edit place {place_id}",
                session.username
            )));
        }
        let token = session.token().to_string();

        let place = self.require_place(place_id)?;
        if !place.accepts_free_seats(free_seats) {
            return Err(AppError::validation(format!(
                "Free seats must be between 0 and {}",
                place.total_seats
            )));
        }
        let free_seats = u32::try_from(free_seats)
            .map_err(|_| AppError::validation("Free seats must not be negative"))?;

        let updated = self.api.update_seats(&token, place_id, free_seats).await?;
        if updated.free_seats != free_seats {
            tracing::debug!(
                place_id,
                sent = free_seats,
                confirmed = updated.free_seats,
                "Server adjusted the seat count"
            );
        }
        self.state.cache_mut().apply_place(updated.clone());
        self.map.show_places(self.state.cache().places());
        Ok(updated)
    }

    // ========== Bookings ==========

    /// Load the bookings of the manager's place
    pub async fn load_place_bookings(&mut self) -> AppResult<usize> {
        let result = self.try_load_place_bookings().await;
        self.surface("load bookings", result)
    }

    async fn try_load_place_bookings(&mut self) -> AppResult<usize> {
        let session = self.require_session()?;
        let place_id = session.place_id().ok_or_else(|| {
            AppError::Forbidden("admin sessions load all bookings instead".to_string())
        })?;
        let token = session.token().to_string();

        let bookings = self.api.place_bookings(&token, place_id).await?;
        let count = bookings.len();
        self.state.cache_mut().set_bookings(bookings);
        tracing::debug!(place_id, count, "Place bookings loaded");
        Ok(count)
    }

    /// Load every booking (admin only)
    pub async fn load_all_bookings(&mut self) -> AppResult<usize> {
        let result = self.try_load_all_bookings().await;
        self.surface("load all bookings", result)
    }

    async fn try_load_all_bookings(&mut self) -> AppResult<usize> {
        let session = self.require_session()?;
        if !session.is_admin() {
            return Err(AppError::Forbidden(
                "only admins can list all bookings".to_string(),
            ));
        }
        let token = session.token().to_string();

        let bookings = self.api.admin_bookings(&token).await?;
        let count = bookings.len();
        self.state.cache_mut().set_bookings(bookings);
        tracing::debug!(count, "All bookings loaded");
        Ok(count)
    }

    pub async fn create_booking(&mut self, place_id: PlaceId, request: BookingRequest) -> AppResult<Booking> {
        let result = self.try_create_booking(place_id, request).await;
        let booking = self.surface("create booking", result)?;
        self.notify(Notice::success("Booking created"));
        Ok(booking)
    }

    async fn try_create_booking(&self, place_id: PlaceId, request: BookingRequest) -> AppResult<Booking> {
        self.require_place(place_id)?;

        let name = request.name.trim();
        let time = request.time.trim();
        if name.is_empty() {
            return Err(AppError::validation("Please enter your name"));
        }
        if time.is_empty() {
            return Err(AppError::validation("Please choose a time"));
        }
        if request.people == 0 {
            return Err(AppError::validation("At least one person is required"));
        }

        let payload = BookingCreate {
            name: name.to_string(),
            people: request.people,
            time: time.to_string(),
        };
        let booking = self.api.create_booking(place_id, &payload).await?;
        tracing::info!(place_id, people = booking.people, "Booking created");
        Ok(booking)
    }

    // ========== Ratings ==========

    /// Post a rating, then refresh so the summary reflects it
    pub async fn submit_rating(&mut self, place_id: PlaceId, request: RatingRequest) -> AppResult<RatingEntry> {
        let result = self.try_submit_rating(place_id, request).await;
        let entry = self.surface("submit rating", result)?;
        self.notify(Notice::success("Thanks for your rating!"));

        // The rating is stored even if this refresh fails; that failure is
        // surfaced on its own
        let _ = self.refresh().await;
        Ok(entry)
    }

    async fn try_submit_rating(&self, place_id: PlaceId, request: RatingRequest) -> AppResult<RatingEntry> {
        self.require_place(place_id)?;
        if !(1..=5).contains(&request.rating) {
            return Err(AppError::validation("Rating must be between 1 and 5"));
        }

        let non_empty = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let payload = RatingCreate {
            rating: request.rating,
            status: request.status,
            name: non_empty(request.name),
            comment: non_empty(request.comment),
        };
        let entry = self.api.create_rating(place_id, &payload).await?;
        tracing::info!(place_id, rating = entry.rating, status = %entry.status, "Rating submitted");
        Ok(entry)
    }

    /// Rating history of a place
    pub async fn place_ratings(&self, place_id: PlaceId) -> AppResult<Vec<RatingEntry>> {
        let result = self.api.place_ratings(place_id).await.map_err(AppError::from);
        self.surface("load ratings", result)
    }

    // ========== Location ==========

    /// Apply a location fix: move the marker, re-render, re-route
    ///
    /// Returns the new ETA when a route target is selected.
    pub async fn handle_fix(&mut self, fix: Coordinate) -> Option<EtaLabel> {
        self.state.set_location(fix);
        self.animator.animate_to(fix);

        let target = self.state.target()?;
        self.update_route(target).await
    }

    /// Surface a location failure; the last known location stays
    pub fn handle_location_error(&self, error: &LocationError) {
        tracing::warn!(error = %error, "Location unavailable");
        self.notify(Notice::error(error.to_string()));
    }

    /// Feed tracker updates into the controller until cancelled or until
    /// the location source ends
    pub async fn run_location_loop(
        &mut self,
        tracker: &mut LocationTracker,
        cancel: CancellationToken,
    ) {
        let mut fixes = tracker.subscribe();
        let mut errors = tracker.subscribe_errors();
        tracker.activate();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = fixes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let fix = *fixes.borrow_and_update();
                    if let Some(fix) = fix {
                        self.handle_fix(fix).await;
                    }
                }
                error = errors.recv() => match error {
                    Ok(e) => self.handle_location_error(&e),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Location errors dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = tracker.stopped() => {
                    // Pick up a fix published right before the source ended
                    if fixes.has_changed().unwrap_or(false) {
                        let fix = *fixes.borrow_and_update();
                        if let Some(fix) = fix {
                            self.handle_fix(fix).await;
                        }
                    }
                    break;
                }
            }
        }

        tracker.deactivate();
    }

    // ========== Routing ==========

    /// Select the route target and draw the route to it
    ///
    /// Without a known location the target is kept and the route is drawn
    /// on the next fix.
    pub async fn select_target(&mut self, place_id: PlaceId) -> AppResult<Option<EtaLabel>> {
        let result = self.require_place(place_id).map(|_| ());
        self.surface("select target", result)?;

        self.state.select_target(place_id);
        if self.state.location().is_none() {
            self.notify(Notice::info("Waiting for your location to draw the route"));
            return Ok(None);
        }
        Ok(self.update_route(place_id).await)
    }

    async fn update_route(&mut self, place_id: PlaceId) -> Option<EtaLabel> {
        let origin = self.state.location()?;
        let Some(destination) = self.state.cache().place(place_id).map(Place::coordinate) else {
            tracing::debug!(place_id, "Route target no longer exists");
            self.clear_target();
            return None;
        };

        let mode = self.state.travel_mode();
        let label = self.resolver.show(place_id, origin, destination).await.eta(mode);
        self.eta.send_replace(Some(label));
        Some(label)
    }

    pub fn clear_target(&mut self) {
        self.state.clear_target();
        self.resolver.clear();
        self.eta.send_replace(None);
    }

    /// Change the travel mode; only the ETA label is recomputed
    pub fn set_travel_mode(&mut self, mode: TravelMode) -> Option<EtaLabel> {
        self.state.set_travel_mode(mode);
        let label = self.resolver.eta(mode);
        self.eta.send_replace(label);
        label
    }

    pub fn toggle_travel_mode(&mut self) -> (TravelMode, Option<EtaLabel>) {
        let mode = self.state.travel_mode().toggled();
        (mode, self.set_travel_mode(mode))
    }

    // ========== Delegation ==========

    /// Interpret identifying data from a rendered row and run the action
    pub async fn dispatch_target(&mut self, target: &DelegateTarget) -> AppResult<Dispatched> {
        let action = self.surface("dispatch", Action::try_from(target))?;
        self.dispatch(action).await
    }

    /// Single entry point for delegated actions
    pub async fn dispatch(&mut self, action: Action) -> AppResult<Dispatched> {
        tracing::debug!(action = ?action, "Dispatching");
        match action {
            Action::ToggleFavorite(place_id) => {
                let favorite = self.toggle_favorite(place_id)?;
                Ok(Dispatched::Favorite { place_id, favorite })
            }
            Action::ShowRoute(place_id) => Ok(Dispatched::Route(self.select_target(place_id).await?)),
            Action::ClearRoute => {
                self.clear_target();
                Ok(Dispatched::RouteCleared)
            }
            Action::ToggleTravelMode => {
                let (mode, eta) = self.toggle_travel_mode();
                Ok(Dispatched::TravelMode(mode, eta))
            }
            Action::Book(place_id) => {
                let result = self.require_place(place_id).map(|_| ());
                self.surface("open booking form", result)?;
                Ok(Dispatched::BookingForm(place_id))
            }
            Action::Rate(place_id) => {
                let result = self.require_place(place_id).map(|_| ());
                self.surface("open rating form", result)?;
                Ok(Dispatched::RatingForm(place_id))
            }
            Action::ShowRatings(place_id) => {
                let ratings = self.place_ratings(place_id).await?;
                Ok(Dispatched::Ratings(place_id, ratings))
            }
            Action::SaveSeats {
                place_id,
                free_seats,
            } => Ok(Dispatched::SeatsSaved(
                self.submit_seat_update(place_id, free_seats).await?,
            )),
        }
    }
}
