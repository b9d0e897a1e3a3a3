//! View Renderers
//!
//! Pure projections of the data cache (plus filters, favorites, session and
//! location) into view models. Each call builds the whole view; callers
//! replace their previous output with it. Rows carry the place id and the
//! actions they offer so a front end can delegate clicks back to
//! [`Controller::dispatch`](super::controller::Controller::dispatch).

use std::cmp::Ordering;

use serde::Serialize;
use shared::geo::{Coordinate, haversine_km};
use shared::models::{Booking, CrowdStatus, Place, PlaceId};

use super::action::ActionKind;
use super::cache::DataCache;
use super::favorites::FavoritesStore;
use super::session::Session;

pub const EMPTY_LIST_MESSAGE: &str = "No places found.";
pub const EMPTY_PANEL_MESSAGE: &str = "No places to edit.";

/// Category filter of the user list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// `"all"` (any case) or an empty value means no filter
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(value.to_string())
        }
    }

    pub fn matches(&self, place: &Place) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => place.category == *category,
        }
    }
}

/// UI filter state of the user list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilters {
    pub category: CategoryFilter,
    pub favorites_only: bool,
    /// Sort by distance from the user (needs a known location)
    pub near_me: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Full,
}

impl Availability {
    pub fn of(place: &Place) -> Self {
        if place.is_full() {
            Availability::Full
        } else {
            Availability::Available
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Availability::Available => "Available",
            Availability::Full => "Full",
        }
    }
}

/// One card of the user list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceRow {
    pub place_id: PlaceId,
    pub name: String,
    pub category: String,
    pub address: String,
    pub free_seats: u32,
    pub total_seats: u32,
    pub availability: Availability,
    /// Average rating, `None` when nobody rated yet
    pub rating: Option<f64>,
    pub rating_count: u32,
    pub crowd: Option<CrowdStatus>,
    pub favorite: bool,
    /// Kilometres from the user, when the location is known
    pub distance_km: Option<f64>,
    pub actions: Vec<ActionKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserListView {
    pub rows: Vec<PlaceRow>,
    /// Set when no row survives the filters
    pub empty_message: Option<&'static str>,
}

/// User list: category filter → favorites filter → distance sort → rows
pub fn user_list(
    cache: &DataCache,
    favorites: &FavoritesStore,
    location: Option<Coordinate>,
    filters: &ViewFilters,
) -> UserListView {
    let mut places: Vec<(&Place, Option<f64>)> = cache
        .places()
        .iter()
        .filter(|p| filters.category.matches(p))
        .filter(|p| !filters.favorites_only || favorites.contains(p.id))
        .map(|p| (p, location.map(|here| haversine_km(here, p.coordinate()))))
        .collect();

    if filters.near_me && location.is_some() {
        places.sort_by(|(_, a), (_, b)| match (a, b) {
            (Some(a), Some(b)) => a.total_cmp(b),
            _ => Ordering::Equal,
        });
    }

    let rows: Vec<PlaceRow> = places
        .into_iter()
        .map(|(place, distance_km)| {
            let summary = cache.rating(place.id);
            let rated = summary.filter(|s| s.count > 0);
            PlaceRow {
                place_id: place.id,
                name: place.name.clone(),
                category: place.category.clone(),
                address: place.address.clone(),
                free_seats: place.free_seats,
                total_seats: place.total_seats,
                availability: Availability::of(place),
                rating: rated.map(|s| s.avg_rating),
                rating_count: rated.map_or(0, |s| s.count),
                crowd: summary.and_then(|s| s.last_status),
                favorite: favorites.contains(place.id),
                distance_km,
                actions: vec![
                    ActionKind::ToggleFavorite,
                    ActionKind::ShowRoute,
                    ActionKind::Book,
                    ActionKind::Rate,
                    ActionKind::ShowRatings,
                ],
            }
        })
        .collect();

    let empty_message = rows.is_empty().then_some(EMPTY_LIST_MESSAGE);
    UserListView {
        rows,
        empty_message,
    }
}

/// Seat editor of the manager panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatEditor {
    pub place_id: PlaceId,
    pub name: String,
    pub category: String,
    pub total_seats: u32,
    /// Prefilled input value
    pub free_seats: u32,
    /// Input bounds `[min, max]`
    pub min: u32,
    pub max: u32,
    pub action: ActionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerPanelView {
    pub username: String,
    /// `None` when the bound place is not in the cache
    pub editor: Option<SeatEditor>,
    pub bookings: Vec<Booking>,
    pub empty_message: Option<&'static str>,
}

/// Manager panel: the place bound to the session and its bookings
///
/// `None` without a manager session (admins get [`admin_table`]).
pub fn manager_panel(session: Option<&Session>, cache: &DataCache) -> Option<ManagerPanelView> {
    let session = session?;
    let place_id = session.place_id()?;

    let editor = cache.place(place_id).map(|place| SeatEditor {
        place_id: place.id,
        name: place.name.clone(),
        category: place.category.clone(),
        total_seats: place.total_seats,
        free_seats: place.free_seats,
        min: 0,
        max: place.total_seats,
        action: ActionKind::SaveSeats,
    });
    let empty_message = editor.is_none().then_some(EMPTY_PANEL_MESSAGE);

    Some(ManagerPanelView {
        username: session.username.clone(),
        editor,
        bookings: cache.bookings().to_vec(),
        empty_message,
    })
}

/// One row of the admin table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminRow {
    pub place_id: PlaceId,
    pub name: String,
    pub category: String,
    pub free_seats: u32,
    pub total_seats: u32,
    pub avg_rating: Option<f64>,
    pub rating_count: u32,
    pub last_status: Option<CrowdStatus>,
    pub booking_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminTableView {
    pub rows: Vec<AdminRow>,
    pub total_bookings: usize,
}

/// Admin table: every place left-joined with its rating summary and its
/// booking count (0 when it has none)
pub fn admin_table(cache: &DataCache) -> AdminTableView {
    let counts = cache.booking_counts();
    let rows = cache
        .places()
        .iter()
        .map(|place| {
            let summary = cache.rating(place.id);
            AdminRow {
                place_id: place.id,
                name: place.name.clone(),
                category: place.category.clone(),
                free_seats: place.free_seats,
                total_seats: place.total_seats,
                avg_rating: summary.filter(|s| s.count > 0).map(|s| s.avg_rating),
                rating_count: summary.map_or(0, |s| s.count),
                last_status: summary.and_then(|s| s.last_status),
                booking_count: counts.get(&place.id).copied().unwrap_or(0),
            }
        })
        .collect();

    AdminTableView {
        rows,
        total_bookings: cache.bookings().len(),
    }
}
