//! Place/Rating data cache
//!
//! In-memory mirror of the last fetched places and rating summaries. Both
//! collections are always replaced together so ratings never refer to a
//! different snapshot than the places they describe.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use seatmap_client::{ClientResult, PlacesApi};
use shared::models::{Booking, Place, PlaceId, RatingSummary};

/// Result of one successful refresh
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub places: Vec<Place>,
    pub ratings: Vec<RatingSummary>,
}

/// Fetch places and rating summaries concurrently
///
/// Fails as a whole when either read fails.
pub async fn fetch_snapshot(api: &dyn PlacesApi) -> ClientResult<Snapshot> {
    let (places, ratings) = tokio::try_join!(api.places(), api.rating_summaries())?;
    Ok(Snapshot { places, ratings })
}

/// 场所和评分缓存
#[derive(Debug, Default)]
pub struct DataCache {
    places: Vec<Place>,
    ratings: HashMap<PlaceId, RatingSummary>,
    /// Bookings visible to the current session (one place or all)
    bookings: Vec<Booking>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace places and ratings in one step
    pub fn install(&mut self, snapshot: Snapshot) {
        self.places = snapshot.places;
        self.ratings = snapshot
            .ratings
            .into_iter()
            .map(|r| (r.place_id, r))
            .collect();
        self.refreshed_at = Some(Utc::now());
    }

    /// Replace one place with a server-confirmed record
    ///
    /// A place missing from the cache (e.g. dropped by a newer refresh) is
    /// appended: the confirmed record is the latest word on that place.
    pub fn apply_place(&mut self, place: Place) {
        match self.places.iter_mut().find(|p| p.id == place.id) {
            Some(slot) => *slot = place,
            None => self.places.push(place),
        }
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn place(&self, id: PlaceId) -> Option<&Place> {
        self.places.iter().find(|p| p.id == id)
    }

    pub fn rating(&self, place_id: PlaceId) -> Option<&RatingSummary> {
        self.ratings.get(&place_id)
    }

    pub fn rating_count(&self) -> usize {
        self.ratings.len()
    }

    /// Distinct categories, sorted (for the category filter)
    pub fn categories(&self) -> Vec<String> {
        self.places
            .iter()
            .map(|p| p.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn is_loaded(&self) -> bool {
        self.refreshed_at.is_some()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    // ============ Bookings (manager/admin) ============

    pub fn set_bookings(&mut self, bookings: Vec<Booking>) {
        self.bookings = bookings;
    }

    pub fn clear_bookings(&mut self) {
        self.bookings.clear();
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    /// Bookings per place; bookings without a place id are not counted
    pub fn booking_counts(&self) -> HashMap<PlaceId, usize> {
        let mut counts = HashMap::new();
        for booking in &self.bookings {
            if let Some(place_id) = booking.place_id {
                *counts.entry(place_id).or_insert(0) += 1;
            }
        }
        counts
    }
}
