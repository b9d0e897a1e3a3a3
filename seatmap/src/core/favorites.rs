//! FavoritesStore - 收藏的场所
//!
//! The only client state that survives a restart: a JSON list of place ids
//! in `{data_dir}/favorites.json`. Stale ids are tolerated and never
//! reconciled against the current place list.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use shared::models::PlaceId;

use super::error::AppError;

const FAVORITES_FILE: &str = "favorites.json";

/// Persisted set of favorite place ids
#[derive(Debug)]
pub struct FavoritesStore {
    file_path: PathBuf,
    ids: BTreeSet<PlaceId>,
}

impl FavoritesStore {
    /// Empty store backed by `{data_dir}/favorites.json` (nothing read)
    pub fn new(data_dir: &Path) -> Self {
        Self {
            file_path: data_dir.join(FAVORITES_FILE),
            ids: BTreeSet::new(),
        }
    }

    /// Load the persisted favorites
    ///
    /// Never fails: a missing file is an empty set, and an unreadable or
    /// corrupt file resets to an empty set as well.
    pub fn load(data_dir: &Path) -> Self {
        let mut store = Self::new(data_dir);

        if !store.file_path.exists() {
            return store;
        }

        let parsed = std::fs::read_to_string(&store.file_path)
            .map_err(AppError::from)
            .and_then(|content| {
                serde_json::from_str::<Vec<PlaceId>>(&content).map_err(AppError::from)
            });

        match parsed {
            Ok(ids) => {
                store.ids = ids.into_iter().collect();
                tracing::debug!(count = store.ids.len(), "Favorites loaded");
            }
            Err(e) => {
                tracing::warn!(
                    path = %store.file_path.display(),
                    error = %e,
                    "Favorites file unreadable, starting with an empty set"
                );
            }
        }
        store
    }

    /// 保存到文件
    fn save(&self) -> Result<(), AppError> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let ids: Vec<PlaceId> = self.ids.iter().copied().collect();
        std::fs::write(&self.file_path, serde_json::to_string(&ids)?)?;
        Ok(())
    }

    /// Add the id if absent, remove it if present; persisted immediately
    ///
    /// Returns whether the place is a favorite afterwards. When persisting
    /// fails the in-memory set is rolled back so memory and disk agree.
    pub fn toggle(&mut self, place_id: PlaceId) -> Result<bool, AppError> {
        let now_favorite = if self.ids.remove(&place_id) {
            false
        } else {
            self.ids.insert(place_id);
            true
        };

        if let Err(e) = self.save() {
            if now_favorite {
                self.ids.remove(&place_id);
            } else {
                self.ids.insert(place_id);
            }
            return Err(e);
        }

        tracing::debug!(place_id, favorite = now_favorite, "Favorite toggled");
        Ok(now_favorite)
    }

    pub fn contains(&self, place_id: PlaceId) -> bool {
        self.ids.contains(&place_id)
    }

    pub fn ids(&self) -> &BTreeSet<PlaceId> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}
