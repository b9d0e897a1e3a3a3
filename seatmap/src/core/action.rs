//! Delegated actions
//!
//! Rendered rows only carry identifying data (`action`, `place_id`, and an
//! optional input `value`). A single handler turns that data into an
//! [`Action`] and hands it to the controller, so nothing has to be
//! re-attached after a render.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shared::models::PlaceId;

use super::error::AppError;

/// Action names carried by rendered rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    ToggleFavorite,
    ShowRoute,
    ClearRoute,
    ToggleTravelMode,
    Book,
    Rate,
    ShowRatings,
    SaveSeats,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::ToggleFavorite => "toggle-favorite",
            ActionKind::ShowRoute => "show-route",
            ActionKind::ClearRoute => "clear-route",
            ActionKind::ToggleTravelMode => "toggle-travel-mode",
            ActionKind::Book => "book",
            ActionKind::Rate => "rate",
            ActionKind::ShowRatings => "show-ratings",
            ActionKind::SaveSeats => "save-seats",
        }
    }

    /// Whether the action needs a `place_id`
    fn needs_place(self) -> bool {
        !matches!(self, ActionKind::ClearRoute | ActionKind::ToggleTravelMode)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "toggle-favorite" => Ok(ActionKind::ToggleFavorite),
            "show-route" => Ok(ActionKind::ShowRoute),
            "clear-route" => Ok(ActionKind::ClearRoute),
            "toggle-travel-mode" => Ok(ActionKind::ToggleTravelMode),
            "book" => Ok(ActionKind::Book),
            "rate" => Ok(ActionKind::Rate),
            "show-ratings" => Ok(ActionKind::ShowRatings),
            "save-seats" => Ok(ActionKind::SaveSeats),
            other => Err(AppError::validation(format!("Unknown action: {other}"))),
        }
    }
}

/// Identifying data read from the element that received the event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateTarget {
    pub action: String,
    #[serde(default)]
    pub place_id: Option<String>,
    /// Input value next to the element (seat editor)
    #[serde(default)]
    pub value: Option<String>,
}

impl DelegateTarget {
    pub fn new(action: ActionKind, place_id: Option<PlaceId>) -> Self {
        Self {
            action: action.as_str().to_string(),
            place_id: place_id.map(|id| id.to_string()),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Interpreted user action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ToggleFavorite(PlaceId),
    ShowRoute(PlaceId),
    ClearRoute,
    ToggleTravelMode,
    /// Open the booking form for a place
    Book(PlaceId),
    /// Open the rating form for a place
    Rate(PlaceId),
    ShowRatings(PlaceId),
    SaveSeats { place_id: PlaceId, free_seats: i64 },
}

impl TryFrom<&DelegateTarget> for Action {
    type Error = AppError;

    fn try_from(target: &DelegateTarget) -> Result<Self, Self::Error> {
        let kind: ActionKind = target.action.parse()?;

        let place_id = if kind.needs_place() {
            let raw = target
                .place_id
                .as_deref()
                .ok_or_else(|| AppError::validation(format!("Action {kind} needs a place id")))?;
            Some(
                raw.trim()
                    .parse::<PlaceId>()
                    .map_err(|_| AppError::validation(format!("Invalid place id: {raw}")))?,
            )
        } else {
            None
        };

        let action = match (kind, place_id) {
            (ActionKind::ClearRoute, _) => Action::ClearRoute,
            (ActionKind::ToggleTravelMode, _) => Action::ToggleTravelMode,
            (_, None) => {
                return Err(AppError::validation(format!("Action {kind} needs a place id")));
            }
            (ActionKind::ToggleFavorite, Some(id)) => Action::ToggleFavorite(id),
            (ActionKind::ShowRoute, Some(id)) => Action::ShowRoute(id),
            (ActionKind::Book, Some(id)) => Action::Book(id),
            (ActionKind::Rate, Some(id)) => Action::Rate(id),
            (ActionKind::ShowRatings, Some(id)) => Action::ShowRatings(id),
            (ActionKind::SaveSeats, Some(place_id)) => {
                let free_seats = target
                    .value
                    .as_deref()
                    .and_then(|v| v.trim().parse::<i64>().ok())
                    .ok_or_else(|| AppError::validation("Please enter a number"))?;
                Action::SaveSeats {
                    place_id,
                    free_seats,
                }
            }
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_place_actions() {
        let target = DelegateTarget::new(ActionKind::ToggleFavorite, Some(7));
        assert_eq!(Action::try_from(&target).unwrap(), Action::ToggleFavorite(7));

        let target = DelegateTarget {
            action: "show-route".to_string(),
            place_id: Some(" 3 ".to_string()),
            value: None,
        };
        assert_eq!(Action::try_from(&target).unwrap(), Action::ShowRoute(3));
    }

    #[test]
    fn test_parse_save_seats_value() {
        let target = DelegateTarget::new(ActionKind::SaveSeats, Some(1)).with_value("60");
        assert_eq!(
            Action::try_from(&target).unwrap(),
            Action::SaveSeats {
                place_id: 1,
                free_seats: 60
            }
        );

        let target = DelegateTarget::new(ActionKind::SaveSeats, Some(1)).with_value("abc");
        let err = Action::try_from(&target).unwrap_err();
        assert_eq!(err.to_string(), "Please enter a number");

        let target = DelegateTarget::new(ActionKind::SaveSeats, Some(1));
        assert!(Action::try_from(&target).is_err());
    }

    #[test]
    fn test_actions_without_place() {
        let target = DelegateTarget::new(ActionKind::ToggleTravelMode, None);
        assert_eq!(Action::try_from(&target).unwrap(), Action::ToggleTravelMode);
        let target = DelegateTarget::new(ActionKind::ClearRoute, None);
        assert_eq!(Action::try_from(&target).unwrap(), Action::ClearRoute);
    }

    #[test]
    fn test_invalid_targets() {
        let unknown = DelegateTarget {
            action: "explode".to_string(),
            ..DelegateTarget::default()
        };
        assert!(Action::try_from(&unknown).is_err());

        let missing = DelegateTarget::new(ActionKind::Book, None);
        assert!(Action::try_from(&missing).is_err());

        let bad_id = DelegateTarget {
            action: "rate".to_string(),
            place_id: Some("x".to_string()),
            value: None,
        };
        assert!(Action::try_from(&bad_id).is_err());
    }

    #[test]
    fn test_kind_names_round_trip() {
        let kind = ActionKind::SaveSeats;
        assert_eq!(kind.as_str().parse::<ActionKind>().unwrap(), kind);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"save-seats\"");
    }
}
