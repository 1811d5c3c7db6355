//! Location resolution.
//!
//! Decides which single location the dashboard shows. Precedence is:
//! existing selection, saved preference city, device coordinates, then the
//! fallback city. While the device read is pending and no preference city is
//! known, nothing is committed so a better signal can still win.

use crate::locator::LocatorState;
use crate::selection::{LocationSelection, SelectionStore, WeatherAction};
use crate::types::Coordinates;

/// Shown when neither a preference nor a device position is available.
pub const FALLBACK_CITY: &str = "London";

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A selection already exists; resolution is complete.
    AlreadySelected,
    UsePreference(String),
    UseDevice(Coordinates),
    Fallback,
    /// Device read still pending, no preference city.
    Waiting,
}

impl Resolution {
    /// The store action this resolution commits, if any
    pub fn action(&self) -> Option<WeatherAction> {
        match self {
            Self::UsePreference(city) => Some(WeatherAction::SetSelectedCity(city.clone())),
            Self::UseDevice(coords) => Some(WeatherAction::SetSelectedCoords(*coords)),
            Self::Fallback => Some(WeatherAction::SetSelectedCity(FALLBACK_CITY.to_string())),
            Self::AlreadySelected | Self::Waiting => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Waiting)
    }
}

/// Pure precedence decision; rule order, not arrival order, decides ties.
pub fn resolve(
    selection: &LocationSelection,
    preferred_city: Option<&str>,
    locator: LocatorState,
) -> Resolution {
    if selection.has_location() {
        return Resolution::AlreadySelected;
    }

    if let Some(city) = preferred_city {
        return Resolution::UsePreference(city.to_string());
    }

    match locator {
        LocatorState::Finished(outcome) => match outcome.coordinates() {
            Some(coords) => Resolution::UseDevice(coords),
            None => Resolution::Fallback,
        },
        LocatorState::Pending => Resolution::Waiting,
    }
}

/// Evaluate against the store's current state and commit the result.
///
/// Safe to call on every input change: an existing selection is never
/// overridden and re-committing the same target is a no-op.
pub fn evaluate(
    store: &SelectionStore,
    preferred_city: Option<&str>,
    locator: LocatorState,
) -> Resolution {
    let mut resolution = Resolution::Waiting;
    let changed = store.modify(|state| {
        resolution = resolve(state, preferred_city, locator);
        resolution.action()
    });

    if changed {
        tracing::info!("Resolved location: {:?}", resolution);
    } else {
        tracing::debug!("Resolver pass without commit: {:?}", resolution);
    }
    resolution
}
