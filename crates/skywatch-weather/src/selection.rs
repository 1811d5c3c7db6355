//! Which location the user is looking at, and what is highlighted.

use tokio::sync::watch;

use crate::types::{Coordinates, HourlyForecast, QueryTarget};

/// In-memory selection state; a restart re-runs resolution.
///
/// City and coordinates are mutually exclusive. `weather_description` is
/// independent of the location fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationSelection {
    pub selected_city: Option<String>,
    pub selected_lat: Option<f64>,
    pub selected_lon: Option<f64>,
    pub selected_hour_index: Option<usize>,
    pub weather_description: String,
}

impl LocationSelection {
    /// True once a city or coordinate selection has been committed
    pub fn has_location(&self) -> bool {
        self.selected_city.is_some() || self.selected_lat.is_some()
    }

    /// The committed query target, if any
    pub fn target(&self) -> Option<QueryTarget> {
        if let Some(city) = &self.selected_city {
            return Some(QueryTarget::City(city.clone()));
        }
        match (self.selected_lat, self.selected_lon) {
            (Some(lat), Some(lon)) => Some(QueryTarget::coords(lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherAction {
    SetSelectedCity(String),
    SetSelectedCoords(Coordinates),
    SetSelectedHourIndex(Option<usize>),
    SetWeatherDescription(String),
    ResetWeather,
}

/// Apply an action to a selection, returning the next state.
pub fn reduce(state: &LocationSelection, action: WeatherAction) -> LocationSelection {
    match action {
        WeatherAction::SetSelectedCity(city) => LocationSelection {
            selected_city: Some(city),
            selected_lat: None,
            selected_lon: None,
            selected_hour_index: None,
            weather_description: state.weather_description.clone(),
        },
        WeatherAction::SetSelectedCoords(coords) => LocationSelection {
            selected_city: None,
            selected_lat: Some(coords.lat),
            selected_lon: Some(coords.lon),
            selected_hour_index: None,
            weather_description: state.weather_description.clone(),
        },
        WeatherAction::SetSelectedHourIndex(index) => LocationSelection {
            selected_hour_index: index,
            ..state.clone()
        },
        WeatherAction::SetWeatherDescription(description) => LocationSelection {
            weather_description: description,
            ..state.clone()
        },
        WeatherAction::ResetWeather => LocationSelection::default(),
    }
}

/// Shared selection store; subscribers are notified only on real changes.
#[derive(Debug)]
pub struct SelectionStore {
    tx: watch::Sender<LocationSelection>,
}

impl SelectionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LocationSelection::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> LocationSelection {
        self.tx.borrow().clone()
    }

    pub fn target(&self) -> Option<QueryTarget> {
        self.tx.borrow().target()
    }

    pub fn subscribe(&self) -> watch::Receiver<LocationSelection> {
        self.tx.subscribe()
    }

    /// Apply `action`; returns whether the state changed.
    pub fn dispatch(&self, action: WeatherAction) -> bool {
        self.modify(|_| Some(action))
    }

    /// Decide on an action against the current state and apply it without
    /// letting another writer slip in between.
    pub fn modify<F>(&self, decide: F) -> bool
    where
        F: FnOnce(&LocationSelection) -> Option<WeatherAction>,
    {
        self.tx.send_if_modified(|state| {
            let Some(action) = decide(state) else {
                return false;
            };
            let next = reduce(state, action);
            if next == *state {
                false
            } else {
                *state = next;
                true
            }
        })
    }

    pub fn set_selected_city(&self, city: impl Into<String>) -> bool {
        self.dispatch(WeatherAction::SetSelectedCity(city.into()))
    }

    pub fn set_selected_coords(&self, coords: Coordinates) -> bool {
        self.dispatch(WeatherAction::SetSelectedCoords(coords))
    }

    pub fn set_selected_hour_index(&self, index: Option<usize>) -> bool {
        self.dispatch(WeatherAction::SetSelectedHourIndex(index))
    }

    pub fn set_weather_description(&self, description: impl Into<String>) -> bool {
        self.dispatch(WeatherAction::SetWeatherDescription(description.into()))
    }

    pub fn reset_weather(&self) -> bool {
        self.dispatch(WeatherAction::ResetWeather)
    }

    /// Highlight hour `index` of `hourly` and adopt its description.
    /// Out-of-range indices are ignored.
    pub fn select_hour(&self, index: usize, hourly: &[HourlyForecast]) -> bool {
        let Some(hour) = hourly.get(index) else {
            tracing::debug!("Ignoring hour {} of {}", index, hourly.len());
            return false;
        };
        let moved = self.set_selected_hour_index(Some(index));
        let described = self.set_weather_description(hour.description.clone());
        moved || described
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}
