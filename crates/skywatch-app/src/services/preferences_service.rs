use skywatch_weather::{FetchError, PreferenceState, Preferences, PreferencesUpdate};

use crate::app_services::AppServices;

#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Preferences are still loading")]
    Loading,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Load (or reuse) the saved preferences.
pub async fn load(services: &AppServices) -> Result<Preferences, PreferencesError> {
    if !services.session().is_authenticated() {
        return Err(PreferencesError::NotSignedIn);
    }
    match services.preferences().load().await {
        PreferenceState::Loaded(prefs) => Ok(prefs),
        PreferenceState::Failed(e) => Err(e.into()),
        PreferenceState::Pending => Err(PreferencesError::Loading),
    }
}

pub async fn update(services: &AppServices, update: &PreferencesUpdate) -> Result<Preferences, PreferencesError> {
    if !services.session().is_authenticated() {
        return Err(PreferencesError::NotSignedIn);
    }
    Ok(services.preferences().update(update).await?)
}
