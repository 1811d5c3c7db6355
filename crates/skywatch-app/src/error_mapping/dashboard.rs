use crate::services::DashboardError;
use skywatch_core::{AppError, WeatherError};

use super::fetch_error;

impl From<DashboardError> for AppError {
    fn from(e: DashboardError) -> Self {
        match e {
            DashboardError::NoLocation => AppError::Weather(WeatherError::NoLocation),
            DashboardError::Fetch(f) => fetch_error(f),
        }
    }
}
