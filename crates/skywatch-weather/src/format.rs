//! Display helpers for weather values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::types::Units;

/// Background style derived from a condition description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backdrop {
    Thunderstorm,
    Rain,
    Snow,
    Cloudy,
    Clear,
    Default,
}

impl Backdrop {
    /// Classify by keyword; the first matching group wins.
    pub fn from_description(description: &str) -> Self {
        let desc = description.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| desc.contains(w));

        if has(&["thunder", "storm"]) {
            Self::Thunderstorm
        } else if has(&["rain", "drizzle"]) {
            Self::Rain
        } else if has(&["snow", "sleet", "ice"]) {
            Self::Snow
        } else if has(&["cloud", "overcast"]) {
            Self::Cloudy
        } else if has(&["clear", "sun", "few clouds"]) {
            Self::Clear
        } else {
            Self::Default
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Thunderstorm => "weather-bg-thunderstorm",
            Self::Rain => "weather-bg-rain",
            Self::Snow => "weather-bg-snow",
            Self::Cloudy => "weather-bg-cloudy",
            Self::Clear => "weather-bg-clear",
            Self::Default => "weather-bg-default",
        }
    }
}

pub fn weather_bg_class(description: &str) -> &'static str {
    Backdrop::from_description(description).class_name()
}

/// `12.6, Metric` -> `13°C`
pub fn format_temp(temp: f64, units: Units) -> String {
    // Halves round up, so -3.5 shows as -3; `as` folds -0.0 into 0
    let rounded = (temp + 0.5).floor() as i64;
    format!("{}°{}", rounded, units.symbol())
}

/// Wall-clock time of an API timestamp. Offsets are kept as sent rather than
/// converted to the host zone.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `2025-01-06` -> `Mon, Jan 6`; unparseable input is returned unchanged
pub fn format_date(value: &str) -> String {
    match parse_timestamp(value) {
        Some(dt) => dt.format("%a, %b %-d").to_string(),
        None => value.to_string(),
    }
}

/// `2025-01-06T15:05:00Z` -> `3:05 PM`; unparseable input is returned unchanged
pub fn format_time(value: &str) -> String {
    match parse_timestamp(value) {
        Some(dt) => dt.format("%-I:%M %p").to_string(),
        None => value.to_string(),
    }
}
