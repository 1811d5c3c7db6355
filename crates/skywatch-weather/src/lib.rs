//! Weather state for the SkyWatch client
//!
//! Location selection, one-shot device positioning, resolution of what to
//! show, and cached weather and preference reads. Transport lives elsewhere;
//! this crate only sees the source traits.

pub mod cache;
pub mod format;
pub mod locator;
pub mod preferences;
pub mod queries;
pub mod resolver;
pub mod retry;
pub mod selection;
pub mod types;

pub use types::*;
pub use cache::{CachePolicy, EntryStatus, QueryCache, QueryState};
pub use format::{format_date, format_temp, format_time, weather_bg_class, Backdrop};
pub use locator::{DeviceLocator, FixedLocation, LocationSource, LocatorOutcome, LocatorState, NoLocation};
pub use preferences::{PreferenceFetcher, PreferenceSource, PreferenceState};
pub use queries::{Query, WeatherQueries, WeatherSource};
pub use resolver::{evaluate, resolve, Resolution, FALLBACK_CITY};
pub use retry::{with_retry, RetryConfig};
pub use selection::{LocationSelection, SelectionStore, WeatherAction};
