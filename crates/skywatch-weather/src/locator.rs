//! One-shot device location.
//!
//! The first call to [`DeviceLocator::locate`] performs a single bounded read;
//! the outcome is kept for the life of the locator and never re-read.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::types::{Coordinates, LocationError};

/// Default bound on the device read
pub const DEFAULT_LOCATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Something that can report where the host is.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn read_position(&self) -> Result<Coordinates, LocationError>;
}

/// A host with a known, fixed position
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn read_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// A host without positioning capability
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationSource for NoLocation {
    async fn read_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Terminal result of the device read
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocatorOutcome {
    Success(Coordinates),
    Denied,
    Unsupported,
    Timeout,
}

impl LocatorOutcome {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Success(c) => Some(*c),
            _ => None,
        }
    }
}

impl From<Result<Coordinates, LocationError>> for LocatorOutcome {
    fn from(result: Result<Coordinates, LocationError>) -> Self {
        match result {
            Ok(c) => Self::Success(c),
            Err(LocationError::Unsupported) => Self::Unsupported,
            Err(LocationError::Timeout) => Self::Timeout,
            Err(LocationError::PermissionDenied) | Err(LocationError::Other(_)) => Self::Denied,
        }
    }
}

/// What the resolver sees of the locator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocatorState {
    Pending,
    Finished(LocatorOutcome),
}

impl LocatorState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Finished(outcome) => outcome.coordinates(),
            Self::Pending => None,
        }
    }
}

pub struct DeviceLocator {
    source: Arc<dyn LocationSource>,
    timeout: Duration,
    outcome: OnceCell<LocatorOutcome>,
}

impl DeviceLocator {
    pub fn new(source: Arc<dyn LocationSource>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            outcome: OnceCell::new(),
        }
    }

    /// Read the device position once; later calls return the cached outcome.
    pub async fn locate(&self) -> LocatorOutcome {
        *self
            .outcome
            .get_or_init(|| async {
                tracing::debug!("Requesting device location");
                let outcome = match tokio::time::timeout(self.timeout, self.source.read_position()).await {
                    Ok(result) => LocatorOutcome::from(result),
                    Err(_) => LocatorOutcome::Timeout,
                };
                match outcome {
                    LocatorOutcome::Success(c) => {
                        tracing::info!("Device location: {}, {}", c.lat, c.lon)
                    }
                    other => tracing::info!("Device location unavailable: {:?}", other),
                }
                outcome
            })
            .await
    }

    pub fn state(&self) -> LocatorState {
        match self.outcome.get() {
            Some(outcome) => LocatorState::Finished(*outcome),
            None => LocatorState::Pending,
        }
    }
}

impl std::fmt::Debug for DeviceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLocator")
            .field("timeout", &self.timeout)
            .field("state", &self.state())
            .finish()
    }
}
