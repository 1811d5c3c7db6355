//! Authentication events published by the network layer.

use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// An authenticated request came back 401
    Rejected,
}

/// Broadcast bus carrying [`AuthEvent`]s from the API client to subscribers.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, event: AuthEvent) {
        let receivers = self.tx.send(event).unwrap_or(0);
        tracing::debug!("Auth event {:?} delivered to {} subscribers", event, receivers);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_rejection() {
        let events = AuthEvents::new();
        let mut rx = events.subscribe();

        events.emit(AuthEvent::Rejected);

        assert_eq!(rx.recv().await.unwrap(), AuthEvent::Rejected);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let events = AuthEvents::new();
        events.emit(AuthEvent::Rejected);
    }
}
