use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::{AuthEvent, AuthEvents};
use crate::session::{reduce, Credentials, Session, SessionAction};
use crate::storage::SessionStorage;

/// Process-wide session state.
///
/// All writes go through [`SessionStore::dispatch`]; persistence follows each
/// action. Storage failures are logged and never surface to the caller.
pub struct SessionStore {
    state: RwLock<Session>,
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    /// Create a store, restoring any persisted session
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let restored = match storage.load() {
            Ok(Some(session)) => session,
            Ok(None) => Session::default(),
            Err(e) => {
                tracing::warn!("Discarding unreadable session: {:#}", e);
                Session::default()
            }
        };

        Self {
            state: RwLock::new(restored),
            storage,
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.read().access_token.clone()
    }

    pub fn dispatch(&self, action: SessionAction) {
        let mut state = self.state.write();
        let persist = match &action {
            SessionAction::Logout => Persist::Clear,
            SessionAction::SetCredentials(_) | SessionAction::SetRole(_) => Persist::Save,
        };
        let next = reduce(&state, action);
        *state = next;

        let result = match persist {
            Persist::Save => self.storage.save(&state),
            Persist::Clear => self.storage.clear(),
        };
        if let Err(e) = result {
            tracing::warn!("Session persistence failed: {:#}", e);
        }
    }

    pub fn set_credentials(&self, credentials: Credentials) {
        tracing::info!("Signed in as {}", credentials.username);
        self.dispatch(SessionAction::SetCredentials(credentials));
    }

    pub fn set_role(&self, role: impl Into<String>) {
        self.dispatch(SessionAction::SetRole(role.into()));
    }

    pub fn logout(&self) {
        tracing::info!("Signing out");
        self.dispatch(SessionAction::Logout);
    }

    /// Log out whenever the network layer reports a rejected token.
    ///
    /// The listener runs until `shutdown` is cancelled or the bus closes.
    /// Events already queued when `shutdown` fires are still applied.
    pub fn listen(
        self: &Arc<Self>,
        events: &AuthEvents,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let mut rx = events.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    received = rx.recv() => match received {
                        Ok(event) => store.apply_event(event),
                        Err(RecvError::Lagged(skipped)) => {
                            // Skipped events were rejections too
                            tracing::debug!("Auth listener lagged by {} events", skipped);
                            store.apply_event(AuthEvent::Rejected);
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = shutdown.cancelled() => {
                        while let Ok(event) = rx.try_recv() {
                            store.apply_event(event);
                        }
                        break;
                    }
                }
            }
        })
    }

    fn apply_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::Rejected => {
                if self.is_authenticated() {
                    tracing::warn!("Access token rejected, forcing logout");
                    self.logout();
                }
            }
        }
    }
}

enum Persist {
    Save,
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileSessionStorage, MemorySessionStorage};
    use std::time::Duration;

    fn credentials() -> Credentials {
        Credentials {
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            username: "user".to_string(),
            user_id: "id".to_string(),
            role: "user".to_string(),
        }
    }

    #[test]
    fn test_set_credentials_persists() {
        let storage = Arc::new(MemorySessionStorage::new());
        let store = SessionStore::new(storage.clone());

        store.set_credentials(credentials());

        assert!(store.is_authenticated());
        let persisted = storage.load().unwrap().unwrap();
        assert_eq!(persisted, store.snapshot());
    }

    #[test]
    fn test_logout_clears_storage() {
        let storage = Arc::new(MemorySessionStorage::new());
        let store = SessionStore::new(storage.clone());
        store.set_credentials(credentials());

        store.logout();

        assert!(!store.is_authenticated());
        assert_eq!(store.snapshot(), Session::default());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_restores_session_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let first = SessionStore::new(Arc::new(FileSessionStorage::new(&path)));
        first.set_credentials(credentials());
        drop(first);

        let second = SessionStore::new(Arc::new(FileSessionStorage::new(&path)));
        assert!(second.is_authenticated());
        assert_eq!(second.access_token().as_deref(), Some("token"));
    }

    #[test]
    fn test_corrupt_session_starts_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = SessionStore::new(Arc::new(FileSessionStorage::new(&path)));
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_set_role_persists() {
        let storage = Arc::new(MemorySessionStorage::new());
        let store = SessionStore::new(storage.clone());
        store.set_credentials(credentials());

        store.set_role("admin");

        let persisted = storage.load().unwrap().unwrap();
        assert_eq!(persisted.role.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_rejection_event_forces_logout() {
        let store = Arc::new(SessionStore::new(Arc::new(MemorySessionStorage::new())));
        store.set_credentials(credentials());
        let events = AuthEvents::new();
        let shutdown = CancellationToken::new();
        let handle = store.listen(&events, shutdown.clone());

        events.emit(AuthEvent::Rejected);

        let mut waited = Duration::ZERO;
        while store.is_authenticated() && waited < Duration::from_secs(2) {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += Duration::from_millis(10);
        }
        assert!(!store.is_authenticated());

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_rejection_queued_before_shutdown_still_logs_out() {
        for _ in 0..20 {
            let storage = Arc::new(MemorySessionStorage::new());
            let store = Arc::new(SessionStore::new(storage.clone()));
            store.set_credentials(credentials());
            let events = AuthEvents::new();
            let shutdown = CancellationToken::new();
            let handle = store.listen(&events, shutdown.clone());

            events.emit(AuthEvent::Rejected);
            shutdown.cancel();
            handle.await.unwrap();

            assert!(!store.is_authenticated());
            assert!(storage.load().unwrap().is_none());
        }
    }
}
