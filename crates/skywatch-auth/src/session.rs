use serde::{Deserialize, Serialize};

/// Identity and tokens returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    pub username: String,
    pub user_id: String,
    pub role: String,
}

/// Authentication state of the client.
///
/// Every field is `None` when signed out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub role: Option<String>,
}

impl Session {
    /// True iff an access token is held
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Header value for authenticated requests
    pub fn bearer(&self) -> Option<String> {
        self.access_token
            .as_deref()
            .map(|token| format!("Bearer {}", token))
    }
}

impl From<Credentials> for Session {
    fn from(c: Credentials) -> Self {
        Self {
            access_token: Some(c.access_token),
            refresh_token: Some(c.refresh_token),
            username: Some(c.username),
            user_id: Some(c.user_id),
            role: Some(c.role),
        }
    }
}

/// Mutations the session accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    SetCredentials(Credentials),
    SetRole(String),
    Logout,
}

/// Apply an action to a session, returning the next state.
pub fn reduce(session: &Session, action: SessionAction) -> Session {
    match action {
        SessionAction::SetCredentials(credentials) => Session::from(credentials),
        SessionAction::SetRole(role) => Session {
            role: Some(role),
            ..session.clone()
        },
        SessionAction::Logout => Session::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            access_token: "test-access-token".to_string(),
            refresh_token: "test-refresh-token".to_string(),
            username: "testuser".to_string(),
            user_id: "user-123".to_string(),
            role: "user".to_string(),
        }
    }

    #[test]
    fn test_initial_state_is_signed_out() {
        let session = Session::default();
        assert!(!session.is_authenticated());
        assert!(session.bearer().is_none());
    }

    #[test]
    fn test_set_credentials_echoes_fields() {
        let state = reduce(&Session::default(), SessionAction::SetCredentials(credentials()));

        assert_eq!(state.access_token.as_deref(), Some("test-access-token"));
        assert_eq!(state.refresh_token.as_deref(), Some("test-refresh-token"));
        assert_eq!(state.username.as_deref(), Some("testuser"));
        assert_eq!(state.user_id.as_deref(), Some("user-123"));
        assert_eq!(state.role.as_deref(), Some("user"));
        assert!(state.is_authenticated());
        assert_eq!(state.bearer().as_deref(), Some("Bearer test-access-token"));
    }

    #[test]
    fn test_set_credentials_overwrites_previous_user() {
        let first = reduce(&Session::default(), SessionAction::SetCredentials(credentials()));
        let mut other = credentials();
        other.username = "second".to_string();
        other.access_token = "second-token".to_string();

        let state = reduce(&first, SessionAction::SetCredentials(other));
        assert_eq!(state.username.as_deref(), Some("second"));
        assert_eq!(state.access_token.as_deref(), Some("second-token"));
    }

    #[test]
    fn test_logout_nulls_everything() {
        let logged_in = reduce(&Session::default(), SessionAction::SetCredentials(credentials()));
        let state = reduce(&logged_in, SessionAction::Logout);

        assert_eq!(state, Session::default());
        assert!(!state.is_authenticated());
    }

    #[test]
    fn test_logout_when_signed_out_is_noop() {
        let state = reduce(&Session::default(), SessionAction::Logout);
        assert_eq!(state, Session::default());
    }

    #[test]
    fn test_set_role_keeps_tokens() {
        let logged_in = reduce(&Session::default(), SessionAction::SetCredentials(credentials()));
        let state = reduce(&logged_in, SessionAction::SetRole("admin".to_string()));

        assert_eq!(state.role.as_deref(), Some("admin"));
        assert_eq!(state.access_token, logged_in.access_token);
        assert!(state.is_authenticated());
    }
}
