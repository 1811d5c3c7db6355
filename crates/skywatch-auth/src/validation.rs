//! Client-side checks for the sign-in and sign-up forms.

use skywatch_core::ValidationError;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;

/// Validate a sign-up form.
///
/// Field constraints are checked before the confirmation match.
pub fn validate_signup(
    username: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::Required("Username"));
    }
    if password.is_empty() {
        return Err(ValidationError::Required("Password"));
    }

    let username_len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&username_len) {
        return Err(ValidationError::UsernameLength);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::UsernameCharacters);
    }

    let password_len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&password_len) {
        return Err(ValidationError::PasswordLength);
    }

    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }

    Ok(())
}

/// Validate a login form. Only minimum lengths are checked here; the
/// server judges the credentials.
pub fn validate_login(username: &str, password: &str) -> Result<(), ValidationError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::Required("Username"));
    }
    if password.is_empty() {
        return Err(ValidationError::Required("Password"));
    }
    if username.chars().count() < USERNAME_MIN {
        return Err(ValidationError::UsernameTooShort);
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}
