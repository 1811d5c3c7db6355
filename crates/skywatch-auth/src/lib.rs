//! Session state for the SkyWatch client.
//!
//! Holds credentials behind an action/reducer contract, persists them across
//! restarts, and reacts to authentication rejections reported by the network
//! layer.

pub mod events;
pub mod session;
pub mod storage;
pub mod store;
pub mod validation;

pub use events::{AuthEvent, AuthEvents};
pub use session::{reduce, Credentials, Session, SessionAction};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
pub use store::SessionStore;
pub use validation::{validate_login, validate_signup};
