//! Session store and lifecycle controller.

pub mod lifecycle;
pub mod store;

pub use lifecycle::{AuthContext, MIN_PASSWORD_LEN, SessionController, SessionState};
pub use store::{FileTokenStore, MemoryTokenStore, SessionStore, TokenStore};
