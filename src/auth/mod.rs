//! Authentication layer: password hashing, session credentials, and the
//! register/login/logout service.

pub mod middleware;
pub mod password;
pub mod service;
pub mod token;
pub mod transport;

pub use middleware::{AppState, CurrentUser};
pub use password::{HashCost, PasswordHasher};
pub use service::{AuthError, AuthService};
pub use token::{verify_token, Claims, SessionCredential, TokenSigner};
pub use transport::{CookieSettings, CookieTransport, SessionTransport};
