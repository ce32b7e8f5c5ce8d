//! Stateless signed student sessions.
//!
//! Sessions live entirely in a cookie as `<payload>.<tag>`: a base64url JSON
//! [`models::session::SessionRecord`] and its HMAC-SHA256 tag. There is no
//! server-side session store. The HTTP layer signs students in against a
//! profile directory, slides the cookie's expiry on every verified read and
//! clears it on any failure.

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;

pub mod crypto {
    pub mod pin;
    pub mod session;
}

pub mod models {
    pub mod profile;
    pub mod session;
}

pub mod repositories {
    pub mod profile;
}

pub mod services {
    pub mod auth;
}

pub mod handlers {
    pub mod auth;
}

pub mod middleware_layer {
    pub mod auth;
}

pub mod validation {
    pub mod auth;
}

pub use config::Config;
pub use crypto::session::{SessionCodec, cookie_name, max_age_seconds};
pub use error::{AppError, InvalidToken, SessionError};
pub use models::session::{SessionRecord, SessionRole};
pub use routes::router;
pub use state::AppState;
