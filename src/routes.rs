use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_cookies::CookieManagerLayer;

use crate::{handlers, middleware_layer, state::AppState};

/// Routes that mint sessions. The binary puts a rate limiter in front of
/// these.
pub fn sign_in_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/student/sign-in", post(handlers::auth::sign_in))
        .with_state(state)
}

/// Routes that read, use or clear an existing session.
pub fn session_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/student/me", get(handlers::auth::me))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_student_session,
        ))
        .with_state(state.clone());

    Router::new()
        .route("/api/student/session", get(handlers::auth::read_session))
        .route("/api/student/sign-out", post(handlers::auth::sign_out))
        .with_state(state)
        .merge(protected)
}

/// The full router with cookie handling, without rate limiting.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(sign_in_routes(state.clone()))
        .merge(session_routes(state))
        .layer(CookieManagerLayer::new())
}
