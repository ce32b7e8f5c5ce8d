use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    error::AppError,
    handlers::auth::{cleared_session_cookie, session_cookie, session_token},
    services::auth as auth_service,
    state::AppState,
};

/// A middleware that requires a valid student session.
///
/// On success the cookie is re-issued with a fresh max-age and the
/// `SessionRecord` is inserted into the request extensions. On failure the
/// cookie is cleared and the request is rejected as unauthenticated.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or an `AppError`.
pub async fn require_student_session(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    tracing::debug!("🔐 Checking student session...");

    let token = session_token(&cookies).ok_or_else(|| {
        tracing::debug!("❌ No session cookie found");
        AppError::Unauthenticated
    })?;

    let declared = auth_service::declared_institution(request.headers());

    let Some(record) = auth_service::resume_session(&state.codec, &token, declared.as_deref())
    else {
        cookies.add(cleared_session_cookie(state.config.production));
        return Err(AppError::Unauthenticated);
    };

    cookies.add(session_cookie(token, state.config.production));
    tracing::debug!("✅ Student authenticated: {}", record.profile_id());

    request.extensions_mut().insert(record);

    Ok(next.run(request).await)
}
