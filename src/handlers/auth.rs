use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::{
    crypto::session::{cookie_name, max_age_seconds},
    error::{AppError, Result},
    models::session::SessionRecord,
    services::auth as auth_service,
    state::AppState,
    validation::auth::*,
};

/// The request payload for student sign-in.
#[derive(Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub pin: String,
}

/// The response payload for session-related requests.
#[derive(Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: SessionRecord,
}

/// The response payload for sign-out.
#[derive(Serialize)]
pub struct SignOutResponse {
    pub success: bool,
    pub message: String,
}

fn base_session_cookie(value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(cookie_name(), value);
    cookie.set_http_only(true);
    if secure {
        cookie.set_secure(true);
    }
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie
}

/// Builds the session cookie for a token, with a fresh max-age.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = base_session_cookie(token, secure);
    cookie.set_max_age(Duration::seconds(max_age_seconds()));
    cookie
}

/// Builds a cookie that overwrites the session cookie with an empty,
/// already-expired value.
pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = base_session_cookie(String::new(), secure);
    cookie.make_removal();
    cookie
}

/// Reads the raw session token from the request cookies.
pub fn session_token(cookies: &Cookies) -> Option<String> {
    cookies
        .get(cookie_name())
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Handles student sign-in.
#[axum::debug_handler]
pub async fn sign_in(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
    Json(payload): Json<SignInRequest>,
) -> Result<Response> {
    validate_username(&payload.username)?;
    validate_pin(&payload.pin)?;
    tracing::info!("🔐 Sign-in attempt for: {}", payload.username);

    let declared = auth_service::declared_institution(&headers);

    let profile = auth_service::authenticate_student(
        &state.directory,
        &payload.username,
        &payload.pin,
        declared.as_deref(),
    )
    .await?;

    let (record, token) =
        auth_service::start_session(&state.codec, profile, Utc::now().timestamp_millis())?;

    cookies.add(session_cookie(token, state.config.production));
    tracing::info!("✅ Session cookie issued for: {}", record.profile_id());

    let response = SessionResponse {
        success: true,
        session: record,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Returns the current session, re-issuing the cookie to slide its expiry.
///
/// The session must belong to the institution declared by the upstream
/// routing layer, if any. Every failure clears the cookie.
#[axum::debug_handler]
pub async fn read_session(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
) -> Result<Response> {
    let token = session_token(&cookies).ok_or(AppError::Unauthenticated)?;
    let declared = auth_service::declared_institution(&headers);

    let Some(record) = auth_service::resume_session(&state.codec, &token, declared.as_deref())
    else {
        cookies.add(cleared_session_cookie(state.config.production));
        return Err(AppError::Unauthenticated);
    };

    cookies.add(session_cookie(token, state.config.production));
    tracing::debug!("✅ Session refreshed for: {}", record.profile_id());

    let response = SessionResponse {
        success: true,
        session: record,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Returns the session attached by `require_student_session`.
#[axum::debug_handler]
pub async fn me(Extension(record): Extension<SessionRecord>) -> Result<Response> {
    let response = SessionResponse {
        success: true,
        session: record,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles sign-out by clearing the session cookie.
#[axum::debug_handler]
pub async fn sign_out(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    cookies.add(cleared_session_cookie(state.config.production));
    tracing::info!("👋 Session cookie cleared");

    let response = SignOutResponse {
        success: true,
        message: "Signed out".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("token".to_string(), true);

        assert_eq!(cookie.name(), "student_session");
        assert_eq!(cookie.value(), "token");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(604_800)));
    }

    #[test]
    fn test_secure_flag_follows_environment() {
        assert_eq!(session_cookie("token".to_string(), false).secure(), None);
    }

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let cookie = cleared_session_cookie(false);

        assert_eq!(cookie.name(), "student_session");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.path(), Some("/"));
    }
}
