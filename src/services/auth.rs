use axum::http::HeaderMap;

use crate::crypto::pin;
use crate::crypto::session::SessionCodec;
use crate::error::{AppError, Result};
use crate::models::profile::StudentProfile;
use crate::models::session::SessionRecord;
use crate::repositories::profile::ProfileDirectory;

/// Header set by the upstream routing layer naming the tenant a request
/// was routed for.
pub const INSTITUTION_HEADER: &str = "x-institution-id";

const INVALID_CREDENTIALS: &str = "Invalid username or PIN";

/// Reads the institution declared by the upstream routing layer.
///
/// A missing, blank or non-UTF-8 header counts as no declaration.
pub fn declared_institution(headers: &HeaderMap) -> Option<String> {
    headers
        .get(INSTITUTION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Checks a session's institution against the declared one.
///
/// With no declaration there is nothing to check. With one, the session must
/// belong to exactly that institution.
pub fn tenant_matches(institution_id: Option<&str>, declared: Option<&str>) -> bool {
    match declared {
        None => true,
        Some(declared) => institution_id == Some(declared),
    }
}

/// Authenticates a student by username and PIN.
///
/// # Arguments
///
/// * `directory` - Where profiles are looked up.
/// * `username` - The student's username.
/// * `pin` - The student's PIN.
/// * `declared` - The institution declared for this request, if any.
///
/// # Returns
///
/// The matching `StudentProfile`. Unknown users, wrong PINs and profiles of
/// another institution all fail with the same message.
pub async fn authenticate_student(
    directory: &ProfileDirectory,
    username: &str,
    pin: &str,
    declared: Option<&str>,
) -> Result<StudentProfile> {
    tracing::debug!("🔐 Authenticating student: {}", username);

    let Some(profile) = directory.find_by_username(username).await? else {
        // Same argon2 cost as a wrong PIN, so timing does not reveal which
        // usernames exist.
        let _ = pin::verify_pin_blocking(pin.to_string(), pin::DUMMY_PIN_HASH.to_string()).await;
        return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
    };

    if !pin::verify_pin_blocking(pin.to_string(), profile.pin_hash.clone()).await? {
        return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
    }

    if !tenant_matches(profile.institution_id.as_deref(), declared) {
        tracing::warn!(
            "❌ Profile {} does not belong to declared institution {:?}",
            profile.profile_id,
            declared
        );
        return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
    }

    tracing::info!("✅ Student authenticated: {}", profile.profile_id);

    Ok(profile)
}

/// Mints a session for an authenticated profile.
///
/// # Arguments
///
/// * `codec` - The session codec.
/// * `profile` - The authenticated profile.
/// * `issued_at` - The current time in epoch milliseconds.
///
/// # Returns
///
/// The new record and its signed token.
pub fn start_session(
    codec: &SessionCodec,
    profile: StudentProfile,
    issued_at: i64,
) -> Result<(SessionRecord, String)> {
    let record = SessionRecord::student(
        profile.profile_id,
        profile.classroom_id,
        profile.institution_id,
        issued_at,
    )?;
    let token = codec.encode(&record)?;
    Ok((record, token))
}

/// Resumes a session from a cookie value.
///
/// Returns `None` when the token does not verify or belongs to another
/// institution than the declared one.
pub fn resume_session(
    codec: &SessionCodec,
    token: &str,
    declared: Option<&str>,
) -> Option<SessionRecord> {
    let record = codec.decode(token)?;

    if !tenant_matches(record.institution_id(), declared) {
        tracing::warn!(
            "❌ Session for {} presented under institution {:?}",
            record.profile_id(),
            declared
        );
        return None;
    }

    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::time::{Duration, Instant};

    fn profile(institution_id: Option<&str>) -> StudentProfile {
        StudentProfile {
            profile_id: "u1".to_string(),
            username: "ada".to_string(),
            pin_hash: pin::hash_pin("4821").unwrap(),
            classroom_id: Some("c1".to_string()),
            institution_id: institution_id.map(str::to_string),
        }
    }

    #[test]
    fn test_tenant_rules() {
        assert!(tenant_matches(None, None));
        assert!(tenant_matches(Some("i1"), None));
        assert!(tenant_matches(Some("i1"), Some("i1")));
        assert!(!tenant_matches(Some("i1"), Some("i2")));
        assert!(!tenant_matches(None, Some("i1")));
    }

    #[test]
    fn test_declared_institution_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_institution(&headers), None);

        headers.insert(INSTITUTION_HEADER, HeaderValue::from_static("   "));
        assert_eq!(declared_institution(&headers), None);

        headers.insert(INSTITUTION_HEADER, HeaderValue::from_static(" i1 "));
        assert_eq!(declared_institution(&headers), Some("i1".to_string()));
    }

    #[test]
    fn test_cross_tenant_session_is_rejected() {
        let codec = SessionCodec::new("test-secret");
        let (_, token) = start_session(&codec, profile(Some("i1")), 1000).unwrap();

        assert!(codec.decode(&token).is_some());
        assert!(resume_session(&codec, &token, Some("i2")).is_none());
        assert!(resume_session(&codec, &token, Some("i1")).is_some());
        assert!(resume_session(&codec, &token, None).is_some());
    }

    #[test]
    fn test_start_session_without_secret_fails() {
        let codec = SessionCodec::new("");
        let result = start_session(&codec, profile(None), 1000);

        assert!(matches!(
            result,
            Err(AppError::Session(crate::error::SessionError::MissingSecret))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_student() {
        let directory = ProfileDirectory::in_memory([profile(Some("i1"))]);

        let found = authenticate_student(&directory, "ada", "4821", None)
            .await
            .unwrap();
        assert_eq!(found.profile_id, "u1");

        assert!(authenticate_student(&directory, "ada", "0000", None).await.is_err());
        assert!(authenticate_student(&directory, "bob", "4821", None).await.is_err());
        assert!(
            authenticate_student(&directory, "ada", "4821", Some("i2"))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_unknown_user_costs_as_much_as_wrong_pin() {
        let directory = ProfileDirectory::in_memory([profile(None)]);

        async fn total(
            directory: &ProfileDirectory,
            username: &str,
            pin: &str,
        ) -> Duration {
            let start = Instant::now();
            for _ in 0..3 {
                assert!(authenticate_student(directory, username, pin, None).await.is_err());
            }
            start.elapsed()
        }

        let wrong_pin = total(&directory, "ada", "0000").await;
        let unknown_user = total(&directory, "alan", "0000").await;

        assert!(
            unknown_user * 4 >= wrong_pin,
            "unknown user took {:?}, wrong PIN took {:?}",
            unknown_user,
            wrong_pin
        );
    }
}
