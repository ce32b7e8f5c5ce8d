//! Signed session tokens.
//!
//! A token is `<payload>.<tag>` where `payload` is the base64url (no padding)
//! JSON of a [`SessionRecord`] and `tag` is the base64url HMAC-SHA256 of the
//! exact payload bytes. The payload is readable by the bearer; only integrity
//! and authenticity are guaranteed.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{InvalidToken, SessionError};
use crate::models::session::SessionRecord;

type HmacSha256 = Hmac<Sha256>;

/// The name of the cookie carrying the session token.
pub const COOKIE_NAME: &str = "student_session";
/// Cookie lifetime: one week.
pub const MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;
/// The size of an HMAC-SHA256 tag in bytes.
pub const TAG_SIZE: usize = 32;

/// Returns the name of the session cookie.
pub fn cookie_name() -> &'static str {
    COOKIE_NAME
}

/// Returns the session cookie's max-age in seconds.
pub fn max_age_seconds() -> i64 {
    MAX_AGE_SECONDS
}

/// Key material, wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
struct SigningKey(Vec<u8>);

impl SigningKey {
    fn tag(&self, payload: &[u8]) -> Option<[u8; TAG_SIZE]> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.0).ok()?;
        mac.update(payload);
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&mac.finalize().into_bytes());
        Some(tag)
    }
}

/// Encodes and verifies signed session tokens.
///
/// The first key signs; every key verifies. Retired secrets can be kept as
/// verify-only keys so that rotating the secret does not drop live sessions.
/// Cloning is cheap and the codec is safe to share across requests.
#[derive(Clone)]
pub struct SessionCodec {
    keys: Arc<[SigningKey]>,
}

impl SessionCodec {
    /// Creates a codec that signs and verifies with `secret`.
    ///
    /// An empty secret yields a codec that refuses to sign and rejects
    /// every token.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self::with_keys(std::iter::once(secret.as_ref()))
    }

    /// Creates a codec from a primary secret followed by verify-only secrets.
    ///
    /// Empty secrets are skipped, so a missing primary leaves the codec
    /// without a signing key.
    pub fn with_previous_secrets<P, I, S>(secret: P, previous: I) -> Self
    where
        P: AsRef<[u8]>,
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        if secret.as_ref().is_empty() {
            return Self::with_keys(std::iter::empty());
        }
        let previous: Vec<S> = previous.into_iter().collect();
        Self::with_keys(
            std::iter::once(secret.as_ref())
                .chain(previous.iter().map(|s| -> &[u8] { s.as_ref() })),
        )
    }

    fn with_keys<'a>(secrets: impl Iterator<Item = &'a [u8]>) -> Self {
        let keys: Vec<SigningKey> = secrets
            .filter(|s| !s.is_empty())
            .map(|s| SigningKey(s.to_vec()))
            .collect();
        Self { keys: keys.into() }
    }

    /// Encodes a session record into a cookie-safe token.
    ///
    /// # Arguments
    ///
    /// * `record` - The record to sign.
    ///
    /// # Returns
    ///
    /// The token, or `SessionError::MissingSecret` when no signing secret is
    /// configured.
    pub fn encode(&self, record: &SessionRecord) -> Result<String, SessionError> {
        let key = self.keys.first().ok_or(SessionError::MissingSecret)?;

        let payload = sonic_rs::to_vec(record)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;
        let tag = key.tag(&payload).ok_or(SessionError::MissingSecret)?;

        let mut token = URL_SAFE_NO_PAD.encode(&payload);
        token.push('.');
        URL_SAFE_NO_PAD.encode_string(tag, &mut token);
        Ok(token)
    }

    /// Verifies a token and reports why it was rejected.
    ///
    /// Outside the crate only [`SessionCodec::decode`] is available, which
    /// does not reveal the cause.
    pub(crate) fn verify(&self, token: &str) -> Result<SessionRecord, InvalidToken> {
        let (payload_b64, tag_b64) = token.split_once('.').ok_or(InvalidToken::Malformed)?;
        if payload_b64.is_empty() || tag_b64.is_empty() || tag_b64.contains('.') {
            return Err(InvalidToken::Malformed);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| InvalidToken::Encoding)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag_b64)
            .map_err(|_| InvalidToken::Encoding)?;

        if self.keys.is_empty() {
            return Err(InvalidToken::Unconfigured);
        }

        // Every key is checked so the work done does not depend on which
        // key, if any, matched.
        let authentic = self.keys.iter().fold(Choice::from(0), |acc, key| {
            let matched = key
                .tag(&payload)
                .map(|expected| expected.as_slice().ct_eq(tag.as_slice()))
                .unwrap_or_else(|| Choice::from(0));
            acc | matched
        });

        if !bool::from(authentic) {
            return Err(InvalidToken::SignatureMismatch);
        }

        let record: SessionRecord =
            sonic_rs::from_slice(&payload).map_err(|_| InvalidToken::Payload)?;
        if !record.is_well_formed() {
            return Err(InvalidToken::Payload);
        }

        Ok(record)
    }

    /// Decodes a token, returning `None` for any invalid input.
    ///
    /// Safe to call with arbitrary client-supplied strings.
    pub fn decode(&self, token: &str) -> Option<SessionRecord> {
        match self.verify(token) {
            Ok(record) => Some(record),
            Err(reason) => {
                tracing::debug!("🔒 Session token rejected: {}", reason);
                None
            }
        }
    }
}
