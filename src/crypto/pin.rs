use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

use crate::error::{AppError, Result};
use crate::validation::auth::validate_pin;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 2;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 1;

/// A well-formed hash no PIN is expected to match, using the same parameters
/// as `hash_pin`. Unknown usernames are verified against it so that they cost
/// as much as a wrong PIN.
pub const DUMMY_PIN_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$Y29uc3RhbnQtZHVtbXkhIQ$AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

/// Hashes a student PIN using Argon2id.
///
/// # Arguments
///
/// * `pin` - The PIN to hash.
///
/// # Returns
///
/// A `Result` containing the PHC-formatted hash.
pub fn hash_pin(pin: &str) -> Result<String> {
    let mut pin_bytes = pin.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Hashing(format!("Salt encoding error: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Hashing(format!("Argon2 params: {}", e)))?,
    );

    let pin_hash = argon2
        .hash_password(&pin_bytes, &salt)
        .map_err(|e| AppError::Hashing(format!("Argon2 hash error: {}", e)))?
        .to_string();

    pin_bytes.zeroize();
    Ok(pin_hash)
}

/// Checks a new PIN against the sign-in rules, then hashes it.
///
/// A PIN that could never be used to sign in is refused here rather than
/// provisioned.
pub fn hash_new_pin(pin: &str) -> Result<String> {
    validate_pin(pin)?;
    hash_pin(pin)
}

/// Verifies a PIN against a stored hash.
///
/// The hash carries its own parameters, so PINs hashed with older settings
/// keep verifying.
///
/// # Returns
///
/// `Ok(true)` on match, `Ok(false)` on mismatch, an error when the stored
/// hash is unparsable.
pub fn verify_pin(pin: &str, hash: &str) -> Result<bool> {
    let mut pin_bytes = pin.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Hashing(format!("Hash parse error: {}", e)))?;
    let matches = Argon2::default()
        .verify_password(&pin_bytes, &parsed_hash)
        .is_ok();

    pin_bytes.zeroize();
    Ok(matches)
}

/// Runs `verify_pin` on the blocking thread pool.
///
/// Argon2 takes tens of milliseconds; this keeps it off the async workers.
pub async fn verify_pin_blocking(pin: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let mut pin = pin;
        let result = verify_pin(&pin, &hash);
        pin.zeroize();
        result
    })
    .await
    .map_err(|e| AppError::Hashing(format!("Verification task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_pin("4821").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_pin("4821", &hash).unwrap());
        assert!(!verify_pin("4822", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_pin("4821").unwrap(), hash_pin("4821").unwrap());
    }

    #[test]
    fn test_new_pin_must_be_usable() {
        assert!(matches!(hash_new_pin("123"), Err(AppError::Validation(_))));
        assert!(matches!(
            hash_new_pin(&"9".repeat(129)),
            Err(AppError::Validation(_))
        ));

        let hash = hash_new_pin("4821").unwrap();
        assert!(verify_pin("4821", &hash).unwrap());
    }

    #[test]
    fn test_dummy_hash_parses_and_never_matches() {
        assert!(!verify_pin("4821", DUMMY_PIN_HASH).unwrap());
        assert!(!verify_pin("", DUMMY_PIN_HASH).unwrap());
    }

    #[tokio::test]
    async fn test_verify_on_blocking_pool() {
        let hash = hash_pin("4821").unwrap();

        assert!(verify_pin_blocking("4821".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_pin_blocking("0000".to_string(), hash).await.unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(matches!(
            verify_pin("4821", "not-a-phc-string"),
            Err(AppError::Hashing(_))
        ));
    }
}
