use crate::error::{AppError, Result};

/// Validates a student username.
///
/// # Arguments
///
/// * `username` - The username to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the username is valid.
pub fn validate_username(username: &str) -> Result<()> {
    if username.len() < 3 {
        return Err(AppError::Validation(
            "Username must be at least 3 characters long".to_string(),
        ));
    }

    if username.len() > 255 {
        return Err(AppError::Validation(
            "Username must be at most 255 characters".to_string(),
        ));
    }

    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(AppError::Validation(
            "Username can only contain letters, numbers, underscores, and hyphens".to_string(),
        ));
    }

    Ok(())
}

/// Validates a student PIN.
pub fn validate_pin(pin: &str) -> Result<()> {
    if pin.len() < 4 {
        return Err(AppError::Validation(
            "PIN must be at least 4 characters long".to_string(),
        ));
    }

    if pin.len() > 128 {
        return Err(AppError::Validation(
            "PIN must be at most 128 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("ada_lovelace-1").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(256)).is_err());
        assert!(validate_username("ada lovelace").is_err());
        assert!(validate_username("adä").is_err());
    }

    #[test]
    fn test_pin_rules() {
        assert!(validate_pin("4821").is_ok());
        assert!(validate_pin("482").is_err());
        assert!(validate_pin(&"9".repeat(129)).is_err());
    }
}
