use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};
use zeroize::Zeroizing;

/// Secrets shorter than this still work but are flagged at startup.
const RECOMMENDED_SECRET_LEN: usize = 32;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database holding student profiles.
    pub database_url: String,
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Whether the service runs in production (enables `Secure` cookies).
    pub production: bool,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
    /// The secret used to sign new session tokens.
    pub session_secret: Zeroizing<String>,
    /// Retired secrets still accepted when verifying tokens.
    pub previous_session_secrets: Vec<Zeroizing<String>>,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Creates a new `Config` from an arbitrary key lookup.
    ///
    /// # Arguments
    ///
    /// * `lookup` - Returns the value for a variable name, if set.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_secret = Zeroizing::new(
            lookup("SESSION_SECRET")
                .context("SESSION_SECRET must be set (generate with: openssl rand -base64 48)")?,
        );

        if session_secret.trim().is_empty() {
            anyhow::bail!("SESSION_SECRET must not be empty");
        }

        if session_secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                "⚠️  SESSION_SECRET is shorter than {} bytes",
                RECOMMENDED_SECRET_LEN
            );
        }

        let previous_session_secrets = lookup("SESSION_PREVIOUS_SECRETS")
            .map(|raw| {
                let raw = Zeroizing::new(raw);
                split_list(&raw)
                    .into_iter()
                    .map(Zeroizing::new)
                    .collect()
            })
            .unwrap_or_default();

        let production = lookup("APP_ENV")
            .unwrap_or_else(|| "development".to_string())
            == "production";

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .context("Invalid BIND_ADDR")?;

        let cors_origins = split_list(
            &lookup("CORS_ORIGINS").unwrap_or_else(|| "http://localhost:3000".to_string()),
        );

        Ok(Self {
            database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            bind_addr,
            production,
            cors_origins,
            session_secret,
            previous_session_secrets,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_secret_is_a_startup_error() {
        let result = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://db")]));
        let err = result.err().expect("config without secret must fail");
        assert!(err.to_string().contains("SESSION_SECRET"));
    }

    #[test]
    fn test_blank_secret_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("SESSION_SECRET", "   "),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("SESSION_SECRET", "a-very-long-secret-value-for-testing-only"),
        ]))
        .unwrap();

        assert!(!config.production);
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.cors_origins, vec!["http://localhost:3000".to_string()]);
        assert!(config.previous_session_secrets.is_empty());
    }

    #[test]
    fn test_previous_secrets_and_production() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("SESSION_SECRET", "current"),
            ("SESSION_PREVIOUS_SECRETS", "old-1, ,old-2"),
            ("APP_ENV", "production"),
        ]))
        .unwrap();

        assert!(config.production);
        let previous: Vec<&str> = config
            .previous_session_secrets
            .iter()
            .map(|s| s.as_str())
            .collect();
        assert_eq!(previous, vec!["old-1", "old-2"]);
    }
}
