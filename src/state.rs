use crate::config::Config;
use crate::crypto::session::SessionCodec;
use crate::error::Result;
use crate::repositories::profile::ProfileDirectory;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// Where student profiles are looked up at sign-in.
    pub directory: ProfileDirectory,
    /// The signed session codec.
    pub codec: SessionCodec,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Creates a new `AppState` backed by PostgreSQL.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized");

        Ok(Self::with_directory(config, ProfileDirectory::Postgres(db)))
    }

    /// Creates a new `AppState` over an existing profile directory.
    pub fn with_directory(config: &Config, directory: ProfileDirectory) -> Self {
        let codec = SessionCodec::with_previous_secrets(
            config.session_secret.as_bytes(),
            config.previous_session_secrets.iter().map(|s| s.as_bytes()),
        );
        tracing::info!(
            "✅ Session codec initialized ({} verify-only secrets)",
            config.previous_session_secrets.len()
        );

        AppState {
            directory,
            codec,
            config: config.clone(),
        }
    }
}
