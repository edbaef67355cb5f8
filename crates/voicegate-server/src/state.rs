use std::sync::Arc;
use voicegate::{CharCountEstimator, IdentityAdmin, SpeechSynthesizer, TokenEstimator};

use crate::auth::CredentialVerifier;
use crate::config::ServerConfig;
use crate::db::Database;
use crate::tts::GoogleTtsClient;

/// Shared application state. Built once at startup and handed to every
/// worker through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub db: Arc<Database>,
    pub verifier: Arc<CredentialVerifier>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub identity_admin: Arc<dyn IdentityAdmin>,
    pub estimator: Arc<dyn TokenEstimator>,
}

impl AppState {
    /// Production wiring: Google TTS, SQLite-backed identity admin, and the
    /// character-count estimator.
    pub fn new(config: ServerConfig, db: Database) -> Result<Self, reqwest::Error> {
        let synthesizer = GoogleTtsClient::new(&config.tts_api_url, &config.tts_api_key)?;
        Ok(Self::with_synthesizer(config, db, Arc::new(synthesizer)))
    }

    pub fn with_synthesizer(
        config: ServerConfig,
        db: Database,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let db = Arc::new(db);
        Self {
            verifier: Arc::new(CredentialVerifier::new(&config.auth_secret)),
            config: Arc::new(config),
            identity_admin: db.clone(),
            db,
            synthesizer,
            estimator: Arc::new(CharCountEstimator),
        }
    }

    pub fn with_identity_admin(mut self, identity_admin: Arc<dyn IdentityAdmin>) -> Self {
        self.identity_admin = identity_admin;
        self
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }
}
