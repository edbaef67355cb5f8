use std::env;
use url::Url;
use voicegate::DEFAULT_FREE_PLAN_MAX_TOKENS;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_PATH: &str = "./voicegate.db";
const DEFAULT_TTS_API_URL: &str = "https://texttospeech.googleapis.com";
const DEFAULT_RATE_LIMIT_RPM: u32 = 60;

#[derive(Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,
    /// SQLite database path
    pub db_path: String,
    /// Free-tier token cap
    pub free_plan_max_tokens: u64,
    /// HS256 key the identity provider signs caller credentials with
    pub auth_secret: Vec<u8>,
    /// Google Cloud TTS API key
    pub tts_api_key: String,
    /// TTS API base URL
    pub tts_api_url: String,
    /// Shared secret for webhook signatures (None = verification skipped)
    pub webhook_secret: Option<Vec<u8>>,
    /// CORS allowed origins
    pub allowed_origins: Vec<String>,
    /// Rate limit requests per minute
    pub rate_limit_rpm: u32,
    /// Bearer token required for /metrics endpoint (None = public)
    pub metrics_token: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("db_path", &self.db_path)
            .field("free_plan_max_tokens", &self.free_plan_max_tokens)
            .field("auth_secret", &"[REDACTED]")
            .field("tts_api_key", &"[REDACTED]")
            .field("tts_api_url", &self.tts_api_url)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        // Required: credential verification key and provider credential
        let auth_secret = var("AUTH_JWT_SECRET")
            .ok_or(ConfigError::MissingRequired("AUTH_JWT_SECRET"))?
            .into_bytes();
        let tts_api_key =
            var("GOOGLE_TTS_API_KEY").ok_or(ConfigError::MissingRequired("GOOGLE_TTS_API_KEY"))?;

        let tts_api_url = var("TTS_API_URL").unwrap_or_else(|| DEFAULT_TTS_API_URL.to_string());
        Url::parse(&tts_api_url).map_err(|_| ConfigError::InvalidUrl(tts_api_url.clone()))?;

        let port = match var("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("PORT", raw))?,
            None => DEFAULT_PORT,
        };

        let free_plan_max_tokens = match var("FREE_PLAN_MAX_TOKENS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("FREE_PLAN_MAX_TOKENS", raw))?,
            None => DEFAULT_FREE_PLAN_MAX_TOKENS,
        };

        let db_path = var("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let webhook_secret = var("REVENUECAT_WEBHOOK_SECRET").map(String::into_bytes);

        let allowed_origins: Vec<String> = var("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });

        let rate_limit_rpm = var("RATE_LIMIT_RPM")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_RPM);

        let metrics_token = var("METRICS_TOKEN");

        if webhook_secret.is_none() {
            tracing::warn!(
                "REVENUECAT_WEBHOOK_SECRET not set; billing webhook signatures will NOT be verified"
            );
        }
        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set; /metrics endpoint is publicly accessible");
        }

        Ok(Self {
            port,
            db_path,
            free_plan_max_tokens,
            auth_secret,
            tts_api_key,
            tts_api_url,
            webhook_secret,
            allowed_origins,
            rate_limit_rpm,
            metrics_token,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid number for {0}: {1}")]
    InvalidNumber(&'static str, String),
}
