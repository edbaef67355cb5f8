#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use voicegate::{
    IdentityAdmin, IdentityError, SpeechSynthesizer, SynthesisError, SynthesizedAudio,
    VoiceSelection,
};

use voicegate_server::auth::CredentialClaims;
use voicegate_server::config::ServerConfig;
use voicegate_server::db::Database;
use voicegate_server::state::AppState;

pub const JWT_SECRET: &[u8] = b"test-jwt-secret";
pub const WEBHOOK_SECRET: &[u8] = b"whsec_test";

/// Base64 of "ID3", returned by the scripted synthesizer.
pub const FAKE_AUDIO: &str = "SUQz";

pub fn test_config(webhook_secret: Option<&[u8]>) -> ServerConfig {
    ServerConfig {
        port: 0,
        db_path: ":memory:".to_string(),
        free_plan_max_tokens: 1000,
        auth_secret: JWT_SECRET.to_vec(),
        tts_api_key: "test-key".to_string(),
        tts_api_url: "http://127.0.0.1:1".to_string(),
        webhook_secret: webhook_secret.map(<[u8]>::to_vec),
        allowed_origins: vec![],
        rate_limit_rpm: 60,
        metrics_token: None,
    }
}

/// Synthesizer double that records calls and either succeeds or fails.
pub struct ScriptedSynthesizer {
    failure: Option<String>,
    calls: AtomicUsize,
    last_voice: Mutex<Option<VoiceSelection>>,
}

impl ScriptedSynthesizer {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            failure: None,
            calls: AtomicUsize::new(0),
            last_voice: Mutex::new(None),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
            last_voice: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_voice(&self) -> Option<VoiceSelection> {
        self.last_voice.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(
        &self,
        _text: &str,
        voice: &VoiceSelection,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_voice.lock().unwrap() = Some(voice.clone());
        match &self.failure {
            Some(message) => Err(SynthesisError::Provider {
                status: 503,
                message: message.clone(),
            }),
            None => Ok(SynthesizedAudio::Base64(FAKE_AUDIO.to_string())),
        }
    }
}

/// Identity admin whose every call fails.
pub struct FailingIdentityAdmin;

#[async_trait]
impl IdentityAdmin for FailingIdentityAdmin {
    async fn set_premium_claim(&self, _uid: &str, _premium: bool) -> Result<(), IdentityError> {
        Err(IdentityError::Backend("identity provider unavailable".to_string()))
    }

    async fn revoke_tokens(&self, _uid: &str) -> Result<(), IdentityError> {
        Err(IdentityError::Backend("identity provider unavailable".to_string()))
    }
}

/// Identity admin that records claim writes and revocations, then forwards
/// them to the store so revocation still takes effect.
pub struct RecordingIdentityAdmin {
    inner: Arc<Database>,
    claims: Mutex<Vec<(String, bool)>>,
    revoked: Mutex<Vec<String>>,
}

impl RecordingIdentityAdmin {
    pub fn wrapping(inner: Arc<Database>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            claims: Mutex::new(Vec::new()),
            revoked: Mutex::new(Vec::new()),
        })
    }

    pub fn claims(&self) -> Vec<(String, bool)> {
        self.claims.lock().unwrap().clone()
    }

    pub fn revoked(&self) -> Vec<String> {
        self.revoked.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityAdmin for RecordingIdentityAdmin {
    async fn set_premium_claim(&self, uid: &str, premium: bool) -> Result<(), IdentityError> {
        self.claims.lock().unwrap().push((uid.to_string(), premium));
        self.inner.set_premium_claim(uid, premium).await
    }

    async fn revoke_tokens(&self, uid: &str) -> Result<(), IdentityError> {
        self.revoked.lock().unwrap().push(uid.to_string());
        self.inner.revoke_tokens(uid).await
    }
}

/// App state whose identity admin is a [`RecordingIdentityAdmin`].
pub fn recording_app_state(config: ServerConfig) -> (AppState, Arc<RecordingIdentityAdmin>) {
    let state = app_state(config, ScriptedSynthesizer::succeeding());
    let admin = RecordingIdentityAdmin::wrapping(state.db.clone());
    (state.with_identity_admin(admin.clone()), admin)
}

pub fn app_state(config: ServerConfig, synthesizer: Arc<ScriptedSynthesizer>) -> AppState {
    let db = Database::new(&config.db_path).unwrap();
    AppState::with_synthesizer(config, db, synthesizer)
}

pub fn app_data(state: AppState) -> web::Data<AppState> {
    web::Data::new(state)
}

pub fn mint_token_issued_at(uid: &str, premium: Option<bool>, iat: i64) -> String {
    let claims = CredentialClaims {
        sub: uid.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        iat: Some(iat),
        premium,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET),
    )
    .unwrap()
}

pub fn mint_token(uid: &str, premium: Option<bool>) -> String {
    mint_token_issued_at(uid, premium, chrono::Utc::now().timestamp())
}

pub fn bearer(uid: &str, premium: Option<bool>) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", mint_token(uid, premium)))
}
