use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use voicegate::voice::resolve_voice;
use voicegate::{Gender, SynthesisError, SynthesizedAudio, AUDIO_ENCODING, DEFAULT_LANGUAGE};

use crate::auth::authenticate;
use crate::db::Database;
use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Takes precedence over `languageCode`.
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeResponse {
    pub audio_content: String,
    pub encoding: String,
    pub language_code: String,
    pub gender: Gender,
}

/// POST /tts/generate - Reserve quota, then synthesize speech
pub async fn generate(
    req: HttpRequest,
    body: web::Json<SynthesizeRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();

    let text = body.text.unwrap_or_default();
    if text.is_empty() {
        return Err(ApiError::InvalidArgument("Missing text".to_string()));
    }
    let gender = Gender::from_request(body.gender.as_deref());
    let language = body
        .lang
        .or(body.language_code)
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    let caller = authenticate(&req, &state.verifier, &state.db)?;
    let cost = state.estimator.estimate(&text);

    let reservation = state
        .db
        .reserve_tokens(
            &caller.uid,
            cost,
            state.config.free_plan_max_tokens,
            caller.premium_claim,
        )
        .inspect_err(|e| {
            if let ApiError::ResourceExhausted(msg) = e {
                metrics::SYNTH_REQUESTS
                    .with_label_values(&["exhausted"])
                    .inc();
                tracing::info!(uid = %caller.uid, cost, "{}", msg);
            }
        })?;
    metrics::TOKENS_RESERVED.inc_by(reservation.charge);

    let start = std::time::Instant::now();
    match synthesize_audio(&state, &text, &language, gender).await {
        Ok(audio) => {
            metrics::SYNTH_REQUESTS.with_label_values(&["success"]).inc();
            metrics::SYNTH_LATENCY
                .with_label_values(&["success"])
                .observe(start.elapsed().as_secs_f64());

            Ok(HttpResponse::Ok().json(SynthesizeResponse {
                audio_content: audio.into_base64(),
                encoding: AUDIO_ENCODING.to_string(),
                language_code: language,
                gender,
            }))
        }
        Err(err) => {
            metrics::SYNTH_REQUESTS.with_label_values(&["error"]).inc();
            metrics::SYNTH_LATENCY
                .with_label_values(&["error"])
                .observe(start.elapsed().as_secs_f64());

            if !reservation.is_premium {
                compensate_reservation(&state.db, &caller.uid, reservation.charge);
            }
            tracing::error!(uid = %caller.uid, error = %err, "TTS call failed");
            Err(ApiError::Synthesis(err.to_string()))
        }
    }
}

async fn synthesize_audio(
    state: &AppState,
    text: &str,
    language: &str,
    gender: Gender,
) -> Result<SynthesizedAudio, SynthesisError> {
    let voice = resolve_voice(language, gender)?;
    state.synthesizer.synthesize(text, &voice).await
}

/// Best-effort refund of a reservation after the provider failed.
///
/// Runs as its own statement, outside the reservation transaction. A crash
/// or store error here leaves the tokens reserved; the error is logged and
/// never reaches the caller.
pub fn compensate_reservation(db: &Database, uid: &str, tokens: u64) {
    match db.refund_tokens(uid, tokens) {
        Ok(()) => {
            metrics::REFUNDS.with_label_values(&["ok"]).inc();
            tracing::info!(uid = %uid, tokens, "refunded reserved tokens");
        }
        Err(e) => {
            metrics::REFUNDS.with_label_values(&["failed"]).inc();
            tracing::warn!(uid = %uid, tokens, error = %e, "token refund failed");
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/tts/generate", web::post().to(generate));
}
