use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use voicegate::hmac::verify_hmac;
use voicegate::{
    BillingEvent, EventDisposition, EventParseError, IdentityAdmin, Plan, PlanSource,
    FALLBACK_SIGNATURE_HEADER, SIGNATURE_HEADER,
};

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

pub const WEBHOOK_PATH: &str = "/webhooks/revenuecat";

const INVALID_PAYLOAD_MESSAGE: &str = "missing or malformed event fields";

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook signature mismatch")]
    InvalidSignature,

    #[error(transparent)]
    InvalidPayload(#[from] EventParseError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ApiError> for WebhookError {
    fn from(e: ApiError) -> Self {
        WebhookError::Internal(e.to_string())
    }
}

impl ResponseError for WebhookError {
    fn error_response(&self) -> HttpResponse {
        match self {
            WebhookError::InvalidSignature => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "invalid_signature"
            })),
            // Parser detail stays in the handler's warn log.
            WebhookError::InvalidPayload(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_payload",
                "message": INVALID_PAYLOAD_MESSAGE
            })),
            WebhookError::Internal(msg) => {
                tracing::error!("Webhook internal error: {}", msg);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error"
                }))
            }
        }
    }
}

/// POST /webhooks/revenuecat - Apply a billing event to the subject's plan
pub async fn revenuecat(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, WebhookError> {
    verify_signature(&req, &body, state.config.webhook_secret.as_deref()).inspect_err(|_| {
        metrics::WEBHOOK_EVENTS
            .with_label_values(&["bad_signature"])
            .inc();
    })?;

    let event = BillingEvent::from_slice(&body).inspect_err(|e| {
        metrics::WEBHOOK_EVENTS.with_label_values(&["invalid"]).inc();
        tracing::warn!(error = %e, "rejected billing webhook payload");
    })?;

    let plan = match event.disposition() {
        EventDisposition::SetPlan(plan) => plan,
        EventDisposition::Ignored => {
            metrics::WEBHOOK_EVENTS.with_label_values(&["ignored"]).inc();
            tracing::info!(
                uid = %event.app_user_id,
                event_type = %event.event_type,
                "ignoring billing event"
            );
            return Ok(HttpResponse::Ok().json(serde_json::json!({
                "ok": true,
                "ignored": true,
            })));
        }
    };

    state
        .db
        .set_plan(&event.app_user_id, plan, PlanSource::Webhook)?;
    metrics::WEBHOOK_EVENTS.with_label_values(&["applied"]).inc();
    metrics::PLAN_SYNCS
        .with_label_values(&[PlanSource::Webhook.as_str(), plan.as_str()])
        .inc();
    tracing::info!(
        uid = %event.app_user_id,
        event_type = %event.event_type,
        event_id = event.id.as_deref().unwrap_or("-"),
        plan = %plan,
        "plan updated from billing event"
    );

    propagate_claim(state.identity_admin.as_ref(), &event.app_user_id, plan).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "plan": plan,
    })))
}

/// Check the signature header against the raw body.
///
/// Verification only runs when both a secret is configured and the request
/// carries a signature header; otherwise the request is accepted unverified.
pub fn verify_signature(
    req: &HttpRequest,
    body: &[u8],
    secret: Option<&[u8]>,
) -> Result<(), WebhookError> {
    match (secret, signature_header(req)) {
        (Some(secret), Some(signature)) => {
            if verify_hmac(secret, body, signature) {
                Ok(())
            } else {
                metrics::SIGNATURE_FAILURES.inc();
                tracing::warn!("webhook signature verification failed");
                Err(WebhookError::InvalidSignature)
            }
        }
        (secret, header) => {
            tracing::debug!(
                secret_configured = secret.is_some(),
                header_present = header.is_some(),
                "webhook signature verification skipped"
            );
            Ok(())
        }
    }
}

fn signature_header(req: &HttpRequest) -> Option<&str> {
    [SIGNATURE_HEADER, FALLBACK_SIGNATURE_HEADER]
        .iter()
        .find_map(|name| req.headers().get(*name).and_then(|v| v.to_str().ok()))
}

/// Push the new plan into the caller's credential: set the `premium` claim,
/// then revoke issued tokens so clients refresh and pick it up. Failures are
/// logged only; the plan write has already succeeded.
async fn propagate_claim(admin: &dyn IdentityAdmin, uid: &str, plan: Plan) {
    if let Err(e) = admin.set_premium_claim(uid, plan.is_premium()).await {
        tracing::warn!(uid = %uid, error = %e, "failed to set premium claim");
        return;
    }
    if let Err(e) = admin.revoke_tokens(uid).await {
        tracing::warn!(uid = %uid, error = %e, "failed to revoke tokens after claim update");
    }
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header(("Allow", "POST"))
        .json(serde_json::json!({
            "error": "method_not_allowed"
        }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(WEBHOOK_PATH)
            .route(web::post().to(revenuecat))
            .default_service(web::to(method_not_allowed)),
    );
}
